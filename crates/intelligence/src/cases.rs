//! 데이터 기반 시나리오 케이스
//!
//! 설정의 `[[data.reports]]`, `[[data.schedules]]` 테이블을 케이스로
//! 바꿉니다. 비어 있으면 내장 케이스를 사용합니다.

use crudcheck_core::config::DataConfig;
use crudcheck_core::data::StaticProvider;

use crate::error::IntelligenceError;
use crate::report::CustomReport;
use crate::schedule::{Schedule, Timer};

/// 리포트 케이스 ID 필드
pub const REPORT_ID_FIELD: &str = "menu_name";
/// 스케줄 케이스 ID 필드
pub const SCHEDULE_ID_FIELD: &str = "name";

/// 리포트 케이스
pub fn report_cases(data: &DataConfig) -> Result<StaticProvider<CustomReport>, IntelligenceError> {
    if data.reports.is_empty() {
        return builtin_reports();
    }
    Ok(StaticProvider::from_values(
        "reports",
        &data.reports,
        REPORT_ID_FIELD,
    )?)
}

/// 스케줄 케이스
pub fn schedule_cases(data: &DataConfig) -> Result<StaticProvider<Schedule>, IntelligenceError> {
    if data.schedules.is_empty() {
        return builtin_schedules();
    }
    Ok(StaticProvider::from_values(
        "schedules",
        &data.schedules,
        SCHEDULE_ID_FIELD,
    )?)
}

fn builtin_reports() -> Result<StaticProvider<CustomReport>, IntelligenceError> {
    let vms = CustomReport::new(
        "crud vm report",
        "VMs by power state",
        "Virtual Machines",
        ["Name", "Power State", "Provider : Name"],
    );
    let hosts = CustomReport::new("crud host report", "Hosts by vendor", "Hosts", ["Name", "Vendor"])
        .with_filter("Host : Vendor = VMware");

    Ok(StaticProvider::new("reports")
        .with_case(vms.menu_name.clone(), vms)?
        .with_case(hosts.menu_name.clone(), hosts)?)
}

fn builtin_schedules() -> Result<StaticProvider<Schedule>, IntelligenceError> {
    let nightly = Schedule::new(
        "crud nightly vendor",
        "Nightly vendor and guest OS report",
        ["Configuration Management", "Virtual Machines", "Vendor and Guest OS"],
    )
    .with_timer(Timer::new("Daily"))
    .with_emails(["ops@example.com"], false);

    let hourly = Schedule::new(
        "crud hourly power",
        "Hourly VM power changes",
        ["Events", "Operations", "Operations VMs Powered On/Off for Last Week"],
    )
    .with_timer(Timer::hourly());

    Ok(StaticProvider::new("schedules")
        .with_case(nightly.name.clone(), nightly)?
        .with_case(hourly.name.clone(), hourly)?)
}

#[cfg(test)]
mod tests {
    use crudcheck_core::data::TestDataProvider;

    use super::*;

    #[test]
    fn empty_config_uses_builtin_cases() {
        let data = DataConfig::default();
        let reports = report_cases(&data).unwrap();
        assert_eq!(reports.len(), 2);
        let schedules = schedule_cases(&data).unwrap();
        let ids: Vec<String> = schedules.cases().unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["crud nightly vendor", "crud hourly power"]);
    }

    #[test]
    fn config_tables_replace_builtin_cases() {
        let data = DataConfig {
            reports: vec![serde_json::json!({
                "menu_name": "from config",
                "title": "t",
                "base_report_on": "Hosts",
                "report_fields": ["Name"],
            })],
            schedules: Vec::new(),
        };
        let cases = report_cases(&data).unwrap().cases().unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].id, "from config");
        assert_eq!(cases[0].data.base_report_on, "Hosts");
    }

    #[test]
    fn malformed_case_is_reported() {
        let data = DataConfig {
            reports: Vec::new(),
            schedules: vec![serde_json::json!({"name": "broken", "filter": "not a list"})],
        };
        assert!(matches!(
            schedule_cases(&data),
            Err(IntelligenceError::Data(_))
        ));
    }
}

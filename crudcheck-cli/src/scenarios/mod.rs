//! 시나리오 레지스트리와 실행기
//!
//! 시나리오 ID는 `<check>[<param>]` 형식입니다. 프로바이더와 데이터
//! 케이스마다 하나씩 펼쳐집니다 (예: `keypair_crud[ec2-east]`,
//! `custom_report_crud[crud vm report]`).

mod intelligence;
mod keypair;

use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crudcheck_cloud::CloudProvider;
use crudcheck_core::config::CrudcheckConfig;
use crudcheck_core::data::TestDataProvider;
use crudcheck_core::error::{AssertionError, CrudcheckError};
use crudcheck_core::manager::EntityManager;
use crudcheck_core::remote::ApplianceClient;
use crudcheck_core::types::ProviderKind;
use crudcheck_intelligence::cases::{report_cases, schedule_cases};
use crudcheck_intelligence::{CustomReport, Schedule};

use crate::cli::ScenarioFilter;
use crate::error::CliError;

/// 시나리오 하나
#[derive(Debug, Clone)]
pub struct Scenario {
    id: String,
    area: &'static str,
    check: Check,
}

#[derive(Debug, Clone)]
enum Check {
    KeyPairCrud(CloudProvider),
    KeyPairCrudWithKey(CloudProvider),
    KeyPairCreateCancel(CloudProvider),
    KeyPairEmptyName(CloudProvider),
    KeyPairNameValidation(CloudProvider),
    KeyPairInvalidKey(CloudProvider),
    KeyPairTags(CloudProvider),
    DownloadPrivateKey(CloudProvider),
    CustomReportCrud(Box<CustomReport>),
    ScheduleCrud(Box<Schedule>),
    MenuWidgetCrud,
    ReportWidgetCrud,
    ChartWidgetCrud,
    RssFeedWidgetCrud,
    DashboardCrud,
}

impl Check {
    fn provider(&self) -> Option<&CloudProvider> {
        match self {
            Self::KeyPairCrud(p)
            | Self::KeyPairCrudWithKey(p)
            | Self::KeyPairCreateCancel(p)
            | Self::KeyPairEmptyName(p)
            | Self::KeyPairNameValidation(p)
            | Self::KeyPairInvalidKey(p)
            | Self::KeyPairTags(p)
            | Self::DownloadPrivateKey(p) => Some(p),
            _ => None,
        }
    }
}

impl Scenario {
    fn new(name: &str, param: Option<&str>, area: &'static str, check: Check) -> Self {
        let id = match param {
            Some(param) => format!("{name}[{param}]"),
            None => name.to_owned(),
        };
        Self { id, area, check }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// 시나리오 영역 (`cloud`, `intelligence`)
    pub fn area(&self) -> &'static str {
        self.area
    }

    /// 대상 프로바이더 이름 (키 페어 시나리오만)
    pub fn provider(&self) -> Option<&str> {
        self.check.provider().map(|p| p.name.as_str())
    }

    /// 시나리오를 실행합니다. 엔티티는 성공, 실패와 무관하게 정리합니다.
    pub async fn run<C: ApplianceClient>(
        &self,
        manager: &EntityManager<C>,
    ) -> Result<(), CrudcheckError> {
        match &self.check {
            Check::KeyPairCrud(p) => keypair::crud(manager, p, None).await,
            Check::KeyPairCrudWithKey(p) => {
                let key = keypair::sample_rsa_key();
                keypair::crud(manager, p, Some(&key)).await
            }
            Check::KeyPairCreateCancel(p) => keypair::create_cancel(manager, p).await,
            Check::KeyPairEmptyName(p) => keypair::empty_name(manager, p).await,
            Check::KeyPairNameValidation(p) => keypair::name_validation(manager, p).await,
            Check::KeyPairInvalidKey(p) => keypair::invalid_key(manager, p).await,
            Check::KeyPairTags(p) => keypair::add_remove_tag(manager, p).await,
            Check::DownloadPrivateKey(p) => keypair::download_private_key(manager, p).await,
            Check::CustomReportCrud(report) => {
                intelligence::custom_report_crud(manager, report.as_ref().clone()).await
            }
            Check::ScheduleCrud(schedule) => {
                intelligence::schedule_crud(manager, schedule.as_ref().clone()).await
            }
            Check::MenuWidgetCrud => intelligence::menu_widget_crud(manager).await,
            Check::ReportWidgetCrud => intelligence::report_widget_crud(manager).await,
            Check::ChartWidgetCrud => intelligence::chart_widget_crud(manager).await,
            Check::RssFeedWidgetCrud => intelligence::rss_feed_widget_crud(manager).await,
            Check::DashboardCrud => intelligence::dashboard_crud(manager).await,
        }
    }
}

/// 설정에서 전체 시나리오 목록을 만들고 `selection`으로 거릅니다.
///
/// # Errors
///
/// - `--provider`가 설정에 없는 이름이면 [`CliError::Command`]
/// - `[data]` 케이스가 잘못되었으면 [`CliError::Core`]
pub fn registry(
    config: &CrudcheckConfig,
    selection: &ScenarioFilter,
) -> Result<Vec<Scenario>, CliError> {
    let providers = match selection.provider.as_deref() {
        Some(name) => vec![CloudProvider::lookup(&config.appliance, name)?],
        None => CloudProvider::all(&config.appliance),
    };

    let mut scenarios = Vec::new();
    for p in &providers {
        let param = Some(p.name.as_str());
        scenarios.push(Scenario::new("keypair_crud", param, "cloud", Check::KeyPairCrud(p.clone())));
        scenarios.push(Scenario::new(
            "keypair_crud_with_key",
            param,
            "cloud",
            Check::KeyPairCrudWithKey(p.clone()),
        ));
        scenarios.push(Scenario::new(
            "keypair_create_cancel",
            param,
            "cloud",
            Check::KeyPairCreateCancel(p.clone()),
        ));
        scenarios.push(Scenario::new(
            "keypair_create_empty_name",
            param,
            "cloud",
            Check::KeyPairEmptyName(p.clone()),
        ));
        if p.one_of(&[ProviderKind::OpenStack]) {
            scenarios.push(Scenario::new(
                "keypair_name_validation",
                param,
                "cloud",
                Check::KeyPairNameValidation(p.clone()),
            ));
        }
        scenarios.push(Scenario::new(
            "keypair_invalid_key_validation",
            param,
            "cloud",
            Check::KeyPairInvalidKey(p.clone()),
        ));
        if p.one_of(&[ProviderKind::OpenStack]) {
            scenarios.push(Scenario::new(
                "keypair_add_remove_tag",
                param,
                "cloud",
                Check::KeyPairTags(p.clone()),
            ));
        }
        scenarios.push(Scenario::new(
            "download_private_key",
            param,
            "cloud",
            Check::DownloadPrivateKey(p.clone()),
        ));
    }

    for case in report_cases(&config.data)?.cases()? {
        scenarios.push(Scenario::new(
            "custom_report_crud",
            Some(&case.id),
            "intelligence",
            Check::CustomReportCrud(Box::new(case.data)),
        ));
    }
    for case in schedule_cases(&config.data)?.cases()? {
        scenarios.push(Scenario::new(
            "schedule_crud",
            Some(&case.id),
            "intelligence",
            Check::ScheduleCrud(Box::new(case.data)),
        ));
    }

    for (name, check) in [
        ("menu_widget_crud", Check::MenuWidgetCrud),
        ("report_widget_crud", Check::ReportWidgetCrud),
        ("chart_widget_crud", Check::ChartWidgetCrud),
        ("rss_feed_widget_crud", Check::RssFeedWidgetCrud),
        ("dashboard_crud", Check::DashboardCrud),
    ] {
        scenarios.push(Scenario::new(name, None, "intelligence", check));
    }

    if let Some(fragment) = selection.filter.as_deref() {
        scenarios.retain(|s| s.id.contains(fragment));
    }
    Ok(scenarios)
}

/// 시나리오 실행 결과
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub id: String,
    pub area: &'static str,
    pub passed: bool,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 시나리오들을 순서대로 실행합니다.
///
/// `fail_fast`이면 첫 실패 뒤의 시나리오는 실행하지 않습니다.
pub async fn run_all<C: ApplianceClient>(
    manager: &EntityManager<C>,
    scenarios: &[Scenario],
    fail_fast: bool,
) -> Vec<ScenarioOutcome> {
    let mut outcomes = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        let started = Instant::now();
        let result = scenario.run(manager).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let outcome = match result {
            Ok(()) => {
                info!(scenario = scenario.id(), elapsed_ms, "scenario passed");
                ScenarioOutcome {
                    id: scenario.id.clone(),
                    area: scenario.area,
                    passed: true,
                    elapsed_ms,
                    error: None,
                }
            }
            Err(e) => {
                warn!(scenario = scenario.id(), elapsed_ms, error = %e, "scenario failed");
                ScenarioOutcome {
                    id: scenario.id.clone(),
                    area: scenario.area,
                    passed: false,
                    elapsed_ms,
                    error: Some(e.to_string()),
                }
            }
        };
        let stop = fail_fast && !outcome.passed;
        outcomes.push(outcome);
        if stop {
            break;
        }
    }
    outcomes
}

/// 조건이 거짓이면 검증 실패
pub(crate) fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result<(), AssertionError> {
    if condition {
        Ok(())
    } else {
        Err(AssertionError::Failed(message()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(scenarios: &[Scenario]) -> Vec<&str> {
        scenarios.iter().map(Scenario::id).collect()
    }

    #[test]
    fn default_registry_expands_providers_and_cases() {
        let scenarios = registry(&CrudcheckConfig::default(), &ScenarioFilter::default()).unwrap();
        let ids = ids(&scenarios);

        assert!(ids.contains(&"keypair_crud[ec2-east]"));
        assert!(ids.contains(&"keypair_crud[rhos-01]"));
        assert!(ids.contains(&"keypair_name_validation[rhos-01]"));
        assert!(!ids.contains(&"keypair_name_validation[ec2-east]"));
        assert!(!ids.contains(&"keypair_add_remove_tag[ec2-east]"));
        assert!(ids.contains(&"custom_report_crud[crud vm report]"));
        assert!(ids.contains(&"schedule_crud[crud hourly power]"));
        assert!(ids.contains(&"dashboard_crud"));
    }

    #[test]
    fn ids_are_unique() {
        let scenarios = registry(&CrudcheckConfig::default(), &ScenarioFilter::default()).unwrap();
        let mut ids = ids(&scenarios);
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn filter_keeps_matching_ids() {
        let selection = ScenarioFilter {
            filter: Some("widget".to_owned()),
            provider: None,
        };
        let scenarios = registry(&CrudcheckConfig::default(), &selection).unwrap();
        assert_eq!(scenarios.len(), 4);
        assert!(scenarios.iter().all(|s| s.area() == "intelligence"));
    }

    #[test]
    fn provider_selection_limits_key_pair_scenarios() {
        let selection = ScenarioFilter {
            filter: None,
            provider: Some("ec2-east".to_owned()),
        };
        let scenarios = registry(&CrudcheckConfig::default(), &selection).unwrap();
        assert!(
            scenarios
                .iter()
                .filter_map(Scenario::provider)
                .all(|p| p == "ec2-east")
        );
        assert!(scenarios.iter().any(|s| s.id() == "dashboard_crud"));
    }

    #[test]
    fn unknown_provider_is_an_error() {
        let selection = ScenarioFilter {
            filter: None,
            provider: Some("azure".to_owned()),
        };
        let err = registry(&CrudcheckConfig::default(), &selection).unwrap_err();
        assert!(matches!(err, CliError::Command(_)));
    }

    #[test]
    fn ensure_reports_message_only_on_failure() {
        assert!(ensure(true, || unreachable!()).is_ok());
        let err = ensure(false, || "boom".to_owned()).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}

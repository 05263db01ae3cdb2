//! 커스텀 리포트

use serde::{Deserialize, Serialize};

use crudcheck_core::entity::{Entity, EntityKind, Lifecycle};
use crudcheck_core::session::Patch;

use crate::runs::Runnable;

/// 커스텀 리포트
///
/// 메뉴 이름이 식별자입니다. 기반 데이터(`base_report_on`)는 생성 후 바꿀 수 없습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomReport {
    /// 메뉴에 표시되는 이름
    pub menu_name: String,
    /// 리포트 제목
    pub title: String,
    /// 기반 데이터 (예: `Virtual Machines`)
    pub base_report_on: String,
    /// 열로 표시할 필드
    pub report_fields: Vec<String>,
    /// 레코드 필터 식
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(skip)]
    lifecycle: Lifecycle,
}

impl CustomReport {
    /// 아직 생성되지 않은 리포트
    pub fn new<I, S>(
        menu_name: impl Into<String>,
        title: impl Into<String>,
        base_report_on: impl Into<String>,
        report_fields: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            menu_name: menu_name.into(),
            title: title.into(),
            base_report_on: base_report_on.into(),
            report_fields: report_fields.into_iter().map(Into::into).collect(),
            filter: None,
            lifecycle: Lifecycle::Local,
        }
    }

    /// 필터를 지정합니다.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

impl Entity for CustomReport {
    const KIND: EntityKind = EntityKind::Report;
    const MUTABLE_FIELDS: &'static [&'static str] = &["title", "report_fields", "filter"];

    fn name(&self) -> &str {
        &self.menu_name
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    fn set_lifecycle(&mut self, lifecycle: Lifecycle) {
        self.lifecycle = lifecycle;
    }
}

impl Runnable for CustomReport {}

/// 리포트 변경
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportPatch {
    title: Option<String>,
    report_fields: Option<Vec<String>>,
    filter: Option<Option<String>>,
}

impl ReportPatch {
    /// 아무것도 바꾸지 않는 패치
    pub fn new() -> Self {
        Self::default()
    }

    /// 제목 변경
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// 표시 필드 교체
    pub fn report_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.report_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// 필터 교체 (`None`이면 필터 제거)
    pub fn filter(mut self, filter: Option<String>) -> Self {
        self.filter = Some(filter);
        self
    }
}

impl Patch<CustomReport> for ReportPatch {
    fn apply(self, draft: &mut CustomReport) {
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(fields) = self.report_fields {
            draft.report_fields = fields;
        }
        if let Some(filter) = self.filter {
            draft.filter = filter;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> CustomReport {
        CustomReport::new("crud report", "VMs", "Virtual Machines", ["Name", "Power State"])
    }

    #[test]
    fn menu_name_is_identity() {
        let report = report();
        assert_eq!(report.name(), "crud report");
        let record = report.to_record().unwrap();
        assert_eq!(record.kind, EntityKind::Report);
        assert_eq!(record.fields["filter"], serde_json::Value::Null);
    }

    #[test]
    fn patch_touches_only_given_fields() {
        let mut draft = report();
        ReportPatch::new()
            .title("Renamed")
            .filter(Some("Vm : Power State = on".to_owned()))
            .apply(&mut draft);
        assert_eq!(draft.title, "Renamed");
        assert_eq!(draft.filter.as_deref(), Some("Vm : Power State = on"));
        assert_eq!(draft.report_fields, vec!["Name", "Power State"]);
    }

    #[test]
    fn snapshot_excludes_base_report_on() {
        let snapshot = report().snapshot().unwrap();
        assert!(!snapshot.contains_key("base_report_on"));
        assert!(snapshot.contains_key("title"));
    }

    #[test]
    fn deserializes_without_filter() {
        let report: CustomReport = serde_json::from_value(serde_json::json!({
            "menu_name": "m", "title": "t", "base_report_on": "Hosts",
            "report_fields": ["Name"],
        }))
        .unwrap();
        assert_eq!(report.filter, None);
        assert_eq!(report.lifecycle(), Lifecycle::Local);
    }
}

//! 종류별 필드 검증
//!
//! 어플라이언스가 저장 전에 적용하는 규칙입니다. 실패하면 [`Refusal`]을
//! 돌려주며, 시뮬레이터가 이를 `Unable to <동작> <종류> "<이름>": <사유>`
//! 형식의 거부 메시지로 만듭니다.

use std::collections::HashMap;

use crudcheck_cloud::sshkey::PublicKey;
use crudcheck_core::entity::{EntityKind, FieldSet};
use crudcheck_core::error::{Rejection, RejectionCode};
use crudcheck_core::types::ProviderKind;

/// 외부 RSS 피드로 선택할 수 있는 이름
pub const KNOWN_EXTERNAL_FEEDS: &[&str] = &[
    "SlashDot",
    "Engadget",
    "Hacker News",
    "Red Hat Press Releases",
    "Virtualization.info",
];

/// 스케줄/위젯 타이머 주기
pub const TIMER_RUNS: &[&str] = &["Once", "Hourly", "Daily", "Weekly", "Monthly"];

const ROWS_RANGE: std::ops::RangeInclusive<u64> = 1..=50;
const MAX_REPORT_WIDGET_COLUMNS: usize = 4;

/// 검증 실패 사유
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refusal {
    /// 구조화된 코드
    pub code: RejectionCode,
    /// 사람이 읽는 사유
    pub reason: String,
}

impl Refusal {
    pub fn new(code: RejectionCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// `Unable to <verb> <Kind> "<name>": <reason>` 형식의 거부로 변환합니다.
    pub fn into_rejection(self, verb: &str, kind: EntityKind, name: &str) -> Rejection {
        Rejection::new(self.code, unable(verb, kind, name, &self.reason))
    }
}

/// 거부 메시지를 만듭니다.
pub fn unable(verb: &str, kind: EntityKind, name: &str, reason: &str) -> String {
    format!("Unable to {verb} {kind} \"{name}\": {reason}")
}

/// 리소스 이름을 담는 필드
pub fn identity_field(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::KeyPair | EntityKind::Schedule | EntityKind::Dashboard => "name",
        EntityKind::Report => "menu_name",
        EntityKind::MenuWidget
        | EntityKind::ReportWidget
        | EntityKind::ChartWidget
        | EntityKind::RssFeedWidget => "title",
    }
}

/// 생성 후 바꿀 수 없는 필드인지
pub fn is_fixed_after_create(kind: EntityKind, field: &str) -> bool {
    match kind {
        EntityKind::KeyPair => true,
        EntityKind::Report => field == "menu_name" || field == "base_report_on",
        EntityKind::Dashboard => field == "name" || field == "group",
        _ => field == identity_field(kind),
    }
}

/// 키 페어 생성 요청을 검증합니다. 공개 키가 있으면 파싱 결과를 반환합니다.
pub fn validate_key_pair(
    fields: &FieldSet,
    providers: &HashMap<String, ProviderKind>,
) -> Result<Option<PublicKey>, Refusal> {
    let name = str_field(fields, "name").unwrap_or_default();
    if name.trim().is_empty() {
        return Err(Refusal::new(RejectionCode::InvalidName, "Name can't be blank"));
    }

    let provider_name = str_field(fields, "provider").unwrap_or_default();
    let provider = providers.get(provider_name).copied().ok_or_else(|| {
        Refusal::new(
            RejectionCode::UnknownReference,
            format!("Provider \"{provider_name}\" not found"),
        )
    })?;

    if provider == ProviderKind::OpenStack && !name.chars().all(is_openstack_name_char) {
        return Err(Refusal::new(
            RejectionCode::InvalidName,
            "Keypair data is invalid: Keypair name contains unsafe characters",
        ));
    }

    match str_field(fields, "public_key").filter(|key| !key.trim().is_empty()) {
        None => Ok(None),
        Some(text) => PublicKey::parse(text).map(Some).map_err(|_| {
            let reason = match provider {
                ProviderKind::Ec2 => "Key is not in valid OpenSSH public key format",
                ProviderKind::OpenStack => {
                    "Keypair data is invalid: failed to generate fingerprint"
                }
            };
            Refusal::new(RejectionCode::InvalidKey, reason)
        }),
    }
}

fn is_openstack_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == ' '
}

/// 키 페어 외 종류의 전체 필드를 검증합니다 (생성과 업데이트 공통).
pub fn validate_fields(kind: EntityKind, fields: &FieldSet) -> Result<(), Refusal> {
    require_text(fields, identity_field(kind), "Name")?;

    match kind {
        EntityKind::KeyPair => Ok(()),
        EntityKind::Report => {
            require_text(fields, "title", "Title")?;
            require_text(fields, "base_report_on", "Base the report on")?;
            require_list(fields, "report_fields", "At least one field must be selected")?;
            Ok(())
        }
        EntityKind::Schedule => {
            require_text(fields, "description", "Description")?;
            require_filter_path(fields, "filter")?;
            require_timer(fields)?;
            for email in str_list(fields, "emails") {
                if !email.contains('@') {
                    return Err(Refusal::new(
                        RejectionCode::InvalidField,
                        format!("Email address \"{email}\" is invalid"),
                    ));
                }
            }
            Ok(())
        }
        EntityKind::MenuWidget => {
            validate_widget_common(fields)?;
            let shortcuts = fields
                .get("shortcuts")
                .and_then(serde_json::Value::as_object)
                .filter(|map| !map.is_empty())
                .ok_or_else(|| {
                    Refusal::new(
                        RejectionCode::InvalidField,
                        "At least one menu shortcut must be selected",
                    )
                })?;
            if shortcuts
                .values()
                .any(|alias| alias.as_str().is_none_or(|a| a.trim().is_empty()))
            {
                return Err(Refusal::new(
                    RejectionCode::InvalidField,
                    "Shortcut description can't be blank",
                ));
            }
            Ok(())
        }
        EntityKind::ReportWidget => {
            validate_widget_common(fields)?;
            require_filter_path(fields, "filter")?;
            let columns = str_list(fields, "columns");
            if columns.is_empty() || columns.len() > MAX_REPORT_WIDGET_COLUMNS {
                return Err(Refusal::new(
                    RejectionCode::InvalidField,
                    format!("Between 1 and {MAX_REPORT_WIDGET_COLUMNS} columns must be selected"),
                ));
            }
            require_rows(fields)?;
            require_timer(fields)
        }
        EntityKind::ChartWidget => {
            validate_widget_common(fields)?;
            require_text(fields, "filter", "Filter")?;
            require_timer(fields)
        }
        EntityKind::RssFeedWidget => {
            validate_widget_common(fields)?;
            require_rows(fields)?;
            match str_field(fields, "feed_type") {
                Some("internal") => require_text(fields, "feed", "Feed"),
                Some("external") => {
                    let external = str_field(fields, "external").unwrap_or_default();
                    let is_url =
                        external.starts_with("http://") || external.starts_with("https://");
                    if KNOWN_EXTERNAL_FEEDS.contains(&external) || is_url {
                        Ok(())
                    } else {
                        Err(Refusal::new(
                            RejectionCode::InvalidField,
                            "External feed must be a known feed or an http(s) URL",
                        ))
                    }
                }
                _ => Err(Refusal::new(
                    RejectionCode::InvalidField,
                    "Feed type must be internal or external",
                )),
            }
        }
        EntityKind::Dashboard => {
            require_text(fields, "title", "Tab Title")?;
            require_text(fields, "group", "Group")?;
            require_list(fields, "widgets", "At least one widget must be selected")
        }
    }
}

fn validate_widget_common(fields: &FieldSet) -> Result<(), Refusal> {
    require_text(fields, "description", "Description")?;
    let visibility = fields.get("visibility").ok_or_else(|| {
        Refusal::new(RejectionCode::InvalidField, "Visibility must be selected")
    })?;
    match visibility.get("type").and_then(serde_json::Value::as_str) {
        Some("to_all") => Ok(()),
        Some("by_role") | Some("by_group") => {
            let has_values = visibility
                .get("values")
                .and_then(serde_json::Value::as_array)
                .is_some_and(|values| !values.is_empty());
            if has_values {
                Ok(())
            } else {
                Err(Refusal::new(
                    RejectionCode::InvalidField,
                    "At least one role or group must be selected",
                ))
            }
        }
        _ => Err(Refusal::new(
            RejectionCode::InvalidField,
            "Visibility must be selected",
        )),
    }
}

fn require_text(fields: &FieldSet, field: &str, label: &str) -> Result<(), Refusal> {
    match str_field(fields, field) {
        Some(value) if !value.trim().is_empty() => Ok(()),
        _ => Err(Refusal::new(
            if field == "name" || field == "menu_name" || field == "title" {
                RejectionCode::InvalidName
            } else {
                RejectionCode::InvalidField
            },
            format!("{label} can't be blank"),
        )),
    }
}

fn require_list(fields: &FieldSet, field: &str, reason: &str) -> Result<(), Refusal> {
    if str_list(fields, field).is_empty() {
        Err(Refusal::new(RejectionCode::InvalidField, reason))
    } else {
        Ok(())
    }
}

fn require_filter_path(fields: &FieldSet, field: &str) -> Result<(), Refusal> {
    let path = str_list(fields, field);
    if path.len() == 3 && path.iter().all(|level| !level.trim().is_empty()) {
        Ok(())
    } else {
        Err(Refusal::new(
            RejectionCode::InvalidField,
            "Filter must select a category, a subcategory, and a report",
        ))
    }
}

fn require_rows(fields: &FieldSet) -> Result<(), Refusal> {
    let rows = fields.get("rows").and_then(serde_json::Value::as_u64);
    match rows {
        Some(rows) if ROWS_RANGE.contains(&rows) => Ok(()),
        _ => Err(Refusal::new(
            RejectionCode::InvalidField,
            format!(
                "Row count must be between {} and {}",
                ROWS_RANGE.start(),
                ROWS_RANGE.end()
            ),
        )),
    }
}

fn require_timer(fields: &FieldSet) -> Result<(), Refusal> {
    let run = fields
        .get("timer")
        .and_then(|timer| timer.get("run"))
        .and_then(serde_json::Value::as_str);
    match run {
        Some(run) if TIMER_RUNS.contains(&run) => Ok(()),
        other => Err(Refusal::new(
            RejectionCode::InvalidField,
            format!("Timer \"{}\" is not a valid schedule", other.unwrap_or("")),
        )),
    }
}

pub(crate) fn str_field<'a>(fields: &'a FieldSet, field: &str) -> Option<&'a str> {
    fields.get(field).and_then(serde_json::Value::as_str)
}

pub(crate) fn str_list<'a>(fields: &'a FieldSet, field: &str) -> Vec<&'a str> {
    fields
        .get(field)
        .and_then(serde_json::Value::as_array)
        .map(|items| items.iter().filter_map(serde_json::Value::as_str).collect())
        .unwrap_or_default()
}

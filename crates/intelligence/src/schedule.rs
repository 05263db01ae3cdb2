//! 리포트 스케줄

use serde::{Deserialize, Serialize};

use crudcheck_core::entity::{Entity, EntityKind, Lifecycle};
use crudcheck_core::session::Patch;

use crate::runs::Runnable;

/// 실행 주기
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    /// `Once`, `Hourly`, `Daily`, `Weekly`, `Monthly`
    pub run: String,
    /// 주기 간격 (예: `Hour`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
}

impl Timer {
    /// 간격 없는 주기
    pub fn new(run: impl Into<String>) -> Self {
        Self {
            run: run.into(),
            hours: None,
        }
    }

    /// 매시간 실행
    pub fn hourly() -> Self {
        Self {
            run: "Hourly".to_owned(),
            hours: Some("Hour".to_owned()),
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new("Once")
    }
}

/// 리포트 스케줄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// 스케줄 이름 (식별자)
    pub name: String,
    /// 설명
    pub description: String,
    /// 카테고리, 하위 카테고리, 리포트의 세 단계 경로
    pub filter: Vec<String>,
    /// 비활성이면 예약 실행을 건너뜀
    #[serde(default = "default_active")]
    pub active: bool,
    /// 실행 주기
    #[serde(default)]
    pub timer: Timer,
    /// 결과를 받을 주소
    #[serde(default)]
    pub emails: Vec<String>,
    /// 실행 후 메일 발송 여부
    #[serde(default)]
    pub email_after_run: bool,
    #[serde(skip)]
    lifecycle: Lifecycle,
}

fn default_active() -> bool {
    true
}

impl Schedule {
    /// 아직 생성되지 않은 스케줄 (활성, 1회 실행, 메일 없음)
    pub fn new<I, S>(name: impl Into<String>, description: impl Into<String>, filter: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            description: description.into(),
            filter: filter.into_iter().map(Into::into).collect(),
            active: true,
            timer: Timer::default(),
            emails: Vec::new(),
            email_after_run: false,
            lifecycle: Lifecycle::Local,
        }
    }

    /// 실행 주기를 바꿉니다.
    pub fn with_timer(mut self, timer: Timer) -> Self {
        self.timer = timer;
        self
    }

    /// 메일 수신자와 발송 여부를 바꿉니다.
    pub fn with_emails<I, S>(mut self, emails: I, after_run: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.emails = emails.into_iter().map(Into::into).collect();
        self.email_after_run = after_run;
        self
    }
}

impl Entity for Schedule {
    const KIND: EntityKind = EntityKind::Schedule;
    const MUTABLE_FIELDS: &'static [&'static str] = &[
        "description",
        "filter",
        "active",
        "timer",
        "emails",
        "email_after_run",
    ];

    fn name(&self) -> &str {
        &self.name
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    fn set_lifecycle(&mut self, lifecycle: Lifecycle) {
        self.lifecycle = lifecycle;
    }
}

impl Runnable for Schedule {}

/// 스케줄 변경
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchedulePatch {
    description: Option<String>,
    filter: Option<Vec<String>>,
    active: Option<bool>,
    timer: Option<Timer>,
    emails: Option<(Vec<String>, bool)>,
}

impl SchedulePatch {
    /// 아무것도 바꾸지 않는 패치
    pub fn new() -> Self {
        Self::default()
    }

    /// 설명 변경
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// 필터 경로 변경
    pub fn filter<I, S>(mut self, filter: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter = Some(filter.into_iter().map(Into::into).collect());
        self
    }

    /// 활성 여부 변경
    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// 실행 주기 변경
    pub fn timer(mut self, timer: Timer) -> Self {
        self.timer = Some(timer);
        self
    }

    /// 수신자와 실행 후 발송 여부를 함께 교체합니다.
    pub fn emails<I, S>(mut self, emails: I, after_run: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.emails = Some((emails.into_iter().map(Into::into).collect(), after_run));
        self
    }
}

impl Patch<Schedule> for SchedulePatch {
    fn apply(self, draft: &mut Schedule) {
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(filter) = self.filter {
            draft.filter = filter;
        }
        if let Some(active) = self.active {
            draft.active = active;
        }
        if let Some(timer) = self.timer {
            draft.timer = timer;
        }
        if let Some((emails, after_run)) = self.emails {
            draft.emails = emails;
            draft.email_after_run = after_run;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILTER: [&str; 3] = [
        "Configuration Management",
        "Virtual Machines",
        "Vendor and Guest OS",
    ];

    #[test]
    fn timer_omits_missing_hours() {
        let json = serde_json::to_value(Timer::new("Daily")).unwrap();
        assert_eq!(json, serde_json::json!({"run": "Daily"}));
        let json = serde_json::to_value(Timer::hourly()).unwrap();
        assert_eq!(json["hours"], "Hour");
    }

    #[test]
    fn loose_values_fill_defaults() {
        let schedule: Schedule = serde_json::from_value(serde_json::json!({
            "name": "s", "description": "d", "filter": FILTER,
        }))
        .unwrap();
        assert!(schedule.active);
        assert_eq!(schedule.timer.run, "Once");
        assert!(schedule.emails.is_empty());
    }

    #[test]
    fn patch_sets_emails_together() {
        let mut draft = Schedule::new("s", "d", FILTER);
        SchedulePatch::new()
            .description("badger badger badger")
            .emails(["ops@example.com"], true)
            .apply(&mut draft);
        assert_eq!(draft.description, "badger badger badger");
        assert_eq!(draft.emails, vec!["ops@example.com"]);
        assert!(draft.email_after_run);
        assert!(draft.active);
    }

    #[test]
    fn name_is_not_mutable() {
        assert!(!Schedule::MUTABLE_FIELDS.contains(&"name"));
    }
}

//! 대시보드

use serde::{Deserialize, Serialize};

use crudcheck_core::entity::{Entity, EntityKind, Lifecycle};
use crudcheck_core::session::Patch;

/// 그룹별 대시보드 탭
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    /// 대시보드 이름 (식별자)
    pub name: String,
    /// 소유 그룹 (예: `EvmGroup-administrator`)
    pub group: String,
    /// 탭 제목
    pub title: String,
    /// 잠기면 사용자가 위젯을 옮기거나 지울 수 없음
    pub locked: bool,
    /// 위젯 제목 목록
    pub widgets: Vec<String>,
    #[serde(skip)]
    lifecycle: Lifecycle,
}

impl Dashboard {
    /// 아직 생성되지 않은 대시보드
    pub fn new<I, S>(
        name: impl Into<String>,
        group: impl Into<String>,
        title: impl Into<String>,
        locked: bool,
        widgets: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            group: group.into(),
            title: title.into(),
            locked,
            widgets: widgets.into_iter().map(Into::into).collect(),
            lifecycle: Lifecycle::Local,
        }
    }
}

impl Entity for Dashboard {
    const KIND: EntityKind = EntityKind::Dashboard;
    const MUTABLE_FIELDS: &'static [&'static str] = &["title", "locked", "widgets"];

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

/// 대시보드 변경
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardPatch {
    title: Option<String>,
    locked: Option<bool>,
    widgets: Option<Vec<String>>,
}

impl DashboardPatch {
    /// 아무것도 바꾸지 않는 패치
    pub fn new() -> Self {
        Self::default()
    }

    /// 탭 제목 변경
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// 잠금 여부 변경
    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = Some(locked);
        self
    }

    /// 위젯 목록 전체를 교체합니다.
    pub fn widgets<I, S>(mut self, widgets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.widgets = Some(widgets.into_iter().map(Into::into).collect());
        self
    }
}

impl Patch<Dashboard> for DashboardPatch {
    fn apply(self, draft: &mut Dashboard) {
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(locked) = self.locked {
            draft.locked = locked;
        }
        if let Some(widgets) = self.widgets {
            draft.widgets = widgets;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replacing_widgets_drops_previous_list() {
        let mut draft = Dashboard::new(
            "d",
            "EvmGroup-administrator",
            "t",
            false,
            ["Top CPU Consumers (weekly)", "Vendor and Guest OS Chart"],
        );
        DashboardPatch::new()
            .widgets(["Top Storage Consumers"])
            .apply(&mut draft);
        assert_eq!(draft.widgets, vec!["Top Storage Consumers"]);
        assert!(!draft.locked);
    }

    #[test]
    fn group_is_fixed() {
        assert!(!Dashboard::MUTABLE_FIELDS.contains(&"group"));
        assert!(Dashboard::MUTABLE_FIELDS.contains(&"locked"));
    }
}

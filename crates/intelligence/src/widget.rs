//! 대시보드 위젯
//!
//! 네 종류의 위젯은 제목, 설명, 활성 여부, 공개 범위를 공유합니다. 제목이
//! 식별자이며 생성 후 바꿀 수 없습니다. 공통 필드 변경은 [`WidgetPatch`]
//! 하나로 모든 종류에 적용됩니다.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crudcheck_core::entity::{Entity, EntityKind, Lifecycle};
use crudcheck_core::session::Patch;

use crate::schedule::Timer;

/// 위젯 공개 범위
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum Visibility {
    /// 모든 사용자
    ToAll,
    /// 지정한 역할
    ByRole(Vec<String>),
    /// 지정한 그룹
    ByGroup(Vec<String>),
}

impl Visibility {
    /// 역할 하나에만 공개
    pub fn by_role(role: impl Into<String>) -> Self {
        Self::ByRole(vec![role.into()])
    }
}

/// RSS 피드 출처
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedType {
    /// 어플라이언스 내부 피드
    Internal,
    /// 외부 피드 (알려진 이름 또는 URL)
    External,
}

/// 모든 위젯 종류의 공통 접근자
pub trait Widget: Entity {
    /// 제목 (식별자)
    fn title(&self) -> &str;
    /// 대시보드에 표시되는지
    fn active(&self) -> bool;
    /// 설명 (변경용)
    fn description_mut(&mut self) -> &mut String;
    /// 활성 여부 (변경용)
    fn active_mut(&mut self) -> &mut bool;
    /// 공개 범위 (변경용)
    fn visibility_mut(&mut self) -> &mut Visibility;
}

macro_rules! widget_entity {
    ($ty:ty, $kind:expr, [$($field:literal),*]) => {
        impl Entity for $ty {
            const KIND: EntityKind = $kind;
            const MUTABLE_FIELDS: &'static [&'static str] =
                &["description", "active", "visibility", $($field),*];

            fn name(&self) -> &str {
                &self.title
            }

            fn lifecycle(&self) -> Lifecycle {
                self.lifecycle
            }

            fn set_lifecycle(&mut self, lifecycle: Lifecycle) {
                self.lifecycle = lifecycle;
            }
        }

        impl Widget for $ty {
            fn title(&self) -> &str {
                &self.title
            }

            fn active(&self) -> bool {
                self.active
            }

            fn description_mut(&mut self) -> &mut String {
                &mut self.description
            }

            fn active_mut(&mut self) -> &mut bool {
                &mut self.active
            }

            fn visibility_mut(&mut self) -> &mut Visibility {
                &mut self.visibility
            }
        }
    };
}

/// 메뉴 바로가기 위젯
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuWidget {
    /// 제목 (식별자)
    pub title: String,
    /// 설명
    pub description: String,
    /// 대시보드에 표시되는지
    pub active: bool,
    /// 공개 범위
    pub visibility: Visibility,
    /// 메뉴 경로 → 표시 이름
    pub shortcuts: BTreeMap<String, String>,
    #[serde(skip)]
    lifecycle: Lifecycle,
}

impl MenuWidget {
    /// 아직 생성되지 않은 메뉴 위젯 (활성)
    pub fn new<I, K, V>(
        title: impl Into<String>,
        description: impl Into<String>,
        shortcuts: I,
        visibility: Visibility,
    ) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            title: title.into(),
            description: description.into(),
            active: true,
            visibility,
            shortcuts: shortcuts
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            lifecycle: Lifecycle::Local,
        }
    }
}

widget_entity!(MenuWidget, EntityKind::MenuWidget, ["shortcuts"]);

/// 리포트 표 위젯
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportWidget {
    /// 제목 (식별자)
    pub title: String,
    /// 설명
    pub description: String,
    /// 대시보드에 표시되는지
    pub active: bool,
    /// 공개 범위
    pub visibility: Visibility,
    /// 카테고리, 하위 카테고리, 리포트의 세 단계 경로
    pub filter: Vec<String>,
    /// 최대 4개
    pub columns: Vec<String>,
    /// 표시할 행 수
    pub rows: u32,
    /// 갱신 주기
    pub timer: Timer,
    #[serde(skip)]
    lifecycle: Lifecycle,
}

impl ReportWidget {
    /// 아직 생성되지 않은 리포트 위젯 (활성, 매시간 갱신)
    pub fn new<F, C>(
        title: impl Into<String>,
        description: impl Into<String>,
        filter: F,
        columns: C,
        rows: u32,
        visibility: Visibility,
    ) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            title: title.into(),
            description: description.into(),
            active: true,
            visibility,
            filter: filter.into_iter().map(Into::into).collect(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows,
            timer: Timer::hourly(),
            lifecycle: Lifecycle::Local,
        }
    }
}

widget_entity!(ReportWidget, EntityKind::ReportWidget, ["filter", "columns", "rows", "timer"]);

/// 차트 위젯
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartWidget {
    /// 제목 (식별자)
    pub title: String,
    /// 설명
    pub description: String,
    /// 대시보드에 표시되는지
    pub active: bool,
    /// 공개 범위
    pub visibility: Visibility,
    /// `카테고리/하위 카테고리/리포트` 경로
    pub filter: String,
    /// 갱신 주기
    pub timer: Timer,
    #[serde(skip)]
    lifecycle: Lifecycle,
}

impl ChartWidget {
    /// 아직 생성되지 않은 차트 위젯 (활성, 매시간 갱신)
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        filter: impl Into<String>,
        visibility: Visibility,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            active: true,
            visibility,
            filter: filter.into(),
            timer: Timer::hourly(),
            lifecycle: Lifecycle::Local,
        }
    }
}

widget_entity!(ChartWidget, EntityKind::ChartWidget, ["filter", "timer"]);

/// RSS 피드 위젯
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RssFeedWidget {
    /// 제목 (식별자)
    pub title: String,
    /// 설명
    pub description: String,
    /// 대시보드에 표시되는지
    pub active: bool,
    /// 공개 범위
    pub visibility: Visibility,
    /// 내부 또는 외부 피드
    pub feed_type: FeedType,
    /// 내부 피드 이름
    #[serde(default)]
    pub feed: Option<String>,
    /// 외부 피드 이름 또는 URL
    #[serde(default)]
    pub external: Option<String>,
    /// 표시할 항목 수
    pub rows: u32,
    #[serde(skip)]
    lifecycle: Lifecycle,
}

impl RssFeedWidget {
    /// 내부 피드 위젯
    pub fn internal(
        title: impl Into<String>,
        description: impl Into<String>,
        feed: impl Into<String>,
        rows: u32,
        visibility: Visibility,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            active: true,
            visibility,
            feed_type: FeedType::Internal,
            feed: Some(feed.into()),
            external: None,
            rows,
            lifecycle: Lifecycle::Local,
        }
    }

    /// 외부 피드로 전환합니다. 내부 피드 선택은 그대로 둡니다.
    pub fn use_external(&mut self, external: impl Into<String>) {
        self.feed_type = FeedType::External;
        self.external = Some(external.into());
    }
}

widget_entity!(
    RssFeedWidget,
    EntityKind::RssFeedWidget,
    ["feed_type", "feed", "external", "rows"]
);

/// 위젯 공통 필드 변경
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetPatch {
    description: Option<String>,
    active: Option<bool>,
    visibility: Option<Visibility>,
}

impl WidgetPatch {
    /// 아무것도 바꾸지 않는 패치
    pub fn new() -> Self {
        Self::default()
    }

    /// 설명 변경
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// 활성 여부 변경
    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// 공개 범위 변경
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }
}

impl<W: Widget> Patch<W> for WidgetPatch {
    fn apply(self, draft: &mut W) {
        if let Some(description) = self.description {
            *draft.description_mut() = description;
        }
        if let Some(active) = self.active {
            *draft.active_mut() = active;
        }
        if let Some(visibility) = self.visibility {
            *draft.visibility_mut() = visibility;
        }
    }
}

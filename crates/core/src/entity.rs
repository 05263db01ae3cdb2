//! 엔티티 모델: 원격 리소스를 가리키는 로컬 핸들
//!
//! [`Entity`]는 키 페어, 리포트, 스케줄, 위젯, 대시보드처럼 원격 시스템에
//! 존재하는 리소스의 로컬 표현입니다. 필드 맵은 serde 직렬화로 얻으므로
//! 각 타입은 변경 가능한 필드 목록([`Entity::MUTABLE_FIELDS`])만 선언하면 됩니다.
//!
//! # 생명주기
//! ```text
//! Local ──create()──> Live ──delete()──> Deleted (stale)
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{LifecycleError, RemoteError};

/// 필드명 → 값 맵
///
/// 순서가 고정되어 있어 델타와 로그 출력이 결정적입니다.
pub type FieldSet = BTreeMap<String, serde_json::Value>;

/// 리소스 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// 클라우드 키 페어
    KeyPair,
    /// 커스텀 리포트
    Report,
    /// 리포트 스케줄
    Schedule,
    /// 메뉴 위젯
    MenuWidget,
    /// 리포트 위젯
    ReportWidget,
    /// 차트 위젯
    ChartWidget,
    /// RSS 피드 위젯
    RssFeedWidget,
    /// 대시보드
    Dashboard,
}

impl EntityKind {
    /// 모든 종류
    pub const ALL: [EntityKind; 8] = [
        Self::KeyPair,
        Self::Report,
        Self::Schedule,
        Self::MenuWidget,
        Self::ReportWidget,
        Self::ChartWidget,
        Self::RssFeedWidget,
        Self::Dashboard,
    ];

    /// 사용자에게 보이는 이름 (플래시 메시지에 사용)
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::KeyPair => "Key Pair",
            Self::Report => "Report",
            Self::Schedule => "Schedule",
            Self::MenuWidget
            | Self::ReportWidget
            | Self::ChartWidget
            | Self::RssFeedWidget => "Widget",
            Self::Dashboard => "Dashboard",
        }
    }

    /// 로그/메트릭 레이블용 고정 이름
    pub fn label(&self) -> &'static str {
        match self {
            Self::KeyPair => "key_pair",
            Self::Report => "report",
            Self::Schedule => "schedule",
            Self::MenuWidget => "menu_widget",
            Self::ReportWidget => "report_widget",
            Self::ChartWidget => "chart_widget",
            Self::RssFeedWidget => "rss_feed_widget",
            Self::Dashboard => "dashboard",
        }
    }

    /// 위젯 종류 여부
    pub fn is_widget(&self) -> bool {
        matches!(
            self,
            Self::MenuWidget | Self::ReportWidget | Self::ChartWidget | Self::RssFeedWidget
        )
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// 로컬 핸들의 생명주기 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// 로컬에만 존재 (원격 리소스 없음)
    #[default]
    Local,
    /// 원격 리소스가 생성됨
    Live,
    /// 삭제됨: 더 이상 변경에 사용할 수 없음
    Deleted,
}

/// 원격 시스템과 주고받는 레코드
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// 리소스 종류
    pub kind: EntityKind,
    /// 고유 이름
    pub name: String,
    /// 필드 값
    pub fields: FieldSet,
}

impl Record {
    /// 새 레코드를 생성합니다.
    pub fn new(kind: EntityKind, name: impl Into<String>, fields: FieldSet) -> Self {
        Self {
            kind,
            name: name.into(),
            fields,
        }
    }

    /// 필드 값을 조회합니다. 없으면 `None`.
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }

    /// 문자열 필드를 조회합니다.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(serde_json::Value::as_str)
    }
}

/// 원격 리소스를 나타내는 엔티티
///
/// 필드는 serde 직렬화 결과(JSON 객체)로 얻습니다. 생명주기 필드는
/// `#[serde(skip)]`으로 직렬화에서 제외해야 합니다.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// 리소스 종류
    const KIND: EntityKind;

    /// 업데이트 세션에서 변경할 수 있는 필드 목록
    const MUTABLE_FIELDS: &'static [&'static str];

    /// 고유 이름
    fn name(&self) -> &str;

    /// 현재 생명주기 상태
    fn lifecycle(&self) -> Lifecycle;

    /// 생명주기 상태를 변경합니다.
    fn set_lifecycle(&mut self, lifecycle: Lifecycle);

    /// 전체 필드 맵
    fn fields(&self) -> Result<FieldSet, RemoteError> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => Ok(map.into_iter().collect()),
            Ok(other) => Err(RemoteError::Serialization(format!(
                "{} \"{}\" serialized to a non-object value: {other}",
                Self::KIND,
                self.name()
            ))),
            Err(e) => Err(RemoteError::Serialization(e.to_string())),
        }
    }

    /// 변경 가능한 필드만 담은 스냅샷
    fn snapshot(&self) -> Result<FieldSet, RemoteError> {
        let mut fields = self.fields()?;
        fields.retain(|name, _| Self::MUTABLE_FIELDS.contains(&name.as_str()));
        Ok(fields)
    }

    /// 원격 전송용 레코드
    fn to_record(&self) -> Result<Record, RemoteError> {
        Ok(Record::new(Self::KIND, self.name(), self.fields()?))
    }

    /// 원격 레코드로부터 엔티티를 복원합니다. 생명주기는 `Live`입니다.
    fn from_record(record: &Record) -> Result<Self, RemoteError> {
        let object: serde_json::Map<String, serde_json::Value> = record
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let mut entity: Self = serde_json::from_value(serde_json::Value::Object(object))
            .map_err(|e| {
                RemoteError::Serialization(format!(
                    "{} \"{}\" record could not be decoded: {e}",
                    Self::KIND,
                    record.name
                ))
            })?;
        entity.set_lifecycle(Lifecycle::Live);
        Ok(entity)
    }

    /// 변경 작업 전에 핸들이 `Live`인지 확인합니다.
    fn ensure_live(&self) -> Result<(), LifecycleError> {
        match self.lifecycle() {
            Lifecycle::Live => Ok(()),
            Lifecycle::Local => Err(LifecycleError::NotCreated {
                kind: Self::KIND,
                name: self.name().to_owned(),
            }),
            Lifecycle::Deleted => Err(LifecycleError::Stale {
                kind: Self::KIND,
                name: self.name().to_owned(),
            }),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! 단위 테스트용 엔티티

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Gadget {
        pub name: String,
        pub description: String,
        pub active: bool,
        #[serde(default)]
        pub tags: Vec<String>,
        #[serde(skip)]
        pub lifecycle: Lifecycle,
    }

    impl Gadget {
        pub fn new(name: &str) -> Self {
            Self {
                name: name.to_owned(),
                description: "initial".to_owned(),
                active: true,
                tags: Vec::new(),
                lifecycle: Lifecycle::Local,
            }
        }
    }

    impl Entity for Gadget {
        const KIND: EntityKind = EntityKind::MenuWidget;
        const MUTABLE_FIELDS: &'static [&'static str] = &["description", "active", "tags"];

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
}

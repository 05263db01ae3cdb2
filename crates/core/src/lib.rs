#![doc = include_str!("../README.md")]

pub mod config;
pub mod data;
pub mod delta;
pub mod entity;
pub mod error;
pub mod fixture;
pub mod flash;
pub mod manager;
pub mod metrics;
pub mod names;
pub mod remote;
pub mod session;
pub mod tag;
pub mod types;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{
    AssertionError, ConfigError, CrudcheckError, DataError, FieldMismatch, FormError, KeyError,
    LifecycleError, Rejection, RejectionCode, RemoteError, UpdateError,
};

// 설정
pub use config::{CrudcheckConfig, SessionConfig};

// 엔티티와 세션
pub use delta::{FieldChange, UpdateDelta};
pub use entity::{Entity, EntityKind, FieldSet, Lifecycle, Record};
pub use fixture::Fixture;
pub use manager::EntityManager;
pub use session::{CommitOutcome, Patch, UpdateSession};

// 원격
pub use remote::{ActionOutput, ApplianceClient, EntityAction};

// 보조 타입
pub use data::{StaticProvider, TestCase, TestDataProvider};
pub use flash::{FlashLevel, FlashMessage};
pub use tag::Tag;
pub use types::{ProviderKind, RunRecord, RunStatus};

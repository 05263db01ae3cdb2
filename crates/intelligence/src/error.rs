//! 인텔리전스 크레이트 에러 타입

use crudcheck_core::entity::EntityKind;
use crudcheck_core::error::{AssertionError, CrudcheckError, DataError, RemoteError};

/// 인텔리전스 에러
#[derive(Debug, thiserror::Error)]
pub enum IntelligenceError {
    /// 동작 결과 형식이 기대와 다름
    #[error("unexpected output for {action} on {kind} \"{name}\": {detail}")]
    UnexpectedOutput {
        action: &'static str,
        kind: EntityKind,
        name: String,
        detail: String,
    },

    /// 완료된 실행이 하나도 없음
    #[error("{kind} \"{name}\" has no saved runs")]
    NoSavedRuns { kind: EntityKind, name: String },

    /// 케이스 데이터 에러
    #[error("case data error: {0}")]
    Data(#[from] DataError),

    /// 공통 에러
    #[error(transparent)]
    Core(#[from] CrudcheckError),
}

impl IntelligenceError {
    /// 원격 거부 메시지 (있으면)
    pub fn rejection_message(&self) -> Option<&str> {
        match self {
            Self::Core(err) => err.rejection().map(|r| r.message.as_str()),
            _ => None,
        }
    }
}

impl From<IntelligenceError> for CrudcheckError {
    fn from(err: IntelligenceError) -> Self {
        match err {
            IntelligenceError::UnexpectedOutput { .. } => {
                CrudcheckError::Remote(RemoteError::Serialization(err.to_string()))
            }
            IntelligenceError::NoSavedRuns { .. } => {
                CrudcheckError::Assertion(AssertionError::Failed(err.to_string()))
            }
            IntelligenceError::Data(e) => CrudcheckError::Data(e),
            IntelligenceError::Core(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_saved_runs_becomes_assertion_failure() {
        let err: CrudcheckError = IntelligenceError::NoSavedRuns {
            kind: EntityKind::Report,
            name: "r1".to_owned(),
        }
        .into();
        match err {
            CrudcheckError::Assertion(AssertionError::Failed(msg)) => {
                assert_eq!(msg, "Report \"r1\" has no saved runs");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn core_error_passes_through() {
        let inner = CrudcheckError::from(DataError::DuplicateId("x".to_owned()));
        let err: CrudcheckError = IntelligenceError::Core(inner).into();
        assert!(matches!(err, CrudcheckError::Data(DataError::DuplicateId(_))));
    }
}

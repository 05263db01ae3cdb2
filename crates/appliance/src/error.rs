//! 어플라이언스 에러 타입
//!
//! [`ApplianceError`]는 시뮬레이터 구성 단계의 에러입니다. 원격 호출
//! 에러는 공통 [`RemoteError`](crudcheck_core::error::RemoteError)를 사용합니다.

use crudcheck_core::error::{ConfigError, CrudcheckError};

/// 어플라이언스 구성 에러
#[derive(Debug, thiserror::Error)]
pub enum ApplianceError {
    /// 프로바이더가 하나도 없음
    #[error("appliance needs at least one cloud provider")]
    NoProviders,

    /// 같은 이름의 프로바이더가 두 번 등록됨
    #[error("duplicate provider name: {0}")]
    DuplicateProvider(String),

    /// 카탈로그 태그 형식 오류
    #[error("invalid catalog tag '{tag}': {reason}")]
    InvalidTag { tag: String, reason: String },
}

impl From<ApplianceError> for CrudcheckError {
    fn from(err: ApplianceError) -> Self {
        let field = match &err {
            ApplianceError::NoProviders | ApplianceError::DuplicateProvider(_) => {
                "appliance.providers"
            }
            ApplianceError::InvalidTag { .. } => "appliance.tag_catalog",
        };
        CrudcheckError::Config(ConfigError::InvalidValue {
            field: field.to_owned(),
            reason: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_config_error_with_field() {
        let err: CrudcheckError = ApplianceError::InvalidTag {
            tag: "bad".to_owned(),
            reason: "missing '/'".to_owned(),
        }
        .into();
        match err {
            CrudcheckError::Config(ConfigError::InvalidValue { field, reason }) => {
                assert_eq!(field, "appliance.tag_catalog");
                assert!(reason.contains("bad"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

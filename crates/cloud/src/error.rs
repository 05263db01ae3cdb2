//! 클라우드 크레이트 에러 타입
//!
//! [`CloudError`]는 키 페어 컬렉션에서 발생하는 에러를 나타냅니다.
//! `From<CloudError> for CrudcheckError` 구현으로 `?` 연산자를 통해
//! 상위 에러 타입으로 변환할 수 있습니다.

use crudcheck_core::error::{CrudcheckError, FormError, KeyError, RemoteError};

/// 추가 폼 이름 (폼 에러 메시지에 사용)
pub(crate) const ADD_FORM: &str = "Add New Key Pair";

/// 클라우드 에러
#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    /// 필수 필드가 비어 폼을 제출할 수 없음 (원격 호출 없음)
    #[error("key pair form cannot be submitted: '{field}' is required")]
    FormIncomplete { field: String },

    /// 등록되지 않은 프로바이더
    #[error("unknown cloud provider: {0}")]
    UnknownProvider(String),

    /// 공개 키 처리 실패
    #[error("key error: {0}")]
    Key(#[from] KeyError),

    /// 동작 결과 형식이 기대와 다름
    #[error("unexpected output for {action}: {detail}")]
    UnexpectedOutput { action: String, detail: String },

    /// 공통 에러
    #[error(transparent)]
    Core(#[from] CrudcheckError),
}

impl CloudError {
    /// 원격 거부 메시지 (있으면)
    pub fn rejection_message(&self) -> Option<&str> {
        match self {
            Self::Core(err) => err.rejection().map(|r| r.message.as_str()),
            _ => None,
        }
    }
}

impl From<CloudError> for CrudcheckError {
    fn from(err: CloudError) -> Self {
        match err {
            CloudError::FormIncomplete { field } => CrudcheckError::Form(FormError::Incomplete {
                form: ADD_FORM.to_owned(),
                field,
            }),
            CloudError::UnknownProvider(name) => CrudcheckError::Form(FormError::UnknownOption {
                form: ADD_FORM.to_owned(),
                field: "provider".to_owned(),
                value: name,
            }),
            CloudError::Key(e) => CrudcheckError::Key(e),
            CloudError::UnexpectedOutput { action, detail } => CrudcheckError::Remote(
                RemoteError::Serialization(format!("unexpected output for {action}: {detail}")),
            ),
            CloudError::Core(e) => e,
        }
    }
}

//! 에러 타입: 도메인별 에러 정의
//!
//! 실패는 세 갈래로 나뉩니다.
//! - 원격 시스템의 검증 거부 ([`Rejection`]): 메시지를 그대로 보존합니다.
//! - 존재 여부 확인 실패 ([`AssertionError::Existence`])
//! - 확인되지 않은 업데이트 ([`UpdateError::Unconfirmed`]): 거부와 구분됩니다.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::entity::EntityKind;

/// crudcheck 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum CrudcheckError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 원격 호출 에러
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// 업데이트 세션 에러
    #[error("update error: {0}")]
    Update(#[from] UpdateError),

    /// 핸들 생명주기 위반
    #[error("lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// 검증(assertion) 실패
    #[error("assertion failed: {0}")]
    Assertion(#[from] AssertionError),

    /// 테스트 데이터 에러
    #[error("test data error: {0}")]
    Data(#[from] DataError),

    /// 폼 입력 에러 (원격 호출 전)
    #[error("form error: {0}")]
    Form(#[from] FormError),

    /// 키 자료 에러
    #[error("key error: {0}")]
    Key(#[from] KeyError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CrudcheckError {
    /// 원격 시스템이 거부한 경우 해당 [`Rejection`]을 반환합니다.
    ///
    /// 생성 단계의 거부와 업데이트 단계의 거부를 모두 찾습니다.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Remote(RemoteError::Rejected(rejection)) => Some(rejection),
            Self::Update(err) => err.rejection(),
            _ => None,
        }
    }
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 거부 사유 코드
///
/// 메시지 문자열은 사람을 위한 것이고, 프로그램의 분기는 이 코드로 합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionCode {
    /// 이름이 비었거나 허용되지 않는 문자 포함
    InvalidName,
    /// 공개 키 형식 오류
    InvalidKey,
    /// 같은 이름의 리소스가 이미 존재
    Duplicate,
    /// 필드 값 검증 실패
    InvalidField,
    /// 변경이 허용되지 않는 필드
    ImmutableField,
    /// 참조 대상(프로바이더, 태그 등)을 찾을 수 없음
    UnknownReference,
    /// 해당 리소스 종류가 지원하지 않는 동작
    Unsupported,
}

impl fmt::Display for RejectionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidName => "invalid_name",
            Self::InvalidKey => "invalid_key",
            Self::Duplicate => "duplicate",
            Self::InvalidField => "invalid_field",
            Self::ImmutableField => "immutable_field",
            Self::UnknownReference => "unknown_reference",
            Self::Unsupported => "unsupported",
        };
        write!(f, "{s}")
    }
}

/// 원격 시스템의 검증 거부
///
/// `message`는 원격 시스템이 보낸 문자열 그대로입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// 구조화된 거부 코드
    pub code: RejectionCode,
    /// 원격 시스템이 제공한 메시지 원문
    pub message: String,
}

impl Rejection {
    /// 새 거부를 생성합니다.
    pub fn new(code: RejectionCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// 원격 호출 에러
#[derive(Debug, Clone, thiserror::Error)]
pub enum RemoteError {
    /// 원격 시스템이 요청을 거부함
    #[error("rejected: {0}")]
    Rejected(Rejection),

    /// 리소스를 찾을 수 없음
    #[error("{kind} \"{name}\" not found")]
    NotFound { kind: EntityKind, name: String },

    /// 제한 시간 초과 (재시도하지 않음)
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// 요청 본문 직렬화/역직렬화 실패
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// 연결 또는 전송 실패
    #[error("transport error: {0}")]
    Transport(String),
}

/// 필드 불일치: 업데이트 후 재조회 값이 기대와 다름
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMismatch {
    /// 필드명
    pub field: String,
    /// 기대한 값 (델타의 새 값)
    pub expected: serde_json::Value,
    /// 원격에서 읽은 값 (필드가 없으면 `null`)
    pub actual: serde_json::Value,
}

impl fmt::Display for FieldMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, found {}",
            self.field, self.expected, self.actual
        )
    }
}

/// 업데이트 세션 에러
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    /// 원격 시스템이 업데이트를 거부함
    #[error("{kind} \"{name}\" update rejected: {rejection}")]
    Rejected {
        kind: EntityKind,
        name: String,
        rejection: Rejection,
    },

    /// 원격이 성공을 보고했지만 상태에 반영되지 않음
    #[error("{kind} \"{name}\" update unconfirmed: {}", format_mismatches(.mismatches))]
    Unconfirmed {
        kind: EntityKind,
        name: String,
        mismatches: Vec<FieldMismatch>,
    },

    /// 허용 목록에 없는 필드를 변경함
    #[error("{kind} field '{field}' is not mutable")]
    ImmutableField { kind: EntityKind, field: String },

    /// 엔티티를 필드 맵으로 변환하지 못함
    #[error("{kind} \"{name}\" could not be snapshotted: {reason}")]
    Snapshot {
        kind: EntityKind,
        name: String,
        reason: String,
    },

    /// 그 밖의 원격 에러 (타임아웃, 전송 실패 등)
    #[error(transparent)]
    Remote(RemoteError),
}

impl UpdateError {
    /// 거부된 경우 [`Rejection`]을 반환합니다.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected { rejection, .. } => Some(rejection),
            Self::Remote(RemoteError::Rejected(rejection)) => Some(rejection),
            _ => None,
        }
    }
}

fn format_mismatches(mismatches: &[FieldMismatch]) -> String {
    mismatches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// 핸들 생명주기 위반
#[derive(Debug, Clone, thiserror::Error)]
pub enum LifecycleError {
    /// 아직 생성되지 않은 로컬 핸들
    #[error("{kind} \"{name}\" has not been created")]
    NotCreated { kind: EntityKind, name: String },

    /// 이미 생성된 핸들로 다시 생성 시도
    #[error("{kind} \"{name}\" was already created")]
    AlreadyCreated { kind: EntityKind, name: String },

    /// 삭제된(stale) 핸들 재사용
    #[error("{kind} \"{name}\" was deleted; the handle is stale")]
    Stale { kind: EntityKind, name: String },
}

/// 검증(assertion) 실패
#[derive(Debug, Clone, thiserror::Error)]
pub enum AssertionError {
    /// 존재 여부가 기대와 다름
    #[error("expected {kind} \"{name}\" to {}", expectation(.expected))]
    Existence {
        kind: EntityKind,
        name: String,
        expected: bool,
    },

    /// 플래시 메시지가 기대와 다름
    #[error("flash message mismatch: expected \"{expected}\", found \"{actual}\"")]
    FlashMismatch { expected: String, actual: String },

    /// 기대한 에러가 발생하지 않음
    #[error("expected rejection \"{expected}\" but the operation succeeded")]
    MissingRejection { expected: String },

    /// 그 밖의 검증 실패
    #[error("{0}")]
    Failed(String),
}

fn expectation(expected: &bool) -> &'static str {
    if *expected { "exist" } else { "not exist" }
}

/// 테스트 데이터 에러
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// 케이스 역직렬화 실패
    #[error("test case '{id}' is invalid: {reason}")]
    InvalidCase { id: String, reason: String },

    /// 중복된 케이스 ID
    #[error("duplicate test case id '{0}'")]
    DuplicateId(String),
}

/// 폼 입력 에러
///
/// 제출 전에 로컬에서 걸러지므로 원격 호출은 일어나지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    /// 필수 필드가 비어 제출할 수 없음
    #[error("{form} form cannot be submitted: '{field}' is required")]
    Incomplete { form: String, field: String },

    /// 선택지에 없는 값
    #[error("{form} form has no option '{value}' for '{field}'")]
    UnknownOption {
        form: String,
        field: String,
        value: String,
    },
}

/// 키 자료 에러 (OpenSSH 공개 키 파싱, 키 생성)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// 형식이 잘못된 공개 키
    #[error("malformed public key: {0}")]
    Malformed(String),

    /// 지원하지 않는 키 종류
    #[error("unsupported key type '{0}'")]
    UnsupportedType(String),

    /// 키 생성 실패
    #[error("key generation failed: {0}")]
    Generation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_display_is_message_verbatim() {
        let rejection = Rejection::new(
            RejectionCode::InvalidName,
            "Unable to create Key Pair \".?!_\": Keypair data is invalid: Keypair name contains unsafe characters",
        );
        assert_eq!(
            rejection.to_string(),
            "Unable to create Key Pair \".?!_\": Keypair data is invalid: Keypair name contains unsafe characters"
        );
    }

    #[test]
    fn remote_rejected_display_includes_message() {
        let err = RemoteError::Rejected(Rejection::new(RejectionCode::Duplicate, "taken"));
        assert_eq!(err.to_string(), "rejected: taken");
    }

    #[test]
    fn unconfirmed_lists_every_mismatch() {
        let err = UpdateError::Unconfirmed {
            kind: EntityKind::Schedule,
            name: "nightly".to_owned(),
            mismatches: vec![
                FieldMismatch {
                    field: "description".to_owned(),
                    expected: serde_json::json!("badger"),
                    actual: serde_json::json!("old"),
                },
                FieldMismatch {
                    field: "active".to_owned(),
                    expected: serde_json::json!(false),
                    actual: serde_json::json!(true),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("nightly"));
        assert!(msg.contains("description"));
        assert!(msg.contains("active"));
    }

    #[test]
    fn rejection_found_through_top_level_error() {
        let rejection = Rejection::new(RejectionCode::InvalidKey, "bad key");
        let err: CrudcheckError = RemoteError::Rejected(rejection.clone()).into();
        assert_eq!(err.rejection(), Some(&rejection));

        let err: CrudcheckError = UpdateError::Rejected {
            kind: EntityKind::Dashboard,
            name: "d".to_owned(),
            rejection: rejection.clone(),
        }
        .into();
        assert_eq!(err.rejection(), Some(&rejection));
    }

    #[test]
    fn unconfirmed_is_not_a_rejection() {
        let err = UpdateError::Unconfirmed {
            kind: EntityKind::Report,
            name: "r".to_owned(),
            mismatches: Vec::new(),
        };
        assert!(err.rejection().is_none());
    }

    #[test]
    fn existence_assertion_display() {
        let err = AssertionError::Existence {
            kind: EntityKind::KeyPair,
            name: "abc123".to_owned(),
            expected: false,
        };
        assert_eq!(err.to_string(), "expected Key Pair \"abc123\" to not exist");
    }

    #[test]
    fn config_error_converts_to_top_level() {
        let err: CrudcheckError = ConfigError::InvalidValue {
            field: "session.poll_interval_ms".to_owned(),
            reason: "must be 1-60000".to_owned(),
        }
        .into();
        assert!(matches!(err, CrudcheckError::Config(_)));
        assert!(err.to_string().contains("poll_interval_ms"));
    }

    #[test]
    fn form_error_names_missing_field() {
        let err: CrudcheckError = FormError::Incomplete {
            form: "Add Key Pair".to_owned(),
            field: "name".to_owned(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "form error: Add Key Pair form cannot be submitted: 'name' is required"
        );
        assert!(err.rejection().is_none());
    }
}

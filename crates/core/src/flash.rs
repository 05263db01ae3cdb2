//! 플래시 메시지: 원격 동작 후 표시되는 일시적 알림
//!
//! 거부 메시지는 [`Rejection`]에서 그대로 옮겨지며,
//! [`FlashMessage::assert_message`]는 문자열이 정확히 같아야 통과합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AssertionError, Rejection};

/// 플래시 메시지 수준
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    /// 성공
    Success,
    /// 정보
    Info,
    /// 경고
    Warning,
    /// 에러
    Error,
}

impl fmt::Display for FlashLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// 플래시 메시지
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    /// 수준
    pub level: FlashLevel,
    /// 본문
    pub text: String,
}

impl FlashMessage {
    /// 새 메시지를 생성합니다.
    pub fn new(level: FlashLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    /// 성공 메시지
    pub fn success(text: impl Into<String>) -> Self {
        Self::new(FlashLevel::Success, text)
    }

    /// 에러 메시지
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(FlashLevel::Error, text)
    }

    /// 본문이 `expected`와 정확히 같은지 확인합니다.
    pub fn assert_message(&self, expected: &str) -> Result<(), AssertionError> {
        if self.text == expected {
            Ok(())
        } else {
            Err(AssertionError::FlashMismatch {
                expected: expected.to_owned(),
                actual: self.text.clone(),
            })
        }
    }

    /// 본문이 `fragment`를 포함하는지 확인합니다.
    pub fn assert_contains(&self, fragment: &str) -> Result<(), AssertionError> {
        if self.text.contains(fragment) {
            Ok(())
        } else {
            Err(AssertionError::FlashMismatch {
                expected: format!("*{fragment}*"),
                actual: self.text.clone(),
            })
        }
    }

    /// 수준이 `expected`인지 확인합니다.
    pub fn assert_level(&self, expected: FlashLevel) -> Result<(), AssertionError> {
        if self.level == expected {
            Ok(())
        } else {
            Err(AssertionError::Failed(format!(
                "expected {expected} flash, found {} flash \"{}\"",
                self.level, self.text
            )))
        }
    }
}

impl From<&Rejection> for FlashMessage {
    fn from(rejection: &Rejection) -> Self {
        Self::error(rejection.message.clone())
    }
}

impl fmt::Display for FlashMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.text)
    }
}

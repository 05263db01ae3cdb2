//! 장애 주입 계획

use std::time::Duration;

/// 시뮬레이터에 주입할 장애
///
/// 기본값은 장애 없음입니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultPlan {
    /// 업데이트를 성공으로 응답하지만 적용하지 않음
    pub drop_updates: bool,
    /// 모든 업데이트를 이 사유로 거부
    pub reject_updates: Option<String>,
    /// 모든 호출을 이만큼 지연
    pub stall: Option<Duration>,
    /// 모든 호출을 전송 에러로 실패
    pub offline: bool,
    /// 조회(`read`)만 전송 에러로 실패
    pub fail_reads: bool,
}

impl FaultPlan {
    /// 장애 없음
    pub fn none() -> Self {
        Self::default()
    }

    /// 업데이트 무시
    pub fn drop_updates() -> Self {
        Self {
            drop_updates: true,
            ..Self::default()
        }
    }

    /// 업데이트 거부
    pub fn reject_updates(reason: impl Into<String>) -> Self {
        Self {
            reject_updates: Some(reason.into()),
            ..Self::default()
        }
    }

    /// 호출 지연
    pub fn stall(duration: Duration) -> Self {
        Self {
            stall: Some(duration),
            ..Self::default()
        }
    }

    /// 연결 끊김
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    /// 조회만 실패
    pub fn fail_reads() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    /// 장애가 하나라도 설정되었는지
    pub fn is_active(&self) -> bool {
        self.drop_updates || self.reject_updates.is_some() || self.stall.is_some()
            || self.offline
            || self.fail_reads
    }
}

//! 도메인 타입: 크레이트 전역에서 공유하는 작은 타입

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 클라우드 프로바이더 종류
///
/// 프로바이더마다 키 페어 이름 규칙과 에러 메시지가 다릅니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Amazon EC2
    Ec2,
    /// OpenStack
    OpenStack,
}

impl ProviderKind {
    /// 설정 파일에서 쓰는 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ec2 => "ec2",
            Self::OpenStack => "openstack",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ec2" => Ok(Self::Ec2),
            "openstack" => Ok(Self::OpenStack),
            other => Err(format!(
                "unknown provider kind '{other}' (expected: ec2, openstack)"
            )),
        }
    }
}

/// 실행(큐) 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// 대기 중
    Queued,
    /// 실행 중
    Running,
    /// 완료
    Finished,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Finished => "finished",
        };
        f.write_str(s)
    }
}

/// 리포트/스케줄 실행 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// 실행 ID
    pub id: String,
    /// 상태
    pub status: RunStatus,
    /// 열 이름
    pub columns: Vec<String>,
    /// 결과 행 (완료 전에는 비어 있음)
    pub rows: Vec<Vec<String>>,
}

impl RunRecord {
    /// 완료 여부
    pub fn is_finished(&self) -> bool {
        self.status == RunStatus::Finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_parse_is_case_insensitive() {
        assert_eq!("EC2".parse::<ProviderKind>().unwrap(), ProviderKind::Ec2);
        assert_eq!(
            "OpenStack".parse::<ProviderKind>().unwrap(),
            ProviderKind::OpenStack
        );
        assert!("azure".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn provider_kind_serde_uses_lowercase() {
        let json = serde_json::to_string(&ProviderKind::OpenStack).unwrap();
        assert_eq!(json, "\"openstack\"");
    }

    #[test]
    fn run_record_finished() {
        let mut run = RunRecord {
            id: "r1".to_owned(),
            status: RunStatus::Queued,
            columns: Vec::new(),
            rows: Vec::new(),
        };
        assert!(!run.is_finished());
        run.status = RunStatus::Finished;
        assert!(run.is_finished());
    }
}

//! 설정 관리: crudcheck.toml 파싱 및 런타임 설정
//!
//! [`CrudcheckConfig`]는 모든 크레이트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`CRUDCHECK_SESSION_POLL_INTERVAL_MS=250` 형식)
//! 3. 설정 파일 (`crudcheck.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), crudcheck_core::error::CrudcheckError> {
//! use crudcheck_core::config::CrudcheckConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = CrudcheckConfig::load("crudcheck.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = CrudcheckConfig::parse("[session]\nverify_updates = false")?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, CrudcheckError};
use crate::tag::Tag;
use crate::types::ProviderKind;

/// crudcheck 통합 설정
///
/// `crudcheck.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrudcheckConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 업데이트 세션 및 원격 호출 설정
    #[serde(default)]
    pub session: SessionConfig,
    /// 시뮬레이션 어플라이언스 설정
    #[serde(default)]
    pub appliance: ApplianceConfig,
    /// 테스트 데이터
    #[serde(default)]
    pub data: DataConfig,
}

impl CrudcheckConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CrudcheckError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, CrudcheckError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CrudcheckError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                CrudcheckError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, CrudcheckError> {
        toml::from_str(toml_str).map_err(|e| {
            CrudcheckError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `CRUDCHECK_{SECTION}_{FIELD}`
    /// 예: `CRUDCHECK_SESSION_VERIFY_UPDATES=false`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "CRUDCHECK_GENERAL_LOG_LEVEL");
        override_string(
            &mut self.general.log_format,
            "CRUDCHECK_GENERAL_LOG_FORMAT",
        );

        // Session
        override_u64(
            &mut self.session.operation_timeout_secs,
            "CRUDCHECK_SESSION_OPERATION_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.session.wait_timeout_secs,
            "CRUDCHECK_SESSION_WAIT_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.session.poll_interval_ms,
            "CRUDCHECK_SESSION_POLL_INTERVAL_MS",
        );
        override_bool(
            &mut self.session.verify_updates,
            "CRUDCHECK_SESSION_VERIFY_UPDATES",
        );

        // Appliance
        override_csv(
            &mut self.appliance.tag_catalog,
            "CRUDCHECK_APPLIANCE_TAG_CATALOG",
        );
        override_u64(
            &mut self.appliance.delete_delay_ms,
            "CRUDCHECK_APPLIANCE_DELETE_DELAY_MS",
        );
        override_u64(
            &mut self.appliance.run_delay_ms,
            "CRUDCHECK_APPLIANCE_RUN_DELAY_MS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), CrudcheckError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        check_range(
            "session.operation_timeout_secs",
            self.session.operation_timeout_secs,
            1,
            3600,
        )?;
        check_range(
            "session.wait_timeout_secs",
            self.session.wait_timeout_secs,
            1,
            3600,
        )?;
        check_range(
            "session.poll_interval_ms",
            self.session.poll_interval_ms,
            1,
            60_000,
        )?;
        if self.session.poll_interval_ms > self.session.wait_timeout_secs * 1000 {
            return Err(invalid(
                "session.poll_interval_ms",
                "must not exceed session.wait_timeout_secs".to_owned(),
            ));
        }

        // providers 검증
        if self.appliance.providers.is_empty() {
            return Err(invalid(
                "appliance.providers",
                "at least one provider is required".to_owned(),
            ));
        }
        let mut seen = HashSet::new();
        for provider in &self.appliance.providers {
            if provider.name.trim().is_empty() {
                return Err(invalid(
                    "appliance.providers.name",
                    "provider name must not be empty".to_owned(),
                ));
            }
            if !seen.insert(provider.name.as_str()) {
                return Err(invalid(
                    "appliance.providers.name",
                    format!("duplicate provider name '{}'", provider.name),
                ));
            }
        }

        // tag_catalog 검증
        for raw in &self.appliance.tag_catalog {
            if let Err(e) = raw.parse::<Tag>() {
                return Err(invalid("appliance.tag_catalog", e.to_string()));
            }
        }

        check_range(
            "appliance.delete_delay_ms",
            self.appliance.delete_delay_ms,
            0,
            600_000,
        )?;
        check_range(
            "appliance.run_delay_ms",
            self.appliance.run_delay_ms,
            0,
            600_000,
        )?;

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> CrudcheckError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

fn check_range(field: &str, value: u64, min: u64, max: u64) -> Result<(), CrudcheckError> {
    if value < min || value > max {
        return Err(invalid(field, format!("must be between {min} and {max}")));
    }
    Ok(())
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 업데이트 세션 및 원격 호출 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// 원격 호출 1회당 제한 시간 (초)
    pub operation_timeout_secs: u64,
    /// 삭제/실행 완료 대기 제한 시간 (초)
    pub wait_timeout_secs: u64,
    /// 대기 중 폴링 간격 (밀리초)
    pub poll_interval_ms: u64,
    /// 커밋 후 재조회로 반영 여부를 확인할지
    pub verify_updates: bool,
}

impl SessionConfig {
    /// 원격 호출 제한 시간
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// 대기 제한 시간
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    /// 폴링 간격
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            operation_timeout_secs: 30,
            wait_timeout_secs: 120,
            poll_interval_ms: 500,
            verify_updates: true,
        }
    }
}

/// 등록된 클라우드 프로바이더
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// 프로바이더 이름 (키 페어 폼에서 선택하는 값)
    pub name: String,
    /// 프로바이더 종류
    pub kind: ProviderKind,
}

/// 시뮬레이션 어플라이언스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplianceConfig {
    /// 등록된 클라우드 프로바이더
    pub providers: Vec<ProviderConfig>,
    /// 태그 카탈로그 (`Category/Name` 형식)
    pub tag_catalog: Vec<String>,
    /// 삭제가 조회에 반영되기까지의 지연 (밀리초)
    pub delete_delay_ms: u64,
    /// 큐에 넣은 실행이 끝나기까지의 지연 (밀리초)
    pub run_delay_ms: u64,
}

impl ApplianceConfig {
    /// 삭제 반영 지연
    pub fn delete_delay(&self) -> Duration {
        Duration::from_millis(self.delete_delay_ms)
    }

    /// 실행 완료 지연
    pub fn run_delay(&self) -> Duration {
        Duration::from_millis(self.run_delay_ms)
    }

    /// 파싱된 태그 카탈로그. 잘못된 항목은 경고 후 건너뜁니다.
    pub fn tags(&self) -> Vec<Tag> {
        self.tag_catalog
            .iter()
            .filter_map(|raw| match raw.parse::<Tag>() {
                Ok(tag) => Some(tag),
                Err(e) => {
                    warn!(tag = raw.as_str(), error = %e, "skipping malformed catalog tag");
                    None
                }
            })
            .collect()
    }

    /// 이름으로 프로바이더를 찾습니다.
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }
}

impl Default for ApplianceConfig {
    fn default() -> Self {
        Self {
            providers: vec![
                ProviderConfig {
                    name: "ec2-east".to_owned(),
                    kind: ProviderKind::Ec2,
                },
                ProviderConfig {
                    name: "rhos-01".to_owned(),
                    kind: ProviderKind::OpenStack,
                },
            ],
            tag_catalog: vec![
                "Department/Engineering".to_owned(),
                "Department/Finance".to_owned(),
                "Location/Brno".to_owned(),
                "Location/Raleigh".to_owned(),
            ],
            delete_delay_ms: 200,
            run_delay_ms: 500,
        }
    }
}

/// 테스트 데이터 (데이터 기반 시나리오의 파라미터)
///
/// 비어 있으면 각 크레이트의 기본 케이스를 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// 커스텀 리포트 케이스 (`[[data.reports]]`)
    pub reports: Vec<serde_json::Value>,
    /// 스케줄 케이스 (`[[data.schedules]]`)
    pub schedules: Vec<serde_json::Value>,
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

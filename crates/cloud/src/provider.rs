//! 클라우드 프로바이더

use std::fmt;

use serde::{Deserialize, Serialize};

use crudcheck_core::config::{ApplianceConfig, ProviderConfig};
use crudcheck_core::types::ProviderKind;

use crate::error::CloudError;

/// 등록된 클라우드 프로바이더
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudProvider {
    /// 프로바이더 이름
    pub name: String,
    /// 프로바이더 종류
    pub kind: ProviderKind,
}

impl CloudProvider {
    /// 새 프로바이더를 생성합니다.
    pub fn new(name: impl Into<String>, kind: ProviderKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// 종류가 `kinds` 중 하나인지
    pub fn one_of(&self, kinds: &[ProviderKind]) -> bool {
        kinds.contains(&self.kind)
    }

    /// 설정에 등록된 모든 프로바이더
    pub fn all(config: &ApplianceConfig) -> Vec<Self> {
        config.providers.iter().map(Self::from).collect()
    }

    /// 설정에서 이름으로 프로바이더를 찾습니다.
    pub fn lookup(config: &ApplianceConfig, name: &str) -> Result<Self, CloudError> {
        config
            .provider(name)
            .map(Self::from)
            .ok_or_else(|| CloudError::UnknownProvider(name.to_owned()))
    }
}

impl From<&ProviderConfig> for CloudProvider {
    fn from(config: &ProviderConfig) -> Self {
        Self::new(config.name.clone(), config.kind)
    }
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_lists_both_kinds() {
        let providers = CloudProvider::all(&ApplianceConfig::default());
        assert!(providers.iter().any(|p| p.kind == ProviderKind::Ec2));
        assert!(providers.iter().any(|p| p.kind == ProviderKind::OpenStack));
    }

    #[test]
    fn lookup_unknown_provider_fails() {
        let err = CloudProvider::lookup(&ApplianceConfig::default(), "azure").unwrap_err();
        assert!(matches!(err, CloudError::UnknownProvider(_)));
    }

    #[test]
    fn one_of_matches_kind() {
        let provider = CloudProvider::new("rhos", ProviderKind::OpenStack);
        assert!(provider.one_of(&[ProviderKind::OpenStack]));
        assert!(!provider.one_of(&[ProviderKind::Ec2]));
        assert_eq!(provider.to_string(), "rhos (openstack)");
    }
}

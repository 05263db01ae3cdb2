//! 키 페어 엔티티

use serde::{Deserialize, Serialize};

use crudcheck_core::entity::{Entity, EntityKind, Lifecycle};

use crate::provider::CloudProvider;

/// 클라우드 키 페어
///
/// 생성 후에는 어떤 필드도 바꿀 수 없습니다. 지문은 원격이 계산해 채웁니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPair {
    /// 키 페어 이름
    pub name: String,
    /// 프로바이더 이름
    pub provider: String,
    /// 사용자가 제공한 OpenSSH 공개 키 (없으면 원격이 생성)
    #[serde(default)]
    pub public_key: Option<String>,
    /// `SHA256:` 지문
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(skip)]
    lifecycle: Lifecycle,
}

impl KeyPair {
    /// 아직 생성되지 않은 로컬 핸들
    pub fn new(name: impl Into<String>, provider: &CloudProvider, public_key: Option<String>) -> Self {
        Self {
            name: name.into(),
            provider: provider.name.clone(),
            public_key,
            fingerprint: None,
            lifecycle: Lifecycle::Local,
        }
    }
}

impl Entity for KeyPair {
    const KIND: EntityKind = EntityKind::KeyPair;
    const MUTABLE_FIELDS: &'static [&'static str] = &[];

    fn name(&self) -> &str {
        &self.name
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    fn set_lifecycle(&mut self, lifecycle: Lifecycle) {
        self.lifecycle = lifecycle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crudcheck_core::types::ProviderKind;

    #[test]
    fn new_key_pair_is_local_without_fingerprint() {
        let provider = CloudProvider::new("ec2-east", ProviderKind::Ec2);
        let key = KeyPair::new("abc", &provider, None);
        assert_eq!(key.lifecycle(), Lifecycle::Local);
        assert_eq!(key.provider, "ec2-east");
        assert!(key.fingerprint.is_none());
    }

    #[test]
    fn record_carries_provider_and_key() {
        let provider = CloudProvider::new("rhos-01", ProviderKind::OpenStack);
        let key = KeyPair::new("abc", &provider, Some("ssh-ed25519 AAAA".to_owned()));
        let record = key.to_record().unwrap();
        assert_eq!(record.kind, EntityKind::KeyPair);
        assert_eq!(record.str_field("provider"), Some("rhos-01"));
        assert_eq!(record.str_field("public_key"), Some("ssh-ed25519 AAAA"));
        assert!(!record.fields.contains_key("lifecycle"));
    }

    #[test]
    fn no_field_is_mutable() {
        let provider = CloudProvider::new("rhos-01", ProviderKind::OpenStack);
        let key = KeyPair::new("abc", &provider, None);
        assert!(key.snapshot().unwrap().is_empty());
    }
}

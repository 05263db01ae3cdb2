//! 키 페어 컬렉션: 추가 폼과 키 페어 단위 동작
//!
//! 추가 폼은 두 가지 경우 원격 호출 없이 끝납니다.
//! - 취소: 로컬 핸들만 반환하며 `exists`는 거짓입니다.
//! - 이름이 빔: 폼을 제출할 수 없어 [`CloudError::FormIncomplete`]

use std::collections::BTreeSet;

use tracing::{info, warn};

use crudcheck_core::manager::EntityManager;
use crudcheck_core::remote::{ActionOutput, ApplianceClient, EntityAction};
use crudcheck_core::tag::Tag;

use crate::error::CloudError;
use crate::keypair::KeyPair;
use crate::provider::CloudProvider;

/// 키 페어 컬렉션
pub struct KeyPairCollection<'a, C: ApplianceClient> {
    manager: &'a EntityManager<C>,
}

impl<'a, C: ApplianceClient> KeyPairCollection<'a, C> {
    /// 새 컬렉션을 생성합니다.
    pub fn new(manager: &'a EntityManager<C>) -> Self {
        Self { manager }
    }

    /// 원격 호출 없이 로컬 핸들을 만듭니다.
    pub fn instantiate(
        &self,
        name: &str,
        provider: &CloudProvider,
        public_key: Option<&str>,
    ) -> KeyPair {
        KeyPair::new(name, provider, public_key.map(str::to_owned))
    }

    /// 추가 폼을 채워 키 페어를 생성합니다.
    ///
    /// `cancel`이 참이면 폼을 취소하고 로컬 핸들을 반환합니다.
    ///
    /// # Errors
    ///
    /// - [`CloudError::FormIncomplete`]: 이름이 비어 있음 (원격 호출 없음)
    /// - [`CloudError::Core`]: 원격 거부 (메시지 원문은 `rejection_message()`)
    ///
    /// 생성 직후 재조회가 실패하면 만든 키 페어를 삭제한 뒤 에러를 반환합니다.
    pub async fn create(
        &self,
        name: &str,
        provider: &CloudProvider,
        public_key: Option<&str>,
        cancel: bool,
    ) -> Result<KeyPair, CloudError> {
        let mut keypair = self.instantiate(name, provider, public_key);

        if cancel {
            info!(name, provider = provider.name.as_str(), "add key pair cancelled");
            return Ok(keypair);
        }

        if name.trim().is_empty() {
            return Err(CloudError::FormIncomplete {
                field: "name".to_owned(),
            });
        }

        self.manager.create(&mut keypair).await?;
        if let Err(err) = self.manager.refresh(&mut keypair).await {
            if let Err(cleanup) = self.manager.delete(&mut keypair, true).await {
                warn!(name, error = %cleanup, "failed to remove key pair after refresh error");
            }
            return Err(err.into());
        }
        info!(
            name,
            provider = provider.name.as_str(),
            fingerprint = keypair.fingerprint.as_deref().unwrap_or(""),
            "key pair added"
        );
        Ok(keypair)
    }

    /// 원격에 존재하는지
    pub async fn exists(&self, keypair: &KeyPair) -> Result<bool, CloudError> {
        Ok(self.manager.exists(keypair).await?)
    }

    /// 삭제합니다. `wait`이면 조회에서 사라질 때까지 기다립니다.
    pub async fn delete(&self, keypair: &mut KeyPair, wait: bool) -> Result<(), CloudError> {
        Ok(self.manager.delete(keypair, wait).await?)
    }

    /// 원격이 생성한 개인 키를 내려받습니다.
    pub async fn download_private_key(&self, keypair: &KeyPair) -> Result<String, CloudError> {
        match self
            .manager
            .perform(keypair, EntityAction::DownloadPrivateKey)
            .await?
        {
            ActionOutput::PrivateKey(pem) => Ok(pem),
            other => Err(CloudError::UnexpectedOutput {
                action: EntityAction::DownloadPrivateKey.to_string(),
                detail: format!("{other:?}"),
            }),
        }
    }

    /// 할당되지 않은 첫 카탈로그 태그를 붙이고 반환합니다.
    pub async fn add_tag(&self, keypair: &KeyPair) -> Result<Tag, CloudError> {
        Ok(self.manager.add_tag(keypair).await?)
    }

    /// 할당된 태그
    pub async fn tags(&self, keypair: &KeyPair) -> Result<BTreeSet<Tag>, CloudError> {
        Ok(self.manager.tags(keypair).await?)
    }

    /// 태그를 제거합니다.
    pub async fn remove_tag(&self, keypair: &KeyPair, tag: &Tag) -> Result<(), CloudError> {
        Ok(self.manager.remove_tag(keypair, tag).await?)
    }
}

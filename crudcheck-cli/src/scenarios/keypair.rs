//! 키 페어 시나리오

use futures::FutureExt;
use tracing::warn;

use crudcheck_cloud::sshkey::{fingerprint_of, private_key_public_blob};
use crudcheck_cloud::{CloudError, CloudProvider, KeyPair, KeyPairCollection, PublicKey};
use crudcheck_core::entity::{Entity, Lifecycle};
use crudcheck_core::error::{AssertionError, CrudcheckError, FormError};
use crudcheck_core::fixture::Fixture;
use crudcheck_core::flash::FlashMessage;
use crudcheck_core::manager::EntityManager;
use crudcheck_core::names::random_name;
use crudcheck_core::remote::ApplianceClient;
use crudcheck_core::types::ProviderKind;

use super::ensure;

/// OpenSSH 형식이 아닌 공개 키 (본문이 잘림)
const TRUNCATED_RSA_KEY: &str = "ssh-rsa AAAAB3NzaC1yc2EAAAADAQABAAABAQC";

/// 고정된 2048비트 RSA 공개 키
pub(super) fn sample_rsa_key() -> String {
    let mut modulus = vec![0xC7_u8; 256];
    modulus[255] = 0x01;
    PublicKey::rsa(&[0x01, 0x00, 0x01], &modulus, Some("crudcheck@example".to_owned()))
        .to_openssh()
}

/// 생성 → 존재 확인 → (지문 확인) → 삭제 대기 → 부재 확인
pub(super) async fn crud<C: ApplianceClient>(
    manager: &EntityManager<C>,
    provider: &CloudProvider,
    public_key: Option<&str>,
) -> Result<(), CrudcheckError> {
    let expected = public_key.map(PublicKey::parse).transpose()?.map(|k| k.fingerprint());
    let keypair = KeyPairCollection::new(manager)
        .create(&random_name("kp"), provider, public_key, false)
        .await?;

    Fixture::guard(manager, keypair, move |manager, keypair| {
        async move {
            manager.assert_exists(&*keypair).await?;
            let fingerprint = keypair.fingerprint.clone().unwrap_or_default();
            match expected {
                Some(expected) => ensure(fingerprint == expected, || {
                    format!("fingerprint {fingerprint} does not match supplied key {expected}")
                })?,
                None => ensure(fingerprint.starts_with("SHA256:"), || {
                    format!("generated key pair has no fingerprint: {fingerprint:?}")
                })?,
            }

            manager.delete(keypair, true).await?;
            manager.assert_absent(&*keypair).await
        }
        .boxed()
    })
    .await
}

/// 취소한 폼은 아무것도 만들지 않음
pub(super) async fn create_cancel<C: ApplianceClient>(
    manager: &EntityManager<C>,
    provider: &CloudProvider,
) -> Result<(), CrudcheckError> {
    let keypair = KeyPairCollection::new(manager)
        .create(&random_name("kp"), provider, None, true)
        .await?;
    ensure(keypair.lifecycle() == Lifecycle::Local, || {
        format!("cancelled key pair is {:?}", keypair.lifecycle())
    })?;
    manager.assert_absent(&keypair).await
}

/// 이름이 빈 폼은 제출되지 않음
pub(super) async fn empty_name<C: ApplianceClient>(
    manager: &EntityManager<C>,
    provider: &CloudProvider,
) -> Result<(), CrudcheckError> {
    match KeyPairCollection::new(manager)
        .create("", provider, None, false)
        .await
    {
        Err(err @ CloudError::FormIncomplete { .. }) => match CrudcheckError::from(err) {
            CrudcheckError::Form(FormError::Incomplete { field, .. }) if field == "name" => Ok(()),
            other => Err(other),
        },
        Err(other) => Err(other.into()),
        Ok(keypair) => Err(AssertionError::Failed(format!(
            "key pair with an empty name was submitted ({:?})",
            keypair.lifecycle()
        ))
        .into()),
    }
}

/// OpenStack 이름 문자 규칙
pub(super) async fn name_validation<C: ApplianceClient>(
    manager: &EntityManager<C>,
    provider: &CloudProvider,
) -> Result<(), CrudcheckError> {
    let name = ".?!_";
    let result = KeyPairCollection::new(manager)
        .create(name, provider, None, false)
        .await;
    expect_rejection(
        manager,
        result,
        &format!(
            "Unable to create Key Pair \"{name}\": Keypair data is invalid: Keypair name contains unsafe characters"
        ),
    )
    .await
}

/// 잘못된 공개 키는 프로바이더별 메시지로 거부됨
pub(super) async fn invalid_key<C: ApplianceClient>(
    manager: &EntityManager<C>,
    provider: &CloudProvider,
) -> Result<(), CrudcheckError> {
    let name = random_name("kp");
    let reason = match provider.kind {
        ProviderKind::Ec2 => "Key is not in valid OpenSSH public key format",
        ProviderKind::OpenStack => "Keypair data is invalid: failed to generate fingerprint",
    };
    let result = KeyPairCollection::new(manager)
        .create(&name, provider, Some(TRUNCATED_RSA_KEY), false)
        .await;
    expect_rejection(
        manager,
        result,
        &format!("Unable to create Key Pair \"{name}\": {reason}"),
    )
    .await
}

/// 태그 추가와 제거
pub(super) async fn add_remove_tag<C: ApplianceClient>(
    manager: &EntityManager<C>,
    provider: &CloudProvider,
) -> Result<(), CrudcheckError> {
    let keypair = KeyPairCollection::new(manager)
        .create(&random_name("kp"), provider, None, false)
        .await?;

    Fixture::guard(manager, keypair, |manager, keypair| {
        async move {
            let collection = KeyPairCollection::new(manager);
            let tag = collection.add_tag(keypair).await?;
            ensure(collection.tags(keypair).await?.contains(&tag), || {
                format!("tag {tag} was not assigned")
            })?;

            collection.remove_tag(keypair, &tag).await?;
            let remaining = collection.tags(keypair).await?;
            ensure(!remaining.contains(&tag), || format!("tag {tag} was not removed"))?;
            Ok(())
        }
        .boxed()
    })
    .await
}

/// 생성된 개인 키가 저장된 지문과 맞는지
pub(super) async fn download_private_key<C: ApplianceClient>(
    manager: &EntityManager<C>,
    provider: &CloudProvider,
) -> Result<(), CrudcheckError> {
    let keypair = KeyPairCollection::new(manager)
        .create(&random_name("kp"), provider, None, false)
        .await?;

    Fixture::guard(manager, keypair, |manager, keypair| {
        async move {
            let pem = KeyPairCollection::new(manager)
                .download_private_key(keypair)
                .await?;
            let downloaded = fingerprint_of(&private_key_public_blob(&pem)?);
            ensure(keypair.fingerprint.as_deref() == Some(downloaded.as_str()), || {
                format!(
                    "downloaded key {downloaded} does not match {:?}",
                    keypair.fingerprint
                )
            })?;
            Ok(())
        }
        .boxed()
    })
    .await
}

/// 원격 거부와 정확한 플래시 메시지를 기대합니다.
///
/// 생성이 받아들여졌다면 키 페어를 지운 뒤 실패로 보고합니다.
async fn expect_rejection<C: ApplianceClient>(
    manager: &EntityManager<C>,
    result: Result<KeyPair, CloudError>,
    expected: &str,
) -> Result<(), CrudcheckError> {
    match result {
        Ok(mut keypair) => {
            if keypair.lifecycle() == Lifecycle::Live {
                if let Err(err) = manager.delete(&mut keypair, true).await {
                    warn!(name = keypair.name(), error = %err, "failed to remove accepted key pair");
                }
            }
            Err(AssertionError::MissingRejection {
                expected: expected.to_owned(),
            }
            .into())
        }
        Err(err) => match err.rejection_message() {
            Some(message) => FlashMessage::error(message)
                .assert_message(expected)
                .map_err(Into::into),
            None => Err(err.into()),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crudcheck_appliance::SimulatedAppliance;
    use crudcheck_core::config::{ApplianceConfig, SessionConfig};
    use crudcheck_core::entity::EntityKind;

    use super::*;

    #[test]
    fn sample_key_is_parseable_rsa() {
        let key = PublicKey::parse(&sample_rsa_key()).unwrap();
        assert_eq!(key.algorithm().ssh_name(), "ssh-rsa");
        assert!(key.fingerprint().starts_with("SHA256:"));
    }

    #[test]
    fn truncated_key_does_not_parse() {
        assert!(PublicKey::parse(TRUNCATED_RSA_KEY).is_err());
    }

    fn manager() -> EntityManager<SimulatedAppliance> {
        let appliance = SimulatedAppliance::from_config(&ApplianceConfig::default())
            .expect("default appliance config should build");
        EntityManager::new(Arc::new(appliance), SessionConfig::default())
    }

    fn provider(kind: ProviderKind) -> CloudProvider {
        CloudProvider::all(&ApplianceConfig::default())
            .into_iter()
            .find(|p| p.kind == kind)
            .expect("default config registers both provider kinds")
    }

    #[tokio::test(start_paused = true)]
    async fn name_validation_passes_on_openstack() {
        let manager = manager();
        name_validation(&manager, &provider(ProviderKind::OpenStack))
            .await
            .unwrap();
        assert_eq!(manager.client().resource_count(EntityKind::KeyPair).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn accepted_create_is_removed_when_rejection_was_expected() {
        let manager = manager();
        let err = name_validation(&manager, &provider(ProviderKind::Ec2))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CrudcheckError::Assertion(AssertionError::MissingRejection { .. })
        ));
        assert_eq!(
            manager.client().resource_count(EntityKind::KeyPair).await,
            0,
            "key pair accepted by the appliance should be deleted"
        );
    }
}

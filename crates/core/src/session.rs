//! 업데이트 세션: 스냅샷, 변경, 검증을 한 스코프로 묶음
//!
//! [`UpdateSession`]은 `Live` 엔티티의 변경 가능한 필드를 스냅샷으로 잡고,
//! 작업용 초안(draft)에 변경을 모은 뒤 [`UpdateSession::commit`]에서 달라진
//! 필드만 원격으로 보냅니다.
//!
//! # 흐름
//! ```text
//! begin ──> draft_mut()/stage() ──> commit ──┬─ 변경 없음 ──> Unchanged (원격 호출 없음)
//!   │                                        └─ update 1회 ──> 재조회 검증 ──> Applied
//!   └──> abandon()/drop ──> 원격 호출 없음
//! ```
//!
//! 로컬 핸들은 원격 반영이 확인된 뒤에만 새 값으로 바뀝니다.

use metrics::counter;
use tracing::{debug, info, warn};

use crate::delta::UpdateDelta;
use crate::entity::{Entity, FieldSet};
use crate::error::{RemoteError, UpdateError};
use crate::manager::EntityManager;
use crate::metrics::{
    LABEL_KIND, UPDATES_COMMITTED_TOTAL, UPDATES_FAILED_TOTAL, UPDATES_UNCHANGED_TOTAL,
};
use crate::remote::ApplianceClient;

/// 초안에 적용할 변경 묶음
///
/// 각 도메인 크레이트의 타입별 패치 구조체와 `FnOnce(&mut E)` 클로저가
/// 구현합니다.
pub trait Patch<E: Entity> {
    /// 초안에 변경을 적용합니다.
    fn apply(self, draft: &mut E);
}

impl<E, F> Patch<E> for F
where
    E: Entity,
    F: FnOnce(&mut E),
{
    fn apply(self, draft: &mut E) {
        self(draft)
    }
}

/// 커밋 결과
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// 변경된 필드가 없어 원격 호출을 하지 않음
    Unchanged,
    /// 델타가 적용되고 (설정에 따라) 재조회로 확인됨
    Applied(UpdateDelta),
}

impl CommitOutcome {
    /// 원격 업데이트가 일어났는지
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// 적용된 델타 (없으면 `None`)
    pub fn delta(&self) -> Option<&UpdateDelta> {
        match self {
            Self::Applied(delta) => Some(delta),
            Self::Unchanged => None,
        }
    }
}

/// 단일 엔티티에 대한 업데이트 세션
///
/// [`EntityManager::update`]로 시작합니다. 커밋하지 않고 버리면
/// 원격 호출 없이 초안만 폐기됩니다.
pub struct UpdateSession<'a, C: ApplianceClient, E: Entity> {
    manager: &'a EntityManager<C>,
    entity: &'a mut E,
    baseline: FieldSet,
    snapshot: FieldSet,
    draft: E,
    finished: bool,
}

impl<'a, C: ApplianceClient, E: Entity> UpdateSession<'a, C, E> {
    /// 세션을 시작합니다. 호출 전에 핸들이 `Live`인지 확인되어 있어야 합니다.
    pub(crate) fn begin(
        manager: &'a EntityManager<C>,
        entity: &'a mut E,
    ) -> Result<Self, UpdateError> {
        let baseline = entity.fields().map_err(|e| snapshot_error::<E>(entity, e))?;
        let snapshot = baseline
            .iter()
            .filter(|(name, _)| E::MUTABLE_FIELDS.contains(&name.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let draft = entity.clone();

        debug!(
            kind = E::KIND.label(),
            name = entity.name(),
            "update session started"
        );

        Ok(Self {
            manager,
            entity,
            baseline,
            snapshot,
            draft,
            finished: false,
        })
    }

    /// 세션 시작 시점의 변경 가능 필드 스냅샷
    pub fn snapshot(&self) -> &FieldSet {
        &self.snapshot
    }

    /// 현재 초안
    pub fn draft(&self) -> &E {
        &self.draft
    }

    /// 초안을 직접 수정합니다.
    pub fn draft_mut(&mut self) -> &mut E {
        &mut self.draft
    }

    /// 패치를 초안에 적용합니다.
    pub fn stage<P: Patch<E>>(&mut self, patch: P) -> &mut Self {
        patch.apply(&mut self.draft);
        self
    }

    /// 스냅샷과 초안의 차이를 계산합니다.
    ///
    /// # Errors
    ///
    /// 허용 목록 밖의 필드가 바뀌었으면 [`UpdateError::ImmutableField`]
    pub fn delta(&self) -> Result<UpdateDelta, UpdateError> {
        let after = self
            .draft
            .fields()
            .map_err(|e| snapshot_error::<E>(&self.draft, e))?;
        let delta = UpdateDelta::between(&self.baseline, &after);

        if let Some(field) = delta
            .fields()
            .into_iter()
            .find(|field| !E::MUTABLE_FIELDS.contains(field))
        {
            return Err(UpdateError::ImmutableField {
                kind: E::KIND,
                field: field.to_owned(),
            });
        }

        Ok(delta)
    }

    /// 변경을 원격에 반영합니다.
    ///
    /// 변경이 없으면 원격 호출 없이 [`CommitOutcome::Unchanged`]를 반환합니다.
    /// 변경이 있으면 델타만 담은 업데이트를 정확히 한 번 보내고,
    /// `verify_updates`가 켜져 있으면 다시 읽어 각 필드를 확인합니다.
    ///
    /// # Errors
    ///
    /// - [`UpdateError::ImmutableField`]: 원격 호출 전에 발생
    /// - [`UpdateError::Rejected`]: 원격이 거부함 (메시지 원문 보존)
    /// - [`UpdateError::Unconfirmed`]: 원격은 성공했지만 재조회 값이 다름
    /// - [`UpdateError::Remote`]: 타임아웃, 전송 실패 등
    pub async fn commit(mut self) -> Result<CommitOutcome, UpdateError> {
        self.finished = true;
        let kind = E::KIND;
        let name = self.entity.name().to_owned();

        let delta = match self.delta() {
            Ok(delta) => delta,
            Err(e) => {
                counter!(UPDATES_FAILED_TOTAL, LABEL_KIND => kind.label()).increment(1);
                return Err(e);
            }
        };

        if delta.is_empty() {
            debug!(kind = kind.label(), name = name.as_str(), "no changes to commit");
            counter!(UPDATES_UNCHANGED_TOTAL, LABEL_KIND => kind.label()).increment(1);
            return Ok(CommitOutcome::Unchanged);
        }

        let fields = delta.fields().join(",");
        info!(
            kind = kind.label(),
            name = name.as_str(),
            fields = fields.as_str(),
            "committing update"
        );

        let result = self.push_and_verify(&name, &delta).await;
        match result {
            Ok(()) => {
                *self.entity = self.draft.clone();
                counter!(UPDATES_COMMITTED_TOTAL, LABEL_KIND => kind.label()).increment(1);
                info!(
                    kind = kind.label(),
                    name = name.as_str(),
                    fields = fields.as_str(),
                    "update committed"
                );
                Ok(CommitOutcome::Applied(delta))
            }
            Err(e) => {
                counter!(UPDATES_FAILED_TOTAL, LABEL_KIND => kind.label()).increment(1);
                warn!(
                    kind = kind.label(),
                    name = name.as_str(),
                    error = %e,
                    "update failed"
                );
                Err(e)
            }
        }
    }

    async fn push_and_verify(&self, name: &str, delta: &UpdateDelta) -> Result<(), UpdateError> {
        let kind = E::KIND;
        self.manager
            .remote_update(kind, name, delta)
            .await
            .map_err(|e| match e {
                RemoteError::Rejected(rejection) => UpdateError::Rejected {
                    kind,
                    name: name.to_owned(),
                    rejection,
                },
                other => UpdateError::Remote(other),
            })?;

        if !self.manager.config().verify_updates {
            return Ok(());
        }

        let record = self
            .manager
            .remote_read(kind, name)
            .await
            .map_err(UpdateError::Remote)?
            .ok_or_else(|| {
                UpdateError::Remote(RemoteError::NotFound {
                    kind,
                    name: name.to_owned(),
                })
            })?;

        let mismatches = delta.verify(&record.fields);
        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(UpdateError::Unconfirmed {
                kind,
                name: name.to_owned(),
                mismatches,
            })
        }
    }

    /// 원격 호출 없이 세션을 끝냅니다. 초안은 폐기됩니다.
    pub fn abandon(mut self) {
        self.finished = true;
        debug!(
            kind = E::KIND.label(),
            name = self.entity.name(),
            "update session abandoned"
        );
    }
}

impl<C: ApplianceClient, E: Entity> Drop for UpdateSession<'_, C, E> {
    fn drop(&mut self) {
        if !self.finished {
            debug!(
                kind = E::KIND.label(),
                name = self.entity.name(),
                "update session dropped without commit"
            );
        }
    }
}

fn snapshot_error<E: Entity>(entity: &E, err: RemoteError) -> UpdateError {
    UpdateError::Snapshot {
        kind: E::KIND,
        name: entity.name().to_owned(),
        reason: err.to_string(),
    }
}

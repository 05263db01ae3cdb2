//! 엔티티 매니저: 모든 원격 동작의 실행 지점
//!
//! [`EntityManager`]는 [`ApplianceClient`]를 감싸 생성, 조회, 삭제,
//! 업데이트 세션, 태그, 리소스별 동작을 수행합니다.
//!
//! - 모든 원격 호출에 `operation_timeout`을 적용합니다. 초과 시
//!   [`RemoteError::Timeout`]이며 재시도하지 않습니다.
//! - 삭제 대기와 실행 완료 대기는 `poll_interval`마다 폴링하며
//!   `wait_timeout`을 넘기면 실패합니다.
//! - 모든 호출은 `tracing` 필드와 `metrics` 카운터를 남깁니다.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use metrics::{counter, histogram};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::delta::UpdateDelta;
use crate::entity::{Entity, EntityKind, Lifecycle, Record};
use crate::error::{AssertionError, CrudcheckError, LifecycleError, RemoteError};
use crate::metrics::{
    LABEL_KIND, LABEL_OPERATION, LABEL_RESULT, REMOTE_CALL_DURATION_SECONDS, REMOTE_CALLS_TOTAL,
    REMOTE_TIMEOUTS_TOTAL,
};
use crate::remote::{ActionOutput, ApplianceClient, EntityAction};
use crate::session::{CommitOutcome, Patch, UpdateSession};
use crate::tag::Tag;
use crate::types::RunRecord;

/// 원격 동작 실행기
///
/// `C`는 `Arc`로 공유되므로 여러 매니저가 같은 클라이언트를 쓸 수 있습니다.
pub struct EntityManager<C: ApplianceClient> {
    client: Arc<C>,
    config: SessionConfig,
}

impl<C: ApplianceClient> EntityManager<C> {
    /// 새 매니저를 생성합니다.
    pub fn new(client: Arc<C>, config: SessionConfig) -> Self {
        Self { client, config }
    }

    /// 원격 클라이언트
    pub fn client(&self) -> &C {
        &self.client
    }

    /// 세션 설정
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// 원격 시스템 연결을 확인합니다.
    pub async fn ping(&self) -> Result<(), CrudcheckError> {
        self.call("ping", None, "", self.client.ping()).await?;
        Ok(())
    }

    /// 로컬 핸들로 원격 리소스를 생성합니다.
    ///
    /// 성공하면 핸들은 원격이 저장한 값(서버가 채운 필드 포함)으로 바뀌고
    /// `Live`가 됩니다. 거부되면 핸들은 `Local`로 남습니다.
    pub async fn create<E: Entity>(&self, entity: &mut E) -> Result<(), CrudcheckError> {
        match entity.lifecycle() {
            Lifecycle::Local => {}
            Lifecycle::Live => {
                return Err(LifecycleError::AlreadyCreated {
                    kind: E::KIND,
                    name: entity.name().to_owned(),
                }
                .into());
            }
            Lifecycle::Deleted => {
                return Err(LifecycleError::Stale {
                    kind: E::KIND,
                    name: entity.name().to_owned(),
                }
                .into());
            }
        }

        let record = entity.to_record()?;
        let stored = self
            .call(
                "create",
                Some(E::KIND),
                entity.name(),
                self.client.create(&record),
            )
            .await?;
        *entity = E::from_record(&stored)?;

        info!(kind = E::KIND.label(), name = entity.name(), "entity created");
        Ok(())
    }

    /// 원격 리소스가 현재 존재하는지 조회합니다.
    ///
    /// 핸들의 생명주기와 무관하게 항상 원격에 묻습니다.
    pub async fn exists<E: Entity>(&self, entity: &E) -> Result<bool, CrudcheckError> {
        let exists = self
            .call(
                "exists",
                Some(E::KIND),
                entity.name(),
                self.client.exists(E::KIND, entity.name()),
            )
            .await?;
        Ok(exists)
    }

    /// 리소스가 존재해야 함을 확인합니다.
    pub async fn assert_exists<E: Entity>(&self, entity: &E) -> Result<(), CrudcheckError> {
        self.assert_existence(entity, true).await
    }

    /// 리소스가 존재하지 않아야 함을 확인합니다.
    pub async fn assert_absent<E: Entity>(&self, entity: &E) -> Result<(), CrudcheckError> {
        self.assert_existence(entity, false).await
    }

    async fn assert_existence<E: Entity>(
        &self,
        entity: &E,
        expected: bool,
    ) -> Result<(), CrudcheckError> {
        if self.exists(entity).await? == expected {
            Ok(())
        } else {
            Err(AssertionError::Existence {
                kind: E::KIND,
                name: entity.name().to_owned(),
                expected,
            }
            .into())
        }
    }

    /// 원격 값으로 핸들을 갱신합니다.
    pub async fn refresh<E: Entity>(&self, entity: &mut E) -> Result<(), CrudcheckError> {
        entity.ensure_live()?;
        let record = self
            .remote_read(E::KIND, entity.name())
            .await?
            .ok_or_else(|| RemoteError::NotFound {
                kind: E::KIND,
                name: entity.name().to_owned(),
            })?;
        *entity = E::from_record(&record)?;
        Ok(())
    }

    /// 원격 리소스를 삭제합니다.
    ///
    /// `wait`가 참이면 `exists`가 거짓이 될 때까지 폴링합니다.
    /// 핸들은 즉시 `Deleted`가 되어 이후 변경에 쓸 수 없습니다.
    pub async fn delete<E: Entity>(&self, entity: &mut E, wait: bool) -> Result<(), CrudcheckError> {
        entity.ensure_live()?;
        self.call(
            "delete",
            Some(E::KIND),
            entity.name(),
            self.client.delete(E::KIND, entity.name()),
        )
        .await?;
        entity.set_lifecycle(Lifecycle::Deleted);
        info!(kind = E::KIND.label(), name = entity.name(), wait, "entity deleted");

        if wait {
            self.wait_until_gone(E::KIND, entity.name()).await?;
        }
        Ok(())
    }

    /// 리소스가 조회되지 않을 때까지 기다립니다.
    pub async fn wait_until_gone(&self, kind: EntityKind, name: &str) -> Result<(), CrudcheckError> {
        let deadline = Instant::now() + self.config.wait_timeout();
        loop {
            let exists = self
                .call("exists", Some(kind), name, self.client.exists(kind, name))
                .await?;
            if !exists {
                debug!(kind = kind.label(), name, "deletion visible");
                return Ok(());
            }
            if Instant::now() + self.config.poll_interval() > deadline {
                warn!(kind = kind.label(), name, "deletion not visible before wait timeout");
                return Err(RemoteError::Timeout {
                    operation: "wait_for_delete",
                    after: self.config.wait_timeout(),
                }
                .into());
            }
            tokio::time::sleep(self.config.poll_interval()).await;
        }
    }

    /// 업데이트 세션을 시작합니다.
    ///
    /// # Errors
    ///
    /// 핸들이 `Live`가 아니면 [`LifecycleError`]
    pub fn update<'a, E: Entity>(
        &'a self,
        entity: &'a mut E,
    ) -> Result<UpdateSession<'a, C, E>, CrudcheckError> {
        entity.ensure_live()?;
        Ok(UpdateSession::begin(self, entity)?)
    }

    /// 패치를 적용하고 커밋합니다.
    pub async fn update_with<E, P>(
        &self,
        entity: &mut E,
        patch: P,
    ) -> Result<CommitOutcome, CrudcheckError>
    where
        E: Entity,
        P: Patch<E>,
    {
        let mut session = self.update(entity)?;
        session.stage(patch);
        Ok(session.commit().await?)
    }

    /// 초안을 수정하는 함수를 실행하고 커밋합니다.
    ///
    /// `f`가 실패하면 원격 호출 없이 세션을 버리고 그 에러를 반환합니다.
    pub async fn try_update<E, F>(&self, entity: &mut E, f: F) -> Result<CommitOutcome, CrudcheckError>
    where
        E: Entity,
        F: FnOnce(&mut E) -> Result<(), CrudcheckError>,
    {
        let mut session = self.update(entity)?;
        if let Err(e) = f(session.draft_mut()) {
            session.abandon();
            return Err(e);
        }
        Ok(session.commit().await?)
    }

    /// 아직 할당되지 않은 첫 번째 카탈로그 태그를 할당하고 반환합니다.
    pub async fn add_tag<E: Entity>(&self, entity: &E) -> Result<Tag, CrudcheckError> {
        entity.ensure_live()?;
        let catalog = self
            .call("tag_catalog", None, "", self.client.tag_catalog())
            .await?;
        let assigned = self.tags(entity).await?;
        let tag = catalog
            .into_iter()
            .find(|tag| !assigned.contains(tag))
            .ok_or_else(|| {
                AssertionError::Failed(format!(
                    "no unassigned catalog tag left for {} \"{}\"",
                    E::KIND,
                    entity.name()
                ))
            })?;
        self.assign_tag(entity, &tag).await?;
        Ok(tag)
    }

    /// 지정한 태그를 할당합니다.
    pub async fn assign_tag<E: Entity>(&self, entity: &E, tag: &Tag) -> Result<(), CrudcheckError> {
        entity.ensure_live()?;
        self.call(
            "add_tag",
            Some(E::KIND),
            entity.name(),
            self.client.add_tag(E::KIND, entity.name(), tag),
        )
        .await?;
        info!(kind = E::KIND.label(), name = entity.name(), tag = %tag, "tag assigned");
        Ok(())
    }

    /// 할당된 태그 목록
    pub async fn tags<E: Entity>(&self, entity: &E) -> Result<BTreeSet<Tag>, CrudcheckError> {
        entity.ensure_live()?;
        let tags = self
            .call(
                "tags",
                Some(E::KIND),
                entity.name(),
                self.client.tags(E::KIND, entity.name()),
            )
            .await?;
        Ok(tags)
    }

    /// 태그를 제거합니다.
    pub async fn remove_tag<E: Entity>(&self, entity: &E, tag: &Tag) -> Result<(), CrudcheckError> {
        entity.ensure_live()?;
        self.call(
            "remove_tag",
            Some(E::KIND),
            entity.name(),
            self.client.remove_tag(E::KIND, entity.name(), tag),
        )
        .await?;
        info!(kind = E::KIND.label(), name = entity.name(), tag = %tag, "tag removed");
        Ok(())
    }

    /// 리소스별 동작을 수행합니다.
    pub async fn perform<E: Entity>(
        &self,
        entity: &E,
        action: EntityAction,
    ) -> Result<ActionOutput, CrudcheckError> {
        entity.ensure_live()?;
        let output = self
            .call(
                action.as_str(),
                Some(E::KIND),
                entity.name(),
                self.client.perform(E::KIND, entity.name(), action),
            )
            .await?;
        Ok(output)
    }

    /// 지정한 실행이 끝날 때까지 실행 목록을 폴링합니다.
    pub async fn wait_for_run<E: Entity>(
        &self,
        entity: &E,
        run_id: &str,
    ) -> Result<RunRecord, CrudcheckError> {
        let deadline = Instant::now() + self.config.wait_timeout();
        loop {
            let runs = match self.perform(entity, EntityAction::ListRuns).await? {
                ActionOutput::Runs(runs) => runs,
                other => {
                    return Err(RemoteError::Serialization(format!(
                        "unexpected output for list_runs: {other:?}"
                    ))
                    .into());
                }
            };
            if let Some(run) = runs.into_iter().find(|run| run.id == run_id) {
                if run.is_finished() {
                    debug!(kind = E::KIND.label(), name = entity.name(), run_id, "run finished");
                    return Ok(run);
                }
            }
            if Instant::now() + self.config.poll_interval() > deadline {
                return Err(RemoteError::Timeout {
                    operation: "wait_for_run",
                    after: self.config.wait_timeout(),
                }
                .into());
            }
            tokio::time::sleep(self.config.poll_interval()).await;
        }
    }

    pub(crate) async fn remote_update(
        &self,
        kind: EntityKind,
        name: &str,
        delta: &UpdateDelta,
    ) -> Result<(), RemoteError> {
        self.call("update", Some(kind), name, self.client.update(kind, name, delta))
            .await
    }

    pub(crate) async fn remote_read(
        &self,
        kind: EntityKind,
        name: &str,
    ) -> Result<Option<Record>, RemoteError> {
        self.call("read", Some(kind), name, self.client.read(kind, name))
            .await
    }

    /// 제한 시간, 로그, 메트릭을 적용해 원격 호출을 실행합니다.
    async fn call<T>(
        &self,
        operation: &'static str,
        kind: Option<EntityKind>,
        name: &str,
        fut: impl Future<Output = Result<T, RemoteError>>,
    ) -> Result<T, RemoteError> {
        let kind_label = kind.map_or("none", |k| k.label());
        let timeout = self.config.operation_timeout();
        let started = Instant::now();

        let result = match tokio::time::timeout(timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                counter!(REMOTE_TIMEOUTS_TOTAL, LABEL_OPERATION => operation).increment(1);
                Err(RemoteError::Timeout {
                    operation,
                    after: timeout,
                })
            }
        };

        histogram!(REMOTE_CALL_DURATION_SECONDS, LABEL_OPERATION => operation)
            .record(started.elapsed().as_secs_f64());
        let outcome = if result.is_ok() { "success" } else { "failure" };
        counter!(
            REMOTE_CALLS_TOTAL,
            LABEL_OPERATION => operation,
            LABEL_KIND => kind_label,
            LABEL_RESULT => outcome,
        )
        .increment(1);

        match &result {
            Ok(_) => debug!(operation, kind = kind_label, name, "remote call succeeded"),
            Err(e) => debug!(operation, kind = kind_label, name, error = %e, "remote call failed"),
        }
        result
    }
}

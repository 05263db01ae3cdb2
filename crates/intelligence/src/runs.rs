//! 리포트/스케줄 실행
//!
//! 큐에 넣은 실행은 어플라이언스에서 비동기로 진행됩니다.
//! `wait_for_finish`이면 [`EntityManager::wait_for_run`]으로 완료까지 폴링합니다.

use tracing::info;

use crudcheck_core::entity::Entity;
use crudcheck_core::manager::EntityManager;
use crudcheck_core::remote::{ActionOutput, ApplianceClient, EntityAction};
use crudcheck_core::types::RunRecord;

use crate::error::IntelligenceError;

/// 큐에 넣을 수 있는 엔티티 (리포트, 스케줄)
pub trait Runnable: Entity {}

/// 실행 큐 동작
pub struct Runs<'a, C: ApplianceClient> {
    manager: &'a EntityManager<C>,
}

impl<'a, C: ApplianceClient> Runs<'a, C> {
    /// 매니저를 통해 실행 큐에 접근합니다.
    pub fn new(manager: &'a EntityManager<C>) -> Self {
        Self { manager }
    }

    /// 실행을 큐에 넣습니다. `wait_for_finish`이면 완료된 실행을 반환합니다.
    pub async fn queue<E: Runnable>(
        &self,
        entity: &E,
        wait_for_finish: bool,
    ) -> Result<RunRecord, IntelligenceError> {
        let run = match self.manager.perform(entity, EntityAction::Queue).await? {
            ActionOutput::Queued(run) => run,
            other => return Err(unexpected(entity, EntityAction::Queue, &other)),
        };
        info!(
            kind = E::KIND.label(),
            name = entity.name(),
            run_id = run.id.as_str(),
            "run queued"
        );

        if !wait_for_finish {
            return Ok(run);
        }
        Ok(self.manager.wait_for_run(entity, &run.id).await?)
    }

    /// 모든 실행 (진행 중 포함)
    pub async fn runs<E: Runnable>(&self, entity: &E) -> Result<Vec<RunRecord>, IntelligenceError> {
        match self.manager.perform(entity, EntityAction::ListRuns).await? {
            ActionOutput::Runs(runs) => Ok(runs),
            other => Err(unexpected(entity, EntityAction::ListRuns, &other)),
        }
    }

    /// 완료되어 결과가 저장된 실행
    ///
    /// # Errors
    ///
    /// 완료된 실행이 없으면 [`IntelligenceError::NoSavedRuns`]
    pub async fn saved_runs<E: Runnable>(
        &self,
        entity: &E,
    ) -> Result<Vec<RunRecord>, IntelligenceError> {
        let saved: Vec<RunRecord> = self
            .runs(entity)
            .await?
            .into_iter()
            .filter(RunRecord::is_finished)
            .collect();
        if saved.is_empty() {
            return Err(IntelligenceError::NoSavedRuns {
                kind: E::KIND,
                name: entity.name().to_owned(),
            });
        }
        Ok(saved)
    }
}

fn unexpected<E: Entity>(entity: &E, action: EntityAction, output: &ActionOutput) -> IntelligenceError {
    IntelligenceError::UnexpectedOutput {
        action: action.as_str(),
        kind: E::KIND,
        name: entity.name().to_owned(),
        detail: format!("{output:?}"),
    }
}

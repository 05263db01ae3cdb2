//! 통합 테스트 -- 업데이트 세션과 시뮬레이션 어플라이언스
//!
//! EntityManager → SimulatedAppliance 경로로 생성, 업데이트, 삭제를 실행하고
//! 호출 기록으로 원격 트래픽을 확인합니다.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde::{Deserialize, Serialize};

use crudcheck_appliance::{FaultPlan, SimulatedAppliance};
use crudcheck_core::config::{ApplianceConfig, SessionConfig};
use crudcheck_core::entity::{Entity, EntityKind, Lifecycle};
use crudcheck_core::error::{AssertionError, CrudcheckError, RejectionCode, RemoteError, UpdateError};
use crudcheck_core::fixture::Fixture;
use crudcheck_core::manager::EntityManager;
use crudcheck_core::session::CommitOutcome;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Board {
    name: String,
    group: String,
    title: String,
    locked: bool,
    widgets: Vec<String>,
    #[serde(skip)]
    lifecycle: Lifecycle,
}

impl Board {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            group: "EvmGroup-administrator".to_owned(),
            title: "Operations".to_owned(),
            locked: false,
            widgets: vec!["Top CPU Consumers (weekly)".to_owned()],
            lifecycle: Lifecycle::Local,
        }
    }
}

impl Entity for Board {
    const KIND: EntityKind = EntityKind::Dashboard;
    const MUTABLE_FIELDS: &'static [&'static str] = &["title", "locked", "widgets"];

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

fn manager_with(session: SessionConfig) -> EntityManager<SimulatedAppliance> {
    let appliance = SimulatedAppliance::from_config(&ApplianceConfig::default())
        .expect("default appliance config should build");
    EntityManager::new(Arc::new(appliance), session)
}

fn manager() -> EntityManager<SimulatedAppliance> {
    manager_with(SessionConfig::default())
}

#[tokio::test]
async fn unchanged_commit_sends_no_update() {
    let manager = manager();
    let mut board = Board::new("unchanged");
    manager.create(&mut board).await.unwrap();

    let mut session = manager.update(&mut board).unwrap();
    session.draft_mut().title = "Operations".to_owned();
    let outcome = session.commit().await.unwrap();

    assert_eq!(outcome, CommitOutcome::Unchanged);
    assert_eq!(manager.client().call_log().await.count("update"), 0);
}

#[tokio::test]
async fn applied_commit_sends_only_changed_fields() {
    let manager = manager();
    let mut board = Board::new("applied");
    manager.create(&mut board).await.unwrap();

    let outcome = manager
        .update_with(&mut board, |b: &mut Board| {
            b.locked = true;
            b.widgets.push("Guest OS Information".to_owned());
        })
        .await
        .unwrap();

    assert!(outcome.is_applied());
    assert!(board.locked);
    assert_eq!(board.widgets.len(), 2);
    assert_eq!(
        manager
            .client()
            .call_log()
            .await
            .updates_for(EntityKind::Dashboard, "applied"),
        vec![vec!["locked".to_owned(), "widgets".to_owned()]]
    );
}

#[tokio::test]
async fn dropped_update_is_unconfirmed_and_handle_keeps_old_values() {
    let manager = manager();
    let mut board = Board::new("dropped");
    manager.create(&mut board).await.unwrap();
    manager.client().set_faults(FaultPlan::drop_updates()).await;

    let err = manager
        .update_with(&mut board, |b: &mut Board| b.title = "Renamed".to_owned())
        .await
        .unwrap_err();

    match err {
        CrudcheckError::Update(UpdateError::Unconfirmed { mismatches, .. }) => {
            assert_eq!(mismatches.len(), 1);
            assert_eq!(mismatches[0].field, "title");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(board.title, "Operations");
}

#[tokio::test]
async fn rejected_update_keeps_message_verbatim() {
    let manager = manager();
    let mut board = Board::new("rejected");
    manager.create(&mut board).await.unwrap();
    manager
        .client()
        .set_faults(FaultPlan::reject_updates("Title is reserved"))
        .await;

    let err = manager
        .update_with(&mut board, |b: &mut Board| b.title = "Reserved".to_owned())
        .await
        .unwrap_err();

    let rejection = err.rejection().expect("update should be rejected");
    assert_eq!(
        rejection.message,
        "Unable to update Dashboard \"rejected\": Title is reserved"
    );
    assert_eq!(board.title, "Operations");
}

#[tokio::test]
async fn validation_rejection_is_atomic() {
    let manager = manager();
    let mut board = Board::new("atomic");
    manager.create(&mut board).await.unwrap();

    let err = manager
        .update_with(&mut board, |b: &mut Board| {
            b.locked = true;
            b.widgets.clear();
        })
        .await
        .unwrap_err();

    let rejection = err.rejection().expect("update should be rejected");
    assert_eq!(rejection.code, RejectionCode::InvalidField);

    manager.refresh(&mut board).await.unwrap();
    assert!(!board.locked);
    assert_eq!(board.widgets.len(), 1);
}

#[tokio::test]
async fn immutable_field_edit_never_reaches_the_appliance() {
    let manager = manager();
    let mut board = Board::new("immutable");
    manager.create(&mut board).await.unwrap();

    let err = manager
        .update_with(&mut board, |b: &mut Board| b.group = "EvmGroup-user".to_owned())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CrudcheckError::Update(UpdateError::ImmutableField { ref field, .. }) if field == "group"
    ));
    assert_eq!(manager.client().call_log().await.count("update"), 0);
}

#[tokio::test(start_paused = true)]
async fn stalled_appliance_times_out_without_retry() {
    let manager = manager_with(SessionConfig {
        operation_timeout_secs: 1,
        ..SessionConfig::default()
    });
    let mut board = Board::new("stalled");
    manager.create(&mut board).await.unwrap();
    manager
        .client()
        .set_faults(FaultPlan::stall(Duration::from_secs(5)))
        .await;

    let err = manager
        .update_with(&mut board, |b: &mut Board| b.locked = true)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CrudcheckError::Update(UpdateError::Remote(RemoteError::Timeout { .. }))
    ));
    assert_eq!(manager.client().call_log().await.count("update"), 1);
}

#[tokio::test(start_paused = true)]
async fn delete_with_wait_polls_until_gone() {
    let manager = manager();
    let mut board = Board::new("deleted");
    manager.create(&mut board).await.unwrap();

    manager.delete(&mut board, true).await.unwrap();

    assert_eq!(board.lifecycle(), Lifecycle::Deleted);
    assert!(!manager.exists(&board).await.unwrap());
    assert!(manager.client().call_log().await.count("exists") >= 2);
}

#[tokio::test(start_paused = true)]
async fn fixture_tears_down_after_failing_body() {
    let manager = manager();

    let result = Fixture::scoped(&manager, Board::new("scoped"), |_, board| {
        async move {
            board.title = "local only".to_owned();
            Err::<(), _>(CrudcheckError::from(AssertionError::Failed(
                "body failed".to_owned(),
            )))
        }
        .boxed()
    })
    .await;

    assert!(matches!(result, Err(CrudcheckError::Assertion(_))));
    let log = manager.client().call_log().await;
    assert_eq!(log.count_for("delete", EntityKind::Dashboard, "scoped"), 1);

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(manager.client().resource_count(EntityKind::Dashboard).await, 0);
}

#[tokio::test]
async fn stale_handle_cannot_be_updated() {
    let manager = manager();
    let mut board = Board::new("stale");
    manager.create(&mut board).await.unwrap();
    manager.delete(&mut board, false).await.unwrap();

    assert!(matches!(
        manager.update(&mut board),
        Err(CrudcheckError::Lifecycle(_))
    ));
}

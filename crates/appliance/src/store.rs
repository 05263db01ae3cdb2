//! 시뮬레이터 저장소
//!
//! 삭제는 즉시 반영되지 않습니다. `deleted_at` 시각이 지나야 조회에서
//! 사라지며, 그 전까지는 삭제 대기 상태입니다.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use tokio::time::Instant;

use crudcheck_core::entity::{EntityKind, Record};
use crudcheck_core::tag::Tag;
use crudcheck_core::types::{RunRecord, RunStatus};

/// 완료된 실행이 만드는 결과 행 수
const RUN_RESULT_ROWS: usize = 3;

/// 큐에 들어간 실행
#[derive(Debug, Clone)]
pub(crate) struct StoredRun {
    pub id: String,
    pub queued_at: Instant,
    pub columns: Vec<String>,
}

impl StoredRun {
    /// `now` 시점의 실행 상태
    ///
    /// `run_delay`의 절반이 지나면 Running, 전부 지나면 Finished 입니다.
    pub fn observe(&self, now: Instant, run_delay: Duration) -> RunRecord {
        let elapsed = now.saturating_duration_since(self.queued_at);
        let status = if elapsed >= run_delay {
            RunStatus::Finished
        } else if elapsed >= run_delay / 2 {
            RunStatus::Running
        } else {
            RunStatus::Queued
        };

        let rows = if status == RunStatus::Finished {
            (1..=RUN_RESULT_ROWS)
                .map(|row| {
                    self.columns
                        .iter()
                        .map(|column| format!("{column} {row}"))
                        .collect()
                })
                .collect()
        } else {
            Vec::new()
        };

        RunRecord {
            id: self.id.clone(),
            status,
            columns: self.columns.clone(),
            rows,
        }
    }
}

/// 저장된 리소스
#[derive(Debug, Clone)]
pub(crate) struct StoredResource {
    pub record: Record,
    pub tags: BTreeSet<Tag>,
    /// 어플라이언스가 생성한 키 페어의 개인 키
    pub private_key: Option<String>,
    pub runs: Vec<StoredRun>,
    pub deleted_at: Option<Instant>,
}

impl StoredResource {
    pub fn new(record: Record) -> Self {
        Self {
            record,
            tags: BTreeSet::new(),
            private_key: None,
            runs: Vec::new(),
            deleted_at: None,
        }
    }

    /// `now` 시점에 조회되는지
    pub fn is_visible(&self, now: Instant) -> bool {
        self.deleted_at.is_none_or(|at| now < at)
    }

    /// 삭제 요청을 받았는지 (아직 보이더라도)
    pub fn is_pending_delete(&self) -> bool {
        self.deleted_at.is_some()
    }
}

type Key = (EntityKind, String);

/// 종류와 이름으로 색인된 리소스 목록
#[derive(Debug, Default)]
pub(crate) struct Store {
    resources: BTreeMap<Key, StoredResource>,
}

impl Store {
    /// 삭제 시각이 지난 리소스를 제거합니다.
    pub fn purge(&mut self, now: Instant) {
        self.resources.retain(|_, resource| resource.is_visible(now));
    }

    /// 삭제 대기 중인 것까지 포함해 이름이 점유되어 있는지
    pub fn is_taken(&self, kind: EntityKind, name: &str) -> bool {
        self.resources.contains_key(&(kind, name.to_owned()))
    }

    pub fn insert(&mut self, resource: StoredResource) {
        let key = (resource.record.kind, resource.record.name.clone());
        self.resources.insert(key, resource);
    }

    /// 조회 가능한 리소스
    pub fn get(&self, kind: EntityKind, name: &str) -> Option<&StoredResource> {
        self.resources.get(&(kind, name.to_owned()))
    }

    pub fn get_mut(&mut self, kind: EntityKind, name: &str) -> Option<&mut StoredResource> {
        self.resources.get_mut(&(kind, name.to_owned()))
    }

    /// 종류별 리소스 수 (삭제 대기 포함)
    pub fn count(&self, kind: EntityKind) -> usize {
        self.resources.keys().filter(|(k, _)| *k == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use crudcheck_core::entity::FieldSet;

    use super::*;

    fn resource(name: &str) -> StoredResource {
        StoredResource::new(Record::new(EntityKind::Dashboard, name, FieldSet::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn pending_delete_stays_visible_until_deadline() {
        let mut store = Store::default();
        let mut d1 = resource("d1");
        let now = Instant::now();
        d1.deleted_at = Some(now + Duration::from_millis(200));
        store.insert(d1);

        store.purge(now);
        assert!(store.get(EntityKind::Dashboard, "d1").is_some());
        assert!(store.is_taken(EntityKind::Dashboard, "d1"));

        tokio::time::advance(Duration::from_millis(200)).await;
        store.purge(Instant::now());
        assert!(store.get(EntityKind::Dashboard, "d1").is_none());
        assert_eq!(store.count(EntityKind::Dashboard), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn run_progresses_to_finished() {
        let run = StoredRun {
            id: "r1".to_owned(),
            queued_at: Instant::now(),
            columns: vec!["Name".to_owned(), "Vendor".to_owned()],
        };
        let delay = Duration::from_millis(500);

        assert_eq!(run.observe(Instant::now(), delay).status, RunStatus::Queued);
        tokio::time::advance(Duration::from_millis(250)).await;
        assert_eq!(run.observe(Instant::now(), delay).status, RunStatus::Running);
        tokio::time::advance(Duration::from_millis(250)).await;

        let finished = run.observe(Instant::now(), delay);
        assert!(finished.is_finished());
        assert_eq!(finished.rows.len(), RUN_RESULT_ROWS);
        assert_eq!(finished.rows[0], vec!["Name 1".to_owned(), "Vendor 1".to_owned()]);
    }
}

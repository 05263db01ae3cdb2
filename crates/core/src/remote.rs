//! Remote appliance abstraction.
//!
//! Every call into the application under test goes through [`ApplianceClient`].
//! The simulated appliance (`crudcheck-appliance`) implements it for in-process
//! runs; unit tests in this crate use `MockApplianceClient`.
//!
//! ```text
//!   EntityManager ──> ApplianceClient (trait)
//!                        │           │
//!                        ▼           ▼
//!              SimulatedAppliance   Mock
//! ```
//!
//! # Contract
//!
//! - `update` is atomic: it applies every field of the delta or none of them.
//! - Rejections carry the remote message verbatim in [`Rejection::message`].
//! - `exists` and `read` always query the remote state; nothing is cached.
//!
//! [`Rejection::message`]: crate::error::Rejection::message

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::delta::UpdateDelta;
use crate::entity::{EntityKind, Record};
use crate::error::RemoteError;
use crate::tag::Tag;
use crate::types::RunRecord;

/// Resource-specific action beyond CRUD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityAction {
    /// Download the private half of a key pair generated by the appliance.
    DownloadPrivateKey,
    /// Queue a report or schedule for execution.
    Queue,
    /// List the runs (saved reports) of a report or schedule.
    ListRuns,
}

impl EntityAction {
    /// Fixed name for log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DownloadPrivateKey => "download_private_key",
            Self::Queue => "queue",
            Self::ListRuns => "list_runs",
        }
    }
}

impl fmt::Display for EntityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an [`EntityAction`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutput {
    /// OpenSSH private key text.
    PrivateKey(String),
    /// The run that was just queued.
    Queued(RunRecord),
    /// All runs, oldest first.
    Runs(Vec<RunRecord>),
}

/// Trait abstracting the application under test.
///
/// The trait is `Send + Sync + 'static` so a client can be shared behind an `Arc`.
///
/// # Errors
///
/// - [`RemoteError::Rejected`]: the appliance refused the operation
/// - [`RemoteError::NotFound`]: the addressed resource does not exist
/// - [`RemoteError::Transport`]: the appliance could not be reached
pub trait ApplianceClient: Send + Sync + 'static {
    /// Creates a resource and returns the stored record.
    ///
    /// The stored record may carry fields populated by the appliance
    /// (e.g. a key pair fingerprint).
    fn create(&self, record: &Record) -> impl Future<Output = Result<Record, RemoteError>> + Send;

    /// Reads a resource. `Ok(None)` when it does not exist.
    fn read(
        &self,
        kind: EntityKind,
        name: &str,
    ) -> impl Future<Output = Result<Option<Record>, RemoteError>> + Send;

    /// Applies a partial update containing exactly the fields of `delta`.
    fn update(
        &self,
        kind: EntityKind,
        name: &str,
        delta: &UpdateDelta,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Deletes a resource. Removal may become visible after a delay.
    fn delete(
        &self,
        kind: EntityKind,
        name: &str,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Queries whether a resource currently exists.
    fn exists(
        &self,
        kind: EntityKind,
        name: &str,
    ) -> impl Future<Output = Result<bool, RemoteError>> + Send;

    /// Lists the tags the appliance knows about.
    fn tag_catalog(&self) -> impl Future<Output = Result<Vec<Tag>, RemoteError>> + Send;

    /// Lists the tags assigned to a resource.
    fn tags(
        &self,
        kind: EntityKind,
        name: &str,
    ) -> impl Future<Output = Result<BTreeSet<Tag>, RemoteError>> + Send;

    /// Assigns a catalog tag to a resource.
    fn add_tag(
        &self,
        kind: EntityKind,
        name: &str,
        tag: &Tag,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Removes a tag from a resource.
    fn remove_tag(
        &self,
        kind: EntityKind,
        name: &str,
        tag: &Tag,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Performs a resource-specific action.
    fn perform(
        &self,
        kind: EntityKind,
        name: &str,
        action: EntityAction,
    ) -> impl Future<Output = Result<ActionOutput, RemoteError>> + Send;

    /// Checks connectivity.
    fn ping(&self) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

/// In-memory client for unit tests.
///
/// Records every call so tests can assert on the exact remote traffic.
#[cfg(test)]
#[derive(Default)]
pub struct MockApplianceClient {
    /// Stored records.
    pub records: std::sync::Mutex<std::collections::BTreeMap<(EntityKind, String), Record>>,
    /// Assigned tags.
    pub assigned: std::sync::Mutex<BTreeSet<(EntityKind, String, Tag)>>,
    /// Every call as `"op kind name"`.
    pub calls: std::sync::Mutex<Vec<String>>,
    /// Every delta passed to `update`.
    pub updates: std::sync::Mutex<Vec<UpdateDelta>>,
    /// Accept updates without applying them.
    pub drop_updates: bool,
    /// Reject every update with this rejection.
    pub reject_updates: Option<crate::error::Rejection>,
    /// Sleep this long inside every call.
    pub stall: Option<std::time::Duration>,
    /// Tag catalog.
    pub catalog: Vec<Tag>,
}

#[cfg(test)]
impl MockApplianceClient {
    pub fn new() -> Self {
        Self {
            catalog: vec![Tag::new("Department", "Engineering"), Tag::new("Location", "Brno")],
            ..Self::default()
        }
    }

    pub fn with_dropped_updates(mut self) -> Self {
        self.drop_updates = true;
        self
    }

    pub fn with_rejected_updates(mut self, message: &str) -> Self {
        self.reject_updates = Some(crate::error::Rejection::new(
            crate::error::RejectionCode::InvalidField,
            message,
        ));
        self
    }

    pub fn with_stall(mut self, stall: std::time::Duration) -> Self {
        self.stall = Some(stall);
        self
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.split(' ').next() == Some(op))
            .count()
    }

    async fn enter(&self, op: &str, kind: Option<EntityKind>, name: &str) {
        let entry = match kind {
            Some(kind) => format!("{op} {} {name}", kind.label()),
            None => op.to_owned(),
        };
        self.calls.lock().unwrap().push(entry);
        if let Some(stall) = self.stall {
            tokio::time::sleep(stall).await;
        }
    }
}

#[cfg(test)]
impl ApplianceClient for MockApplianceClient {
    async fn create(&self, record: &Record) -> Result<Record, RemoteError> {
        self.enter("create", Some(record.kind), &record.name).await;
        let key = (record.kind, record.name.clone());
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&key) {
            return Err(RemoteError::Rejected(crate::error::Rejection::new(
                crate::error::RejectionCode::Duplicate,
                "Name has already been taken",
            )));
        }
        records.insert(key, record.clone());
        Ok(record.clone())
    }

    async fn read(&self, kind: EntityKind, name: &str) -> Result<Option<Record>, RemoteError> {
        self.enter("read", Some(kind), name).await;
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&(kind, name.to_owned()))
            .cloned())
    }

    async fn update(
        &self,
        kind: EntityKind,
        name: &str,
        delta: &UpdateDelta,
    ) -> Result<(), RemoteError> {
        self.enter("update", Some(kind), name).await;
        self.updates.lock().unwrap().push(delta.clone());
        if let Some(rejection) = &self.reject_updates {
            return Err(RemoteError::Rejected(rejection.clone()));
        }
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(&(kind, name.to_owned()))
            .ok_or_else(|| RemoteError::NotFound {
                kind,
                name: name.to_owned(),
            })?;
        if !self.drop_updates {
            delta.apply_to(&mut record.fields);
        }
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, name: &str) -> Result<(), RemoteError> {
        self.enter("delete", Some(kind), name).await;
        self.records
            .lock()
            .unwrap()
            .remove(&(kind, name.to_owned()))
            .map(|_| ())
            .ok_or_else(|| RemoteError::NotFound {
                kind,
                name: name.to_owned(),
            })
    }

    async fn exists(&self, kind: EntityKind, name: &str) -> Result<bool, RemoteError> {
        self.enter("exists", Some(kind), name).await;
        Ok(self
            .records
            .lock()
            .unwrap()
            .contains_key(&(kind, name.to_owned())))
    }

    async fn tag_catalog(&self) -> Result<Vec<Tag>, RemoteError> {
        self.enter("tag_catalog", None, "").await;
        Ok(self.catalog.clone())
    }

    async fn tags(&self, kind: EntityKind, name: &str) -> Result<BTreeSet<Tag>, RemoteError> {
        self.enter("tags", Some(kind), name).await;
        Ok(self
            .assigned
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, n, _)| *k == kind && n == name)
            .map(|(_, _, tag)| tag.clone())
            .collect())
    }

    async fn add_tag(&self, kind: EntityKind, name: &str, tag: &Tag) -> Result<(), RemoteError> {
        self.enter("add_tag", Some(kind), name).await;
        self.assigned
            .lock()
            .unwrap()
            .insert((kind, name.to_owned(), tag.clone()));
        Ok(())
    }

    async fn remove_tag(&self, kind: EntityKind, name: &str, tag: &Tag) -> Result<(), RemoteError> {
        self.enter("remove_tag", Some(kind), name).await;
        self.assigned
            .lock()
            .unwrap()
            .remove(&(kind, name.to_owned(), tag.clone()));
        Ok(())
    }

    async fn perform(
        &self,
        kind: EntityKind,
        name: &str,
        action: EntityAction,
    ) -> Result<ActionOutput, RemoteError> {
        self.enter("perform", Some(kind), name).await;
        match action {
            EntityAction::ListRuns => Ok(ActionOutput::Runs(Vec::new())),
            other => Err(RemoteError::Rejected(crate::error::Rejection::new(
                crate::error::RejectionCode::Unsupported,
                format!("{other} is not supported by the mock"),
            ))),
        }
    }

    async fn ping(&self) -> Result<(), RemoteError> {
        self.enter("ping", None, "").await;
        Ok(())
    }
}

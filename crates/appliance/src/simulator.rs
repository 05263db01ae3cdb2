//! 시뮬레이션 어플라이언스
//!
//! [`SimulatedAppliance`]는 [`ApplianceClient`]를 프로세스 내에서 구현합니다.
//! 모든 호출은 [`CallLog`]에 기록되고, [`FaultPlan`]에 따라 장애가 주입됩니다.
//!
//! # 사용 예시
//! ```ignore
//! let appliance = SimulatedAppliance::from_config(&config.appliance)?;
//! let manager = EntityManager::new(Arc::new(appliance), config.session.clone());
//! ```

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crudcheck_cloud::sshkey::generate_ed25519;
use crudcheck_core::config::ApplianceConfig;
use crudcheck_core::delta::UpdateDelta;
use crudcheck_core::entity::{EntityKind, Record};
use crudcheck_core::error::{Rejection, RejectionCode, RemoteError};
use crudcheck_core::remote::{ActionOutput, ApplianceClient, EntityAction};
use crudcheck_core::tag::Tag;
use crudcheck_core::types::ProviderKind;

use crate::call_log::{CallLog, CallRecord};
use crate::error::ApplianceError;
use crate::faults::FaultPlan;
use crate::store::{Store, StoredResource, StoredRun};
use crate::validation::{self, Refusal, str_list, unable};

/// 시뮬레이터 내부 상태
#[derive(Debug, Default)]
struct State {
    store: Store,
    faults: FaultPlan,
    calls: CallLog,
}

/// 프로세스 내 어플라이언스
pub struct SimulatedAppliance {
    providers: HashMap<String, ProviderKind>,
    catalog: Vec<Tag>,
    delete_delay: Duration,
    run_delay: Duration,
    state: Mutex<State>,
}

impl SimulatedAppliance {
    /// 새 빌더를 생성합니다.
    pub fn builder() -> SimulatedApplianceBuilder {
        SimulatedApplianceBuilder::new()
    }

    /// `[appliance]` 설정으로 생성합니다.
    pub fn from_config(config: &ApplianceConfig) -> Result<Self, ApplianceError> {
        SimulatedApplianceBuilder::from_config(config)?.build()
    }

    /// 장애 계획을 교체합니다.
    pub async fn set_faults(&self, faults: FaultPlan) {
        if faults.is_active() {
            warn!(?faults, "fault injection enabled");
        }
        self.state.lock().await.faults = faults;
    }

    /// 지금까지의 호출 기록 복사본
    pub async fn call_log(&self) -> CallLog {
        self.state.lock().await.calls.clone()
    }

    /// 호출 기록을 비웁니다.
    pub async fn clear_call_log(&self) {
        self.state.lock().await.calls.clear();
    }

    /// 종류별 저장된 리소스 수 (삭제 대기 포함)
    pub async fn resource_count(&self, kind: EntityKind) -> usize {
        let mut state = self.state.lock().await;
        state.store.purge(Instant::now());
        state.store.count(kind)
    }

    /// 등록된 프로바이더 종류
    pub fn provider_kind(&self, name: &str) -> Option<ProviderKind> {
        self.providers.get(name).copied()
    }

    /// 호출을 기록하고 장애를 적용한 뒤 상태 잠금을 돌려줍니다.
    async fn enter(
        &self,
        operation: &str,
        kind: Option<EntityKind>,
        name: &str,
        fields: Vec<String>,
    ) -> Result<(MutexGuard<'_, State>, FaultPlan), RemoteError> {
        let faults = {
            let mut state = self.state.lock().await;
            state.calls.push(CallRecord {
                operation: operation.to_owned(),
                kind,
                name: name.to_owned(),
                fields,
            });
            state.faults.clone()
        };

        if faults.offline {
            return Err(RemoteError::Transport(format!(
                "appliance is offline ({operation})"
            )));
        }
        if faults.fail_reads && operation == "read" {
            return Err(RemoteError::Transport("read failed".to_owned()));
        }
        if let Some(stall) = faults.stall {
            debug!(operation, ?stall, "stalling call");
            tokio::time::sleep(stall).await;
        }

        let mut state = self.state.lock().await;
        state.store.purge(Instant::now());
        Ok((state, faults))
    }

    fn create_key_pair(&self, record: &Record) -> Result<StoredResource, Refusal> {
        let supplied = validation::validate_key_pair(&record.fields, &self.providers)?;
        let (public, private_key) = match supplied {
            Some(public) => (public, None),
            None => {
                let generated = generate_ed25519(&record.name);
                (generated.public, Some(generated.private_pem))
            }
        };

        let mut stored = record.clone();
        stored.fields.insert(
            "public_key".to_owned(),
            serde_json::Value::String(public.to_openssh()),
        );
        stored.fields.insert(
            "fingerprint".to_owned(),
            serde_json::Value::String(public.fingerprint()),
        );

        let mut resource = StoredResource::new(stored);
        resource.private_key = private_key;
        Ok(resource)
    }

    fn run_columns(record: &Record) -> Vec<String> {
        let columns: Vec<String> = match record.kind {
            EntityKind::Report => str_list(&record.fields, "report_fields")
                .into_iter()
                .map(str::to_owned)
                .collect(),
            _ => str_list(&record.fields, "filter")
                .last()
                .map(|report| vec![(*report).to_owned()])
                .unwrap_or_default(),
        };
        if columns.is_empty() {
            vec!["Name".to_owned()]
        } else {
            columns
        }
    }
}

fn not_found(kind: EntityKind, name: &str) -> RemoteError {
    RemoteError::NotFound {
        kind,
        name: name.to_owned(),
    }
}

fn rejected(code: RejectionCode, verb: &str, kind: EntityKind, name: &str, reason: &str) -> RemoteError {
    RemoteError::Rejected(Rejection::new(code, unable(verb, kind, name, reason)))
}

/// 삭제 대기 중이 아닌 리소스
fn live_mut<'s>(
    store: &'s mut Store,
    kind: EntityKind,
    name: &str,
) -> Result<&'s mut StoredResource, RemoteError> {
    store
        .get_mut(kind, name)
        .filter(|resource| !resource.is_pending_delete())
        .ok_or_else(|| not_found(kind, name))
}

impl ApplianceClient for SimulatedAppliance {
    async fn create(&self, record: &Record) -> Result<Record, RemoteError> {
        let (kind, name) = (record.kind, record.name.as_str());
        let (mut state, _) = self.enter("create", Some(kind), name, Vec::new()).await?;

        let resource = match kind {
            EntityKind::KeyPair => self.create_key_pair(record),
            _ => validation::validate_fields(kind, &record.fields)
                .map(|()| StoredResource::new(record.clone())),
        }
        .map_err(|refusal| RemoteError::Rejected(refusal.into_rejection("create", kind, name)))?;

        if state.store.is_taken(kind, name) {
            return Err(rejected(
                RejectionCode::Duplicate,
                "create",
                kind,
                name,
                "Name has already been taken",
            ));
        }

        let stored = resource.record.clone();
        state.store.insert(resource);
        info!(kind = kind.label(), name, "resource created");
        Ok(stored)
    }

    async fn read(&self, kind: EntityKind, name: &str) -> Result<Option<Record>, RemoteError> {
        let (state, _) = self.enter("read", Some(kind), name, Vec::new()).await?;
        Ok(state.store.get(kind, name).map(|r| r.record.clone()))
    }

    async fn update(
        &self,
        kind: EntityKind,
        name: &str,
        delta: &UpdateDelta,
    ) -> Result<(), RemoteError> {
        let fields = delta.fields().into_iter().map(str::to_owned).collect();
        let (mut state, faults) = self.enter("update", Some(kind), name, fields).await?;
        let resource = live_mut(&mut state.store, kind, name)?;

        if let Some((field, _)) = delta
            .iter()
            .find(|(field, _)| validation::is_fixed_after_create(kind, field))
        {
            return Err(rejected(
                RejectionCode::ImmutableField,
                "update",
                kind,
                name,
                &format!("Field \"{field}\" cannot be changed"),
            ));
        }

        if let Some(reason) = &faults.reject_updates {
            return Err(rejected(RejectionCode::InvalidField, "update", kind, name, reason));
        }

        let mut merged = resource.record.fields.clone();
        delta.apply_to(&mut merged);
        validation::validate_fields(kind, &merged)
            .map_err(|refusal| RemoteError::Rejected(refusal.into_rejection("update", kind, name)))?;

        if faults.drop_updates {
            warn!(kind = kind.label(), name, fields = delta.len(), "update dropped");
            return Ok(());
        }

        resource.record.fields = merged;
        debug!(kind = kind.label(), name, fields = ?delta.fields(), "resource updated");
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, name: &str) -> Result<(), RemoteError> {
        let (mut state, _) = self.enter("delete", Some(kind), name, Vec::new()).await?;
        let resource = live_mut(&mut state.store, kind, name)?;
        resource.deleted_at = Some(Instant::now() + self.delete_delay);
        info!(kind = kind.label(), name, delay = ?self.delete_delay, "resource deletion scheduled");
        Ok(())
    }

    async fn exists(&self, kind: EntityKind, name: &str) -> Result<bool, RemoteError> {
        let (state, _) = self.enter("exists", Some(kind), name, Vec::new()).await?;
        Ok(state.store.get(kind, name).is_some())
    }

    async fn tag_catalog(&self) -> Result<Vec<Tag>, RemoteError> {
        let (_state, _) = self.enter("tag_catalog", None, "", Vec::new()).await?;
        Ok(self.catalog.clone())
    }

    async fn tags(&self, kind: EntityKind, name: &str) -> Result<BTreeSet<Tag>, RemoteError> {
        let (state, _) = self.enter("tags", Some(kind), name, Vec::new()).await?;
        state
            .store
            .get(kind, name)
            .map(|r| r.tags.clone())
            .ok_or_else(|| not_found(kind, name))
    }

    async fn add_tag(&self, kind: EntityKind, name: &str, tag: &Tag) -> Result<(), RemoteError> {
        let (mut state, _) = self.enter("add_tag", Some(kind), name, Vec::new()).await?;
        let resource = live_mut(&mut state.store, kind, name)?;
        if !self.catalog.contains(tag) {
            return Err(rejected(
                RejectionCode::UnknownReference,
                "tag",
                kind,
                name,
                &format!("Tag \"{tag}\" does not exist"),
            ));
        }
        resource.tags.insert(tag.clone());
        debug!(kind = kind.label(), name, %tag, "tag assigned");
        Ok(())
    }

    async fn remove_tag(&self, kind: EntityKind, name: &str, tag: &Tag) -> Result<(), RemoteError> {
        let (mut state, _) = self.enter("remove_tag", Some(kind), name, Vec::new()).await?;
        let resource = live_mut(&mut state.store, kind, name)?;
        if !resource.tags.remove(tag) {
            return Err(rejected(
                RejectionCode::UnknownReference,
                "untag",
                kind,
                name,
                &format!("Tag \"{tag}\" is not assigned"),
            ));
        }
        debug!(kind = kind.label(), name, %tag, "tag removed");
        Ok(())
    }

    async fn perform(
        &self,
        kind: EntityKind,
        name: &str,
        action: EntityAction,
    ) -> Result<ActionOutput, RemoteError> {
        let (mut state, _) = self.enter(action.as_str(), Some(kind), name, Vec::new()).await?;
        let resource = live_mut(&mut state.store, kind, name)?;
        let now = Instant::now();

        match (action, kind) {
            (EntityAction::DownloadPrivateKey, EntityKind::KeyPair) => {
                resource.private_key.clone().map(ActionOutput::PrivateKey).ok_or_else(|| {
                    rejected(
                        RejectionCode::Unsupported,
                        "download",
                        kind,
                        name,
                        "Private key is only available for key pairs generated by the appliance",
                    )
                })
            }
            (EntityAction::Queue, EntityKind::Report | EntityKind::Schedule) => {
                let run = StoredRun {
                    id: uuid::Uuid::new_v4().to_string(),
                    queued_at: now,
                    columns: Self::run_columns(&resource.record),
                };
                let observed = run.observe(now, self.run_delay);
                resource.runs.push(run);
                info!(kind = kind.label(), name, run_id = observed.id.as_str(), "run queued");
                Ok(ActionOutput::Queued(observed))
            }
            (EntityAction::ListRuns, EntityKind::Report | EntityKind::Schedule) => Ok(
                ActionOutput::Runs(
                    resource
                        .runs
                        .iter()
                        .map(|run| run.observe(now, self.run_delay))
                        .collect(),
                ),
            ),
            (action, kind) => Err(rejected(
                RejectionCode::Unsupported,
                action.as_str(),
                kind,
                name,
                &format!("{kind} does not support {action}"),
            )),
        }
    }

    async fn ping(&self) -> Result<(), RemoteError> {
        let (_state, _) = self.enter("ping", None, "", Vec::new()).await?;
        Ok(())
    }
}

/// [`SimulatedAppliance`] 빌더
#[derive(Debug, Default)]
pub struct SimulatedApplianceBuilder {
    providers: Vec<(String, ProviderKind)>,
    catalog: Vec<Tag>,
    delete_delay: Duration,
    run_delay: Duration,
    faults: FaultPlan,
}

impl SimulatedApplianceBuilder {
    /// 빈 빌더 (지연 없음, 장애 없음)
    pub fn new() -> Self {
        Self::default()
    }

    /// `[appliance]` 설정으로 빌더를 채웁니다. 카탈로그 태그 형식 오류는 에러입니다.
    pub fn from_config(config: &ApplianceConfig) -> Result<Self, ApplianceError> {
        let mut builder = Self::new()
            .delete_delay(config.delete_delay())
            .run_delay(config.run_delay());
        for provider in &config.providers {
            builder = builder.provider(provider.name.clone(), provider.kind);
        }
        for entry in &config.tag_catalog {
            let tag = entry.parse::<Tag>().map_err(|e| ApplianceError::InvalidTag {
                tag: entry.clone(),
                reason: e.to_string(),
            })?;
            builder = builder.tag(tag);
        }
        Ok(builder)
    }

    /// 클라우드 프로바이더를 등록합니다.
    pub fn provider(mut self, name: impl Into<String>, kind: ProviderKind) -> Self {
        self.providers.push((name.into(), kind));
        self
    }

    /// 카탈로그 태그를 추가합니다.
    pub fn tag(mut self, tag: Tag) -> Self {
        self.catalog.push(tag);
        self
    }

    /// 삭제가 조회에 반영되기까지의 지연
    pub fn delete_delay(mut self, delay: Duration) -> Self {
        self.delete_delay = delay;
        self
    }

    /// 큐에 들어간 실행이 완료되기까지의 지연
    pub fn run_delay(mut self, delay: Duration) -> Self {
        self.run_delay = delay;
        self
    }

    /// 초기 장애 계획
    pub fn faults(mut self, faults: FaultPlan) -> Self {
        self.faults = faults;
        self
    }

    /// 어플라이언스를 생성합니다.
    ///
    /// # Errors
    ///
    /// - [`ApplianceError::NoProviders`]: 프로바이더 없음
    /// - [`ApplianceError::DuplicateProvider`]: 프로바이더 이름 중복
    pub fn build(self) -> Result<SimulatedAppliance, ApplianceError> {
        if self.providers.is_empty() {
            return Err(ApplianceError::NoProviders);
        }

        let mut providers = HashMap::with_capacity(self.providers.len());
        for (name, kind) in self.providers {
            if providers.contains_key(&name) {
                return Err(ApplianceError::DuplicateProvider(name));
            }
            providers.insert(name, kind);
        }

        info!(
            providers = providers.len(),
            tags = self.catalog.len(),
            delete_delay = ?self.delete_delay,
            run_delay = ?self.run_delay,
            "simulated appliance ready"
        );

        Ok(SimulatedAppliance {
            providers,
            catalog: self.catalog,
            delete_delay: self.delete_delay,
            run_delay: self.run_delay,
            state: Mutex::new(State {
                faults: self.faults,
                ..State::default()
            }),
        })
    }
}

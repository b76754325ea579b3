//! # Repository
//!
//! Composition root wiring the agent directory, the work store, the audit
//! log and observers. Controllers, policies and indexers call in here; none
//! of them touch a ledger or a version state directly.
//!
//! Every mutation:
//! 1. runs inside one store transaction, authorization check included
//! 2. is audited with its outcome
//! 3. on success, is dispatched to observers after commit

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::access::{AccessEngine, AccessLedger, AccessLevel, VisibilityTier};
use crate::agent::{AgentDirectory, AgentRef, Group, InMemoryAgentDirectory, Principal, User};
use crate::config::RepositoryConfig;
use crate::errors::{CoreError, CoreResult};
use crate::ids::{AgentId, WorkId};
use crate::lifecycle::{LifecycleEvent, PostTransitionEffect, Version};
use crate::observability::{AuditAction, AuditLog, AuditOutcome, AuditRecord, FileAuditLog, MemoryAuditLog};
use crate::resource::{Permissioned, TransitionOutcome, Work};
use crate::store::{InMemoryWorkStore, Snapshot, WorkStore};

/// Collaborators informed after a committed change: search indexers,
/// notification senders, caches of rendered landing pages.
///
/// Observers run after the commit and cannot veto it.
pub trait WorkObserver: Send + Sync {
    fn on_work_created(&self, _work: &Work) {}

    fn on_transition(&self, _work: &Work, _outcome: &TransitionOutcome) {}

    fn on_version_destroyed(&self, _work: &Work, _destroyed: &Version) {}

    fn on_access_changed(&self, _work: &Work) {}

    fn on_work_deleted(&self, _work: &Work) {}
}

/// Seed a directory from configuration and agent records.
///
/// Singleton groups take their display names from the config; users named
/// in `admin_uids` are promoted.
pub fn seed_directory(
    config: &RepositoryConfig,
    users: Vec<User>,
    groups: Vec<Group>,
) -> CoreResult<InMemoryAgentDirectory> {
    let directory = InMemoryAgentDirectory::with_singleton_names(
        &config.public_group_name,
        &config.authorized_group_name,
    );
    directory.load(users, groups)?;

    for uid in &config.admin_uids {
        match directory.find_user_by_uid(uid)? {
            Some(user) => directory.set_admin(user.id, true)?,
            None => warn!(event = "ADMIN_UID_UNKNOWN", uid = %uid),
        }
    }
    Ok(directory)
}

pub struct Repository {
    config: RepositoryConfig,
    directory: Arc<dyn AgentDirectory>,
    store: Arc<dyn WorkStore>,
    audit: Arc<dyn AuditLog>,
    observers: Vec<Arc<dyn WorkObserver>>,
}

impl Repository {
    pub fn new(
        config: RepositoryConfig,
        directory: Arc<dyn AgentDirectory>,
        store: Arc<dyn WorkStore>,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        Self {
            config,
            directory,
            store,
            audit,
            observers: Vec::new(),
        }
    }

    /// In-memory store; file audit log if configured, else in-memory.
    pub fn in_memory(config: RepositoryConfig, directory: Arc<dyn AgentDirectory>) -> CoreResult<Self> {
        let audit: Arc<dyn AuditLog> = match &config.audit_log_path {
            Some(path) => Arc::new(FileAuditLog::open(path).map_err(|e| {
                CoreError::StorageError(format!("cannot open audit log {}: {}", path.display(), e))
            })?),
            None => Arc::new(MemoryAuditLog::new()),
        };
        Ok(Self::new(config, directory, Arc::new(InMemoryWorkStore::new()), audit))
    }

    /// Build a repository holding everything in `snapshot`.
    pub fn from_snapshot(config: RepositoryConfig, snapshot: Snapshot) -> CoreResult<Self> {
        let directory = seed_directory(&config, snapshot.users, snapshot.groups)?;
        let repository = Self::in_memory(config, Arc::new(directory))?;
        for record in snapshot.works {
            repository.store.insert(Work::try_from(record)?)?;
        }
        Ok(repository)
    }

    pub fn with_observer(mut self, observer: Arc<dyn WorkObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn directory(&self) -> &dyn AgentDirectory {
        self.directory.as_ref()
    }

    pub fn engine(&self) -> AccessEngine<'_> {
        AccessEngine::new(self.directory.as_ref())
    }

    pub fn work(&self, id: WorkId) -> CoreResult<Work> {
        self.store.get(id)
    }

    pub fn work_ids(&self) -> CoreResult<Vec<WorkId>> {
        self.store.ids()
    }

    // ==================
    // Access decisions
    // ==================

    pub fn effective_level(&self, principal: &Principal, id: WorkId) -> CoreResult<Option<AccessLevel>> {
        self.store.get(id)?.effective_level(&self.engine(), principal)
    }

    pub fn discover_access(&self, principal: &Principal, id: WorkId) -> CoreResult<bool> {
        self.store.get(id)?.discover_access(&self.engine(), principal)
    }

    pub fn read_access(&self, principal: &Principal, id: WorkId) -> CoreResult<bool> {
        self.store.get(id)?.read_access(&self.engine(), principal)
    }

    pub fn edit_access(&self, principal: &Principal, id: WorkId) -> CoreResult<bool> {
        self.store.get(id)?.edit_access(&self.engine(), principal)
    }

    pub fn open_access(&self, id: WorkId) -> CoreResult<bool> {
        Ok(self.store.get(id)?.open_access())
    }

    pub fn authorized_access(&self, id: WorkId) -> CoreResult<bool> {
        Ok(self.store.get(id)?.authorized_access())
    }

    pub fn visibility(&self, id: WorkId) -> CoreResult<VisibilityTier> {
        Ok(self.store.get(id)?.visibility())
    }

    pub fn representative_version(&self, id: WorkId) -> CoreResult<Option<Version>> {
        Ok(self.store.get(id)?.representative_version().cloned())
    }

    // ==================
    // Deposit workflow
    // ==================

    /// Create a work with its first draft, owned by `depositor`, at the
    /// configured default visibility.
    pub fn create_work(&self, depositor: AgentId, metadata: serde_json::Value) -> CoreResult<Work> {
        let result = self.build_work(depositor, metadata);
        let target = result.as_ref().map(|w| format!("work:{}", w.id())).unwrap_or_default();
        self.record_audit(AuditAction::WorkCreated, Some(depositor), target, &result);

        let work = result?;
        info!(
            event = "WORK_CREATED",
            work = %work.id(),
            depositor = %depositor,
            visibility = %work.visibility(),
        );
        for observer in &self.observers {
            observer.on_work_created(&work);
        }
        Ok(work)
    }

    fn build_work(&self, depositor: AgentId, metadata: serde_json::Value) -> CoreResult<Work> {
        if self.directory.find_user(depositor)?.is_none() {
            return Err(CoreError::UnknownAgent(depositor));
        }
        let mut work = Work::create(depositor, metadata);
        work.set_visibility(self.config.default_visibility);
        self.store.insert(work.clone())?;
        Ok(work)
    }

    pub fn create_draft(&self, actor: &Principal, id: WorkId, metadata: serde_json::Value) -> CoreResult<Work> {
        let result = self.mutate(actor, id, AccessLevel::Edit, "create a draft in", |work| {
            work.create_draft(metadata).map(|v| v.version_number())
        });
        let target = match &result {
            Ok((number, _)) => format!("work:{}/v{}", id, number),
            Err(_) => format!("work:{}", id),
        };
        self.record_audit(AuditAction::DraftCreated, actor_id(actor), target, &result);
        result.map(|(_, work)| work)
    }

    pub fn update_draft(
        &self,
        actor: &Principal,
        id: WorkId,
        version_number: u32,
        metadata: serde_json::Value,
    ) -> CoreResult<Work> {
        let result = self.mutate(actor, id, AccessLevel::Edit, "edit", |work| {
            work.update_draft(version_number, metadata)
        });
        self.record_audit(
            AuditAction::DraftUpdated,
            actor_id(actor),
            format!("work:{}/v{}", id, version_number),
            &result,
        );
        result.map(|(_, work)| work)
    }

    pub fn publish(&self, actor: &Principal, id: WorkId, version_number: u32) -> CoreResult<TransitionOutcome> {
        self.run_transition(actor, id, version_number, LifecycleEvent::Publish)
    }

    pub fn withdraw(&self, actor: &Principal, id: WorkId, version_number: u32) -> CoreResult<TransitionOutcome> {
        self.run_transition(actor, id, version_number, LifecycleEvent::Withdraw)
    }

    pub fn remove(&self, actor: &Principal, id: WorkId, version_number: u32) -> CoreResult<TransitionOutcome> {
        self.run_transition(actor, id, version_number, LifecycleEvent::Remove)
    }

    fn run_transition(
        &self,
        actor: &Principal,
        id: WorkId,
        version_number: u32,
        event: LifecycleEvent,
    ) -> CoreResult<TransitionOutcome> {
        let result = self.mutate(actor, id, AccessLevel::Edit, event.as_str(), |work| {
            work.transition(version_number, event)
        });

        let action = match event {
            LifecycleEvent::Publish => AuditAction::VersionPublished,
            LifecycleEvent::Withdraw => AuditAction::VersionWithdrawn,
            LifecycleEvent::Remove => AuditAction::VersionRemoved,
        };
        self.record_audit(action, actor_id(actor), format!("work:{}/v{}", id, version_number), &result);

        let (outcome, work) = result?;
        info!(
            event = "VERSION_TRANSITIONED",
            work = %id,
            version = version_number,
            from = %outcome.transition.from,
            to = %outcome.transition.to,
            agreement_acknowledged = outcome.acknowledged_agreement(),
        );
        for effect in &outcome.effects {
            if *effect == PostTransitionEffect::RefreshRepresentative {
                for observer in &self.observers {
                    observer.on_transition(&work, &outcome);
                }
            }
        }
        Ok(outcome)
    }

    /// Delete one version row.
    ///
    /// `force` is honored only when the configuration allows it; otherwise a
    /// published version still fails with `IrreversibleDeletion`.
    pub fn destroy_version(
        &self,
        actor: &Principal,
        id: WorkId,
        version_number: u32,
        force: bool,
    ) -> CoreResult<Work> {
        let force = self.effective_force(force);
        let result = self.mutate(actor, id, AccessLevel::Edit, "destroy a version of", |work| {
            work.destroy_version(version_number, force)
        });
        self.record_audit(
            AuditAction::VersionDestroyed,
            actor_id(actor),
            format!("work:{}/v{}", id, version_number),
            &result,
        );

        let (destroyed, work) = result?;
        info!(event = "VERSION_DESTROYED", work = %id, version = version_number, force = force);
        for observer in &self.observers {
            observer.on_version_destroyed(&work, &destroyed);
        }
        Ok(work)
    }

    /// Delete a work with all its versions and grants.
    pub fn delete_work(&self, actor: &Principal, id: WorkId, force: bool) -> CoreResult<()> {
        let force = self.effective_force(force);
        let engine = self.engine();
        let result = self.store.delete(id, &|work: &Work| {
            engine.require(actor, work.ledger(), AccessLevel::Edit, "delete")?;
            work.ensure_deletable(force)
        });
        self.record_audit(AuditAction::WorkDeleted, actor_id(actor), format!("work:{}", id), &result);

        let work = result?;
        info!(event = "WORK_DELETED", work = %id, force = force);
        for observer in &self.observers {
            observer.on_work_deleted(&work);
        }
        Ok(())
    }

    // ==================
    // Access mutation
    // ==================

    /// Apply `change` to the work's ledger. Requires edit access.
    ///
    /// Returns whether any row changed.
    pub fn change_access<F>(&self, actor: &Principal, id: WorkId, change: F) -> CoreResult<bool>
    where
        F: FnOnce(&mut AccessLedger) -> bool,
    {
        self.apply_access(actor, id, AuditAction::GrantChanged, &[], change)
    }

    /// Grant `level` to `agent`, which must be known to the directory.
    pub fn grant(&self, actor: &Principal, id: WorkId, agent: AgentRef, level: AccessLevel) -> CoreResult<bool> {
        self.apply_access(actor, id, AuditAction::GrantChanged, &[agent], |ledger| {
            ledger.grant(agent, level)
        })
    }

    pub fn revoke(&self, actor: &Principal, id: WorkId, agent: AgentRef, level: AccessLevel) -> CoreResult<bool> {
        self.change_access(actor, id, |ledger| ledger.revoke(agent, level))
    }

    pub fn set_visibility(&self, actor: &Principal, id: WorkId, tier: VisibilityTier) -> CoreResult<bool> {
        self.apply_access(actor, id, AuditAction::VisibilityChanged, &[], |ledger| {
            ledger.set_visibility(tier)
        })
    }

    pub fn set_discover_groups(&self, actor: &Principal, id: WorkId, groups: Vec<AgentId>) -> CoreResult<bool> {
        let agents: Vec<AgentRef> = groups.iter().copied().map(AgentRef::Group).collect();
        self.replace_groups(actor, id, &agents, |ledger| ledger.set_discover_groups(groups))
    }

    pub fn set_read_groups(&self, actor: &Principal, id: WorkId, groups: Vec<AgentId>) -> CoreResult<bool> {
        let agents: Vec<AgentRef> = groups.iter().copied().map(AgentRef::Group).collect();
        self.replace_groups(actor, id, &agents, |ledger| ledger.set_read_groups(groups))
    }

    pub fn set_edit_groups(&self, actor: &Principal, id: WorkId, groups: Vec<AgentId>) -> CoreResult<bool> {
        let agents: Vec<AgentRef> = groups.iter().copied().map(AgentRef::Group).collect();
        self.replace_groups(actor, id, &agents, |ledger| ledger.set_edit_groups(groups))
    }

    // ==================
    // Internals
    // ==================

    /// Authorize and mutate inside one store transaction.
    fn mutate<T, F>(
        &self,
        actor: &Principal,
        id: WorkId,
        required: AccessLevel,
        action: &str,
        f: F,
    ) -> CoreResult<(T, Work)>
    where
        F: FnOnce(&mut Work) -> CoreResult<T>,
    {
        let engine = self.engine();
        self.store.as_ref().transact(id, |work| {
            engine.require(actor, work.ledger(), required, action)?;
            f(work)
        })
    }

    fn replace_groups<F>(&self, actor: &Principal, id: WorkId, agents: &[AgentRef], replace: F) -> CoreResult<bool>
    where
        F: FnOnce(&mut AccessLedger),
    {
        self.apply_access(actor, id, AuditAction::GrantChanged, agents, |ledger| {
            let before = ledger.clone();
            replace(ledger);
            *ledger != before
        })
    }

    /// Every agent in `agents` must resolve in the directory before `change` runs.
    fn apply_access<F>(
        &self,
        actor: &Principal,
        id: WorkId,
        action: AuditAction,
        agents: &[AgentRef],
        change: F,
    ) -> CoreResult<bool>
    where
        F: FnOnce(&mut AccessLedger) -> bool,
    {
        let result = self.mutate(actor, id, AccessLevel::Edit, "change access on", |work| {
            for agent in agents {
                self.ensure_known(*agent)?;
            }
            Ok(change(work.ledger_mut()))
        });
        self.record_audit(action, actor_id(actor), format!("work:{}", id), &result);

        let (changed, work) = result?;
        if changed {
            info!(event = "ACCESS_CHANGED", work = %id, visibility = %work.visibility());
            for observer in &self.observers {
                observer.on_access_changed(&work);
            }
        }
        Ok(changed)
    }

    fn ensure_known(&self, agent: AgentRef) -> CoreResult<()> {
        let found = match agent {
            AgentRef::User(id) => self.directory.find_user(id)?.is_some(),
            AgentRef::Group(id) => self.directory.find_group(id)?.is_some(),
        };
        if found {
            Ok(())
        } else {
            Err(CoreError::UnknownAgent(agent.id()))
        }
    }

    fn effective_force(&self, force: bool) -> bool {
        if force && !self.config.allow_forced_destroy {
            warn!(event = "FORCED_DESTROY_DISABLED");
            return false;
        }
        force
    }

    fn record_audit<T>(&self, action: AuditAction, actor: Option<AgentId>, target: String, result: &CoreResult<T>) {
        let mut record = match result {
            Ok(_) => AuditRecord::new(action, AuditOutcome::Success),
            Err(err) => {
                warn!(event = "MUTATION_REJECTED", action = %action, code = err.code(), error = %err);
                AuditRecord::new(action, AuditOutcome::of_error(err)).with_error(err)
            }
        }
        .with_actor(actor);
        if !target.is_empty() {
            record = record.with_target(target);
        }

        if let Err(e) = self.audit.append(&record) {
            error!(event = "AUDIT_APPEND_FAILED", action = %action, error = %e);
        }
    }
}

fn actor_id(actor: &Principal) -> Option<AgentId> {
    actor.agent().map(|a| a.id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::WorkRecord;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    impl RecordingObserver {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl WorkObserver for RecordingObserver {
        fn on_work_created(&self, work: &Work) {
            self.events.lock().unwrap().push(format!("created v{}", work.latest_version().version_number()));
        }

        fn on_transition(&self, work: &Work, outcome: &TransitionOutcome) {
            let representative = work.representative_version().map(|v| v.version_number());
            self.events
                .lock()
                .unwrap()
                .push(format!("{} rep={:?}", outcome.transition.to, representative));
        }

        fn on_version_destroyed(&self, _work: &Work, destroyed: &Version) {
            self.events
                .lock()
                .unwrap()
                .push(format!("destroyed v{}", destroyed.version_number()));
        }

        fn on_access_changed(&self, work: &Work) {
            self.events.lock().unwrap().push(format!("access {}", work.visibility()));
        }

        fn on_work_deleted(&self, _work: &Work) {
            self.events.lock().unwrap().push("deleted".to_string());
        }
    }

    struct Harness {
        repo: Repository,
        directory: Arc<InMemoryAgentDirectory>,
        audit: Arc<MemoryAuditLog>,
        observer: Arc<RecordingObserver>,
    }

    fn harness(config: RepositoryConfig) -> Harness {
        let directory = Arc::new(InMemoryAgentDirectory::new());
        let audit = Arc::new(MemoryAuditLog::new());
        let observer = Arc::new(RecordingObserver::default());
        let repo = Repository::new(
            config,
            directory.clone(),
            Arc::new(InMemoryWorkStore::new()),
            audit.clone(),
        )
        .with_observer(observer.clone());
        Harness {
            repo,
            directory,
            audit,
            observer,
        }
    }

    fn deposit(h: &Harness) -> (User, WorkId) {
        let owner = h.directory.create_user("depositor").unwrap();
        let work = h.repo.create_work(owner.id, json!({"title": "Field notes"})).unwrap();
        (owner, work.id())
    }

    #[test]
    fn test_create_work_applies_default_visibility() {
        let config = RepositoryConfig {
            default_visibility: VisibilityTier::Private,
            ..RepositoryConfig::default()
        };
        let h = harness(config);
        let (owner, id) = deposit(&h);

        assert_eq!(h.repo.visibility(id).unwrap(), VisibilityTier::Private);
        assert!(!h.repo.discover_access(&Principal::Anonymous, id).unwrap());
        assert!(h.repo.edit_access(&Principal::from(&owner), id).unwrap());
        assert_eq!(h.observer.events(), vec!["created v1".to_string()]);
    }

    #[test]
    fn test_create_work_for_unknown_depositor_is_audited() {
        let h = harness(RepositoryConfig::default());
        let ghost = AgentId::generate();

        assert_eq!(
            h.repo.create_work(ghost, json!({})).unwrap_err(),
            CoreError::UnknownAgent(ghost)
        );
        let records = h.audit.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome, AuditOutcome::Rejected);
        assert_eq!(records[0].error_code, Some("DEPOSITUM_UNKNOWN_AGENT"));
        assert!(h.repo.work_ids().unwrap().is_empty());
    }

    #[test]
    fn test_publish_requires_edit_access() {
        let h = harness(RepositoryConfig::default());
        let (_, id) = deposit(&h);
        let stranger = h.directory.create_user("stranger").unwrap();

        let err = h.repo.publish(&Principal::from(&stranger), id, 1).unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));
        assert!(h.repo.work(id).unwrap().latest_version().is_draft());
        assert!(h.repo.representative_version(id).unwrap().unwrap().is_draft());
    }

    #[test]
    fn test_publish_acknowledges_and_notifies() {
        let h = harness(RepositoryConfig::default());
        let (owner, id) = deposit(&h);

        let outcome = h.repo.publish(&Principal::from(&owner), id, 1).unwrap();
        assert!(outcome.acknowledged_agreement());

        let work = h.repo.work(id).unwrap();
        assert!(work.deposit_agreement_acknowledged());
        assert_eq!(work.representative_version().unwrap().version_number(), 1);
        assert!(h.observer.events().contains(&"published rep=Some(1)".to_string()));

        let last = h.audit.records().pop().unwrap();
        assert_eq!(last.action, AuditAction::VersionPublished);
        assert_eq!(last.outcome, AuditOutcome::Success);
        assert_eq!(last.actor, Some(owner.id));
    }

    #[test]
    fn test_invalid_transition_is_rejected_and_audited() {
        let h = harness(RepositoryConfig::default());
        let (owner, id) = deposit(&h);

        let err = h.repo.withdraw(&Principal::from(&owner), id, 1).unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidTransition {
                from: crate::lifecycle::VersionState::Draft,
                event: LifecycleEvent::Withdraw,
            }
        );
        assert_eq!(h.audit.records().pop().unwrap().outcome, AuditOutcome::Rejected);
    }

    #[test]
    fn test_admin_may_transition_any_work() {
        let h = harness(RepositoryConfig::default());
        let (_, id) = deposit(&h);
        let admin = h.directory.create_admin("root").unwrap();

        h.repo.publish(&Principal::from(&admin), id, 1).unwrap();
        h.repo.withdraw(&Principal::from(&admin), id, 1).unwrap();
        assert!(h.repo.work(id).unwrap().is_withdrawn());
    }

    #[test]
    fn test_forced_destroy_can_be_disabled() {
        let config = RepositoryConfig {
            allow_forced_destroy: false,
            ..RepositoryConfig::default()
        };
        let h = harness(config);
        let (owner, id) = deposit(&h);
        let actor = Principal::from(&owner);
        h.repo.publish(&actor, id, 1).unwrap();
        h.repo.create_draft(&actor, id, json!({"title": "v2"})).unwrap();

        let err = h.repo.destroy_version(&actor, id, 1, true).unwrap_err();
        assert_eq!(err, CoreError::IrreversibleDeletion { version_number: 1 });

        let work = h.repo.destroy_version(&actor, id, 2, false).unwrap();
        assert_eq!(work.versions().len(), 1);
    }

    #[test]
    fn test_forced_destroy_of_published_version() {
        let h = harness(RepositoryConfig::default());
        let (owner, id) = deposit(&h);
        let actor = Principal::from(&owner);
        h.repo.publish(&actor, id, 1).unwrap();
        h.repo.create_draft(&actor, id, json!({})).unwrap();

        assert!(h.repo.destroy_version(&actor, id, 1, false).is_err());
        assert!(!h.observer.events().contains(&"destroyed v1".to_string()));
        let work = h.repo.destroy_version(&actor, id, 1, true).unwrap();
        let representative = work.representative_version().unwrap();
        assert_eq!(representative.version_number(), 2);
        assert!(representative.is_draft());
        assert_eq!(h.observer.events().last(), Some(&"destroyed v1".to_string()));
    }

    #[test]
    fn test_delete_work_guards_published_versions() {
        let h = harness(RepositoryConfig::default());
        let (owner, id) = deposit(&h);
        let actor = Principal::from(&owner);
        h.repo.publish(&actor, id, 1).unwrap();

        assert_eq!(
            h.repo.delete_work(&actor, id, false).unwrap_err(),
            CoreError::IrreversibleDeletion { version_number: 1 }
        );
        assert!(h.repo.work(id).is_ok());

        h.repo.delete_work(&actor, id, true).unwrap();
        assert_eq!(h.repo.work(id).unwrap_err(), CoreError::WorkNotFound(id));
        assert_eq!(h.observer.events().last().map(String::as_str), Some("deleted"));
    }

    #[test]
    fn test_read_groups_through_repository() {
        let h = harness(RepositoryConfig {
            default_visibility: VisibilityTier::Private,
            ..RepositoryConfig::default()
        });
        let (owner, id) = deposit(&h);
        let lab = h.directory.create_group("lab").unwrap();
        let member = h.directory.create_user("member").unwrap();
        h.directory.add_member(lab.id, member.id).unwrap();
        let member = Principal::from(&h.directory.find_user(member.id).unwrap().unwrap());

        assert!(!h.repo.read_access(&member, id).unwrap());
        assert!(h.repo.set_read_groups(&Principal::from(&owner), id, vec![lab.id]).unwrap());
        assert!(h.repo.read_access(&member, id).unwrap());
        assert!(!h.repo.edit_access(&member, id).unwrap());

        assert!(!h.repo.set_read_groups(&Principal::from(&owner), id, vec![lab.id]).unwrap());
        assert!(h.repo.set_read_groups(&Principal::from(&owner), id, Vec::new()).unwrap());
        assert!(!h.repo.read_access(&member, id).unwrap());
    }

    #[test]
    fn test_set_visibility_requires_edit() {
        let h = harness(RepositoryConfig::default());
        let (owner, id) = deposit(&h);

        assert!(h.repo.set_visibility(&Principal::Anonymous, id, VisibilityTier::Private).is_err());
        assert!(h.repo.open_access(id).unwrap());

        assert!(h
            .repo
            .set_visibility(&Principal::from(&owner), id, VisibilityTier::Authorized)
            .unwrap());
        assert!(h.repo.authorized_access(id).unwrap());
        assert_eq!(
            h.repo.effective_level(&Principal::Anonymous, id).unwrap(),
            Some(AccessLevel::Discover)
        );
        assert_eq!(h.audit.records().pop().unwrap().action, AuditAction::VisibilityChanged);
        assert!(h.observer.events().contains(&"access authorized".to_string()));
    }

    #[test]
    fn test_grant_and_revoke_user() {
        let h = harness(RepositoryConfig::default());
        let (owner, id) = deposit(&h);
        let reviewer = h.directory.create_user("reviewer").unwrap();
        let actor = Principal::from(&owner);

        assert!(h.repo.grant(&actor, id, AgentRef::from(&reviewer), AccessLevel::Edit).unwrap());
        assert!(h.repo.edit_access(&Principal::from(&reviewer), id).unwrap());

        assert!(h.repo.revoke(&actor, id, AgentRef::from(&reviewer), AccessLevel::Edit).unwrap());
        assert!(!h.repo.edit_access(&Principal::from(&reviewer), id).unwrap());
    }

    #[test]
    fn test_grant_to_unknown_agent_rejected() {
        let h = harness(RepositoryConfig::default());
        let (owner, id) = deposit(&h);
        let actor = Principal::from(&owner);
        let before = h.repo.work(id).unwrap();
        let ghost = AgentId::generate();

        assert_eq!(
            h.repo.grant(&actor, id, AgentRef::User(ghost), AccessLevel::Read),
            Err(CoreError::UnknownAgent(ghost))
        );
        assert_eq!(
            h.repo.grant(&actor, id, AgentRef::Group(owner.id), AccessLevel::Edit),
            Err(CoreError::UnknownAgent(owner.id))
        );
        assert_eq!(
            h.repo.set_read_groups(&actor, id, vec![ghost]),
            Err(CoreError::UnknownAgent(ghost))
        );
        assert_eq!(h.repo.work(id).unwrap(), before);
        assert_eq!(h.audit.records().pop().unwrap().outcome, AuditOutcome::Rejected);
    }

    #[test]
    fn test_revoke_clears_row_of_removed_agent() {
        let h = harness(RepositoryConfig::default());
        let (owner, id) = deposit(&h);
        let actor = Principal::from(&owner);
        let ghost = AgentRef::User(AgentId::generate());
        assert!(h.repo.change_access(&actor, id, |ledger| ledger.grant(ghost, AccessLevel::Read)).unwrap());

        assert!(h.repo.revoke(&actor, id, ghost, AccessLevel::Read).unwrap());
        assert_eq!(h.repo.work(id).unwrap().ledger().level_of(ghost), None);
    }

    #[test]
    fn test_seed_directory_promotes_admins() {
        let config = RepositoryConfig {
            admin_uids: vec!["curator".to_string(), "missing".to_string()],
            ..RepositoryConfig::default()
        };
        let curator = User::new("curator");
        let directory = seed_directory(&config, vec![curator.clone()], Vec::new()).unwrap();

        assert!(directory.find_user(curator.id).unwrap().unwrap().admin);
    }

    #[test]
    fn test_from_snapshot_loads_works() {
        let owner = User::new("depositor");
        let mut work = Work::create(owner.id, json!({"title": "Archive"}));
        work.publish(1).unwrap();
        let snapshot = Snapshot {
            users: vec![owner.clone()],
            groups: Vec::new(),
            works: vec![WorkRecord::from(&work)],
        };

        let repo = Repository::from_snapshot(RepositoryConfig::default(), snapshot).unwrap();
        assert_eq!(repo.work(work.id()).unwrap(), work);
        assert!(repo.edit_access(&Principal::from(&owner), work.id()).unwrap());
    }
}

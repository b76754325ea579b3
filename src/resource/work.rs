//! # Work
//!
//! A deposited work: an ordered list of versions plus one access ledger.
//!
//! ## Invariants
//! - A work always holds at least one version
//! - `version_number` is unique within the work; versions are kept ascending
//! - Version state changes only through `publish` / `withdraw` / `remove`
//! - A transition and its domain side effect are applied together
//! - A published version is never destroyed without an explicit force flag

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Permissioned;
use crate::access::AccessLedger;
use crate::agent::AgentRef;
use crate::errors::{CoreError, CoreResult};
use crate::ids::{AgentId, ResourceRef, WorkId};
use crate::lifecycle::{
    plan_effects, LifecycleEvent, PostTransitionEffect, Transition, Version, VersionResolver,
};

/// Result of a successful lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionOutcome {
    pub transition: Transition,
    /// Effects in the order they were applied or must be dispatched.
    pub effects: Vec<PostTransitionEffect>,
}

impl TransitionOutcome {
    pub fn acknowledged_agreement(&self) -> bool {
        self.effects
            .contains(&PostTransitionEffect::AcknowledgeDepositAgreement)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Work {
    id: WorkId,
    depositor: AgentId,
    versions: Vec<Version>,
    ledger: AccessLedger,
    deposit_agreement_acknowledged_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    /// Highest `version_number` ever assigned, destroyed versions included.
    highest_version_number: u32,
}

impl Work {
    /// Create a work with its first draft version.
    ///
    /// The depositor is granted `edit`. Visibility grants are the caller's
    /// decision.
    pub fn create(depositor: AgentId, metadata: serde_json::Value) -> Self {
        let id = WorkId::generate();
        let mut ledger = AccessLedger::new(ResourceRef::Work(id));
        ledger.grant_edit(AgentRef::User(depositor));

        Self {
            id,
            depositor,
            versions: vec![Version::draft(id, 1, metadata)],
            ledger,
            deposit_agreement_acknowledged_at: None,
            created_at: Utc::now(),
            highest_version_number: 1,
        }
    }

    /// Assemble a work from persisted parts, validating every invariant
    /// before anything is built.
    pub fn from_parts(
        id: WorkId,
        depositor: AgentId,
        mut versions: Vec<Version>,
        ledger: AccessLedger,
        deposit_agreement_acknowledged_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> CoreResult<Self> {
        if versions.is_empty() {
            return Err(CoreError::constraint(format!("work {} has no versions", id)));
        }
        if ledger.resource() != ResourceRef::Work(id) {
            return Err(CoreError::constraint(format!(
                "ledger of {} attached to work {}",
                ledger.resource(),
                id
            )));
        }
        if let Some(stray) = versions.iter().find(|v| v.work_id() != id) {
            return Err(CoreError::constraint(format!(
                "version {} belongs to work {}, not {}",
                stray.id(),
                stray.work_id(),
                id
            )));
        }

        versions.sort_by_key(|v| v.version_number());
        if let Some(pair) = versions
            .windows(2)
            .find(|pair| pair[0].version_number() == pair[1].version_number())
        {
            return Err(CoreError::constraint(format!(
                "duplicate version_number {} in work {}",
                pair[0].version_number(),
                id
            )));
        }

        let highest_version_number = versions.last().map_or(0, |v| v.version_number());
        Ok(Self {
            id,
            depositor,
            versions,
            ledger,
            deposit_agreement_acknowledged_at,
            created_at,
            highest_version_number,
        })
    }

    /// Restore the persisted numbering high-water mark.
    ///
    /// Fails if `highest` is below a version that exists.
    pub fn with_highest_version_number(mut self, highest: u32) -> CoreResult<Self> {
        if highest < self.latest_version().version_number() {
            return Err(CoreError::constraint(format!(
                "highest version_number {} below existing v{} in work {}",
                highest,
                self.latest_version().version_number(),
                self.id
            )));
        }
        self.highest_version_number = highest;
        Ok(self)
    }

    /// Highest number ever assigned. Destroyed numbers are never reused.
    pub fn highest_version_number(&self) -> u32 {
        self.highest_version_number
    }

    #[inline]
    pub fn id(&self) -> WorkId {
        self.id
    }

    #[inline]
    pub fn depositor(&self) -> AgentId {
        self.depositor
    }

    /// All versions, ascending by number.
    #[inline]
    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    pub fn version(&self, version_number: u32) -> Option<&Version> {
        self.versions
            .iter()
            .find(|v| v.version_number() == version_number)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn deposit_agreement_acknowledged(&self) -> bool {
        self.deposit_agreement_acknowledged_at.is_some()
    }

    pub fn deposit_agreement_acknowledged_at(&self) -> Option<DateTime<Utc>> {
        self.deposit_agreement_acknowledged_at
    }

    // ==================
    // Resolution
    // ==================

    pub fn representative_version(&self) -> Option<&Version> {
        VersionResolver::representative_version(&self.versions)
    }

    pub fn latest_published_version(&self) -> Option<&Version> {
        VersionResolver::latest_published_version(&self.versions)
    }

    pub fn draft_version(&self) -> Option<&Version> {
        VersionResolver::draft_version(&self.versions)
    }

    pub fn withdrawn_version(&self) -> Option<&Version> {
        VersionResolver::withdrawn_version(&self.versions)
    }

    pub fn editable_version(&self) -> Option<&Version> {
        VersionResolver::editable_version(&self.versions)
    }

    pub fn latest_version(&self) -> &Version {
        // Non-empty by construction.
        &self.versions[self.versions.len() - 1]
    }

    pub fn is_withdrawn(&self) -> bool {
        VersionResolver::is_withdrawn(&self.versions)
    }

    pub fn has_published_version(&self) -> bool {
        VersionResolver::has_published_version(&self.versions)
    }

    // ==================
    // Version mutation
    // ==================

    /// Append a new draft numbered after every number ever assigned.
    pub fn create_draft(&mut self, metadata: serde_json::Value) -> CoreResult<&Version> {
        let next = self
            .highest_version_number
            .checked_add(1)
            .ok_or_else(|| CoreError::constraint("version_number overflow"))?;

        self.versions.push(Version::draft(self.id, next, metadata));
        self.highest_version_number = next;
        Ok(self.latest_version())
    }

    /// Replace the metadata of a draft version.
    pub fn update_draft(&mut self, version_number: u32, metadata: serde_json::Value) -> CoreResult<()> {
        let index = self.index_of(version_number)?;
        if self.versions[index].set_metadata(metadata) {
            Ok(())
        } else {
            Err(CoreError::constraint(format!(
                "version {} is {} and no longer editable",
                version_number,
                self.versions[index].state()
            )))
        }
    }

    pub fn publish(&mut self, version_number: u32) -> CoreResult<TransitionOutcome> {
        self.transition(version_number, LifecycleEvent::Publish)
    }

    pub fn withdraw(&mut self, version_number: u32) -> CoreResult<TransitionOutcome> {
        self.transition(version_number, LifecycleEvent::Withdraw)
    }

    pub fn remove(&mut self, version_number: u32) -> CoreResult<TransitionOutcome> {
        self.transition(version_number, LifecycleEvent::Remove)
    }

    /// Apply `event` to one version, then apply the planned domain effects.
    ///
    /// Validation happens before any write, so on error nothing changed.
    pub fn transition(&mut self, version_number: u32, event: LifecycleEvent) -> CoreResult<TransitionOutcome> {
        let index = self.index_of(version_number)?;
        let acknowledged = self.deposit_agreement_acknowledged();

        let transition = self.versions[index].apply(event, Utc::now())?;
        let effects = plan_effects(&transition, acknowledged);

        for effect in effects.iter().filter(|e| e.is_domain_effect()) {
            match effect {
                PostTransitionEffect::AcknowledgeDepositAgreement => {
                    self.deposit_agreement_acknowledged_at = Some(transition.at);
                }
                PostTransitionEffect::RefreshRepresentative => {}
            }
        }

        Ok(TransitionOutcome { transition, effects })
    }

    /// Delete a version row outright.
    ///
    /// Fails with `IrreversibleDeletion` for a published version unless
    /// `force` is set, and with `ConstraintViolation` for the only version.
    pub fn destroy_version(&mut self, version_number: u32, force: bool) -> CoreResult<Version> {
        let index = self.index_of(version_number)?;

        if self.versions[index].is_published() && !force {
            return Err(CoreError::IrreversibleDeletion { version_number });
        }
        if self.versions.len() == 1 {
            return Err(CoreError::constraint(format!(
                "cannot destroy the only version of work {}",
                self.id
            )));
        }

        Ok(self.versions.remove(index))
    }

    /// Checks whether the whole work may be deleted.
    pub fn ensure_deletable(&self, force: bool) -> CoreResult<()> {
        match self.latest_published_version() {
            Some(published) if !force => Err(CoreError::IrreversibleDeletion {
                version_number: published.version_number(),
            }),
            _ => Ok(()),
        }
    }

    fn index_of(&self, version_number: u32) -> CoreResult<usize> {
        self.versions
            .iter()
            .position(|v| v.version_number() == version_number)
            .ok_or(CoreError::VersionNotFound {
                work_id: self.id,
                version_number,
            })
    }
}

impl Permissioned for Work {
    fn ledger(&self) -> &AccessLedger {
        &self.ledger
    }

    fn ledger_mut(&mut self) -> &mut AccessLedger {
        &mut self.ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessLevel;
    use crate::lifecycle::VersionState;

    fn work() -> Work {
        Work::create(AgentId::generate(), serde_json::json!({"title": "Survey data"}))
    }

    #[test]
    fn test_create_starts_with_draft_and_depositor_edit() {
        let w = work();
        assert_eq!(w.versions().len(), 1);
        assert!(w.latest_version().is_draft());
        assert_eq!(
            w.ledger().level_of(AgentRef::User(w.depositor())),
            Some(AccessLevel::Edit)
        );
    }

    #[test]
    fn test_from_parts_rejects_empty_versions() {
        let id = WorkId::generate();
        let result = Work::from_parts(
            id,
            AgentId::generate(),
            Vec::new(),
            AccessLedger::new(ResourceRef::Work(id)),
            None,
            Utc::now(),
        );
        assert!(matches!(result, Err(CoreError::ConstraintViolation(_))));
    }

    #[test]
    fn test_from_parts_rejects_duplicate_numbers() {
        let id = WorkId::generate();
        let versions = vec![
            Version::draft(id, 1, serde_json::Value::Null),
            Version::draft(id, 1, serde_json::Value::Null),
        ];
        let result = Work::from_parts(
            id,
            AgentId::generate(),
            versions,
            AccessLedger::new(ResourceRef::Work(id)),
            None,
            Utc::now(),
        );
        assert!(matches!(result, Err(CoreError::ConstraintViolation(_))));
    }

    #[test]
    fn test_create_draft_numbers_after_latest() {
        let mut w = work();
        w.publish(1).unwrap();
        let v = w.create_draft(serde_json::Value::Null).unwrap();
        assert_eq!(v.version_number(), 2);
        assert!(v.is_draft());
    }

    #[test]
    fn test_first_publish_acknowledges_agreement_once() {
        let mut w = work();
        let first = w.publish(1).unwrap();
        assert!(first.acknowledged_agreement());
        let stamped = w.deposit_agreement_acknowledged_at();
        assert!(stamped.is_some());

        w.create_draft(serde_json::Value::Null).unwrap();
        let second = w.publish(2).unwrap();
        assert!(!second.acknowledged_agreement());
        assert_eq!(w.deposit_agreement_acknowledged_at(), stamped);
    }

    #[test]
    fn test_failed_publish_changes_nothing() {
        let mut w = work();
        w.publish(1).unwrap();
        let before = w.clone();

        let err = w.publish(1).unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidTransition {
                from: VersionState::Published,
                event: LifecycleEvent::Publish,
            }
        );
        assert_eq!(w, before);
    }

    #[test]
    fn test_destroy_published_requires_force() {
        let mut w = work();
        w.publish(1).unwrap();
        w.create_draft(serde_json::Value::Null).unwrap();

        assert_eq!(
            w.destroy_version(1, false),
            Err(CoreError::IrreversibleDeletion { version_number: 1 })
        );
        let destroyed = w.destroy_version(1, true).unwrap();
        assert_eq!(destroyed.version_number(), 1);
        assert_eq!(w.representative_version().unwrap().version_number(), 2);
    }

    #[test]
    fn test_destroyed_version_number_not_reused() {
        let mut w = work();
        w.publish(1).unwrap();
        w.create_draft(serde_json::Value::Null).unwrap();
        w.publish(2).unwrap();
        w.destroy_version(2, true).unwrap();

        let v = w.create_draft(serde_json::Value::Null).unwrap();
        assert_eq!(v.version_number(), 3);
        assert_eq!(w.highest_version_number(), 3);
    }

    #[test]
    fn test_highest_version_number_cannot_trail_versions() {
        let mut w = work();
        w.create_draft(serde_json::Value::Null).unwrap();
        assert!(matches!(
            w.clone().with_highest_version_number(1),
            Err(CoreError::ConstraintViolation(_))
        ));
        assert_eq!(w.with_highest_version_number(5).unwrap().highest_version_number(), 5);
    }

    #[test]
    fn test_destroy_last_version_is_constraint_violation() {
        let mut w = work();
        assert!(matches!(
            w.destroy_version(1, true),
            Err(CoreError::ConstraintViolation(_))
        ));
        assert_eq!(w.versions().len(), 1);
    }

    #[test]
    fn test_update_draft_rejects_published() {
        let mut w = work();
        w.update_draft(1, serde_json::json!({"title": "Renamed"})).unwrap();
        w.publish(1).unwrap();
        assert!(w.update_draft(1, serde_json::Value::Null).is_err());
        assert_eq!(w.version(1).unwrap().metadata()["title"], "Renamed");
    }

    #[test]
    fn test_ensure_deletable() {
        let mut w = work();
        assert!(w.ensure_deletable(false).is_ok());
        w.publish(1).unwrap();
        assert_eq!(
            w.ensure_deletable(false),
            Err(CoreError::IrreversibleDeletion { version_number: 1 })
        );
        assert!(w.ensure_deletable(true).is_ok());
    }

    #[test]
    fn test_unknown_version_number() {
        let mut w = work();
        assert_eq!(
            w.withdraw(7).unwrap_err(),
            CoreError::VersionNotFound { work_id: w.id(), version_number: 7 }
        );
    }
}

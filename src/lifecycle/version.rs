//! Version - one numbered revision of a work
//!
//! A version is created in `draft` and moves between states only through
//! [`LifecycleMachine`](super::LifecycleMachine). The state field is private;
//! the only mutator is the crate-internal [`Version::apply`], reached through
//! the work facade.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{LifecycleEvent, LifecycleMachine, VersionState};
use crate::errors::CoreResult;
use crate::ids::{VersionId, WorkId};

/// A single state change that has been applied to a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub version_id: VersionId,
    pub version_number: u32,
    pub event: LifecycleEvent,
    pub from: VersionState,
    pub to: VersionState,
    pub at: DateTime<Utc>,
}

/// A numbered revision of a work.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Version {
    id: VersionId,
    work_id: WorkId,
    version_number: u32,
    state: VersionState,
    /// Title, description etc. Opaque to the core.
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    published_at: Option<DateTime<Utc>>,
    withdrawn_at: Option<DateTime<Utc>>,
    removed_at: Option<DateTime<Utc>>,
}

impl Version {
    /// Creates a new draft version.
    pub(crate) fn draft(work_id: WorkId, version_number: u32, metadata: serde_json::Value) -> Self {
        Self {
            id: VersionId::generate(),
            work_id,
            version_number,
            state: VersionState::Draft,
            metadata,
            created_at: Utc::now(),
            published_at: None,
            withdrawn_at: None,
            removed_at: None,
        }
    }

    /// Rebuilds a version from persisted fields.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        id: VersionId,
        work_id: WorkId,
        version_number: u32,
        state: VersionState,
        metadata: serde_json::Value,
        created_at: DateTime<Utc>,
        published_at: Option<DateTime<Utc>>,
        withdrawn_at: Option<DateTime<Utc>>,
        removed_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            work_id,
            version_number,
            state,
            metadata,
            created_at,
            published_at,
            withdrawn_at,
            removed_at,
        }
    }

    #[inline]
    pub fn id(&self) -> VersionId {
        self.id
    }

    #[inline]
    pub fn work_id(&self) -> WorkId {
        self.work_id
    }

    #[inline]
    pub fn version_number(&self) -> u32 {
        self.version_number
    }

    #[inline]
    pub fn state(&self) -> VersionState {
        self.state
    }

    #[inline]
    pub fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }

    /// Replaces the metadata payload of a draft.
    ///
    /// Only drafts accept edits here; privileged edits of published
    /// content are a policy of the surrounding system.
    pub(crate) fn set_metadata(&mut self, metadata: serde_json::Value) -> bool {
        if self.state != VersionState::Draft {
            return false;
        }
        self.metadata = metadata;
        true
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }

    pub fn withdrawn_at(&self) -> Option<DateTime<Utc>> {
        self.withdrawn_at
    }

    pub fn removed_at(&self) -> Option<DateTime<Utc>> {
        self.removed_at
    }

    pub fn is_draft(&self) -> bool {
        self.state == VersionState::Draft
    }

    pub fn is_published(&self) -> bool {
        self.state == VersionState::Published
    }

    pub fn is_withdrawn(&self) -> bool {
        self.state == VersionState::Withdrawn
    }

    pub fn is_removed(&self) -> bool {
        self.state == VersionState::Removed
    }

    /// Checks whether `event` is legal without applying it.
    pub fn check(&self, event: LifecycleEvent) -> CoreResult<VersionState> {
        LifecycleMachine::transition(self.state, event)
    }

    /// Applies `event`, stamping the entry time of the new state.
    ///
    /// On error the version is left untouched.
    pub(crate) fn apply(&mut self, event: LifecycleEvent, at: DateTime<Utc>) -> CoreResult<Transition> {
        let to = self.check(event)?;
        let from = self.state;

        self.state = to;
        match to {
            VersionState::Published => self.published_at = Some(at),
            VersionState::Withdrawn => self.withdrawn_at = Some(at),
            VersionState::Removed => self.removed_at = Some(at),
            VersionState::Draft => {}
        }

        Ok(Transition {
            version_id: self.id,
            version_number: self.version_number,
            event,
            from,
            to,
            at,
        })
    }
}

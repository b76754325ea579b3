//! Persisted record layout
//!
//! ```text
//! Work(id, depositor, deposit_agreement_acknowledged_at, created_at,
//!      versions[], grants[])
//! Version(id, work_id, version_number, state, metadata, created_at,
//!         published_at, withdrawn_at, removed_at)
//! AccessGrant(agent, resource, level)   unique on (agent, resource)
//! ```
//!
//! Records are plain serde types. Converting a record into a [`Work`]
//! re-validates every invariant and fails before building anything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access::{AccessGrant, AccessLedger};
use crate::agent::{Group, User};
use crate::errors::CoreError;
use crate::ids::{AgentId, ResourceRef, VersionId, WorkId};
use crate::lifecycle::{Version, VersionState};
use crate::resource::{Permissioned, Work};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub id: VersionId,
    pub work_id: WorkId,
    pub version_number: u32,
    pub state: VersionState,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub withdrawn_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub removed_at: Option<DateTime<Utc>>,
}

impl From<&Version> for VersionRecord {
    fn from(v: &Version) -> Self {
        Self {
            id: v.id(),
            work_id: v.work_id(),
            version_number: v.version_number(),
            state: v.state(),
            metadata: v.metadata().clone(),
            created_at: v.created_at(),
            published_at: v.published_at(),
            withdrawn_at: v.withdrawn_at(),
            removed_at: v.removed_at(),
        }
    }
}

impl From<VersionRecord> for Version {
    fn from(r: VersionRecord) -> Self {
        Version::restore(
            r.id,
            r.work_id,
            r.version_number,
            r.state,
            r.metadata,
            r.created_at,
            r.published_at,
            r.withdrawn_at,
            r.removed_at,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkRecord {
    pub id: WorkId,
    pub depositor: AgentId,
    #[serde(default)]
    pub deposit_agreement_acknowledged_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub versions: Vec<VersionRecord>,
    #[serde(default)]
    pub grants: Vec<AccessGrant>,
    #[serde(default)]
    pub highest_version_number: Option<u32>,
}

impl From<&Work> for WorkRecord {
    fn from(work: &Work) -> Self {
        Self {
            id: work.id(),
            depositor: work.depositor(),
            deposit_agreement_acknowledged_at: work.deposit_agreement_acknowledged_at(),
            created_at: work.created_at(),
            versions: work.versions().iter().map(VersionRecord::from).collect(),
            grants: work.ledger().grants(),
            highest_version_number: Some(work.highest_version_number()),
        }
    }
}

impl TryFrom<WorkRecord> for Work {
    type Error = CoreError;

    fn try_from(record: WorkRecord) -> Result<Self, Self::Error> {
        let ledger = AccessLedger::from_grants(ResourceRef::Work(record.id), record.grants)?;
        let versions = record.versions.into_iter().map(Version::from).collect();
        let work = Work::from_parts(
            record.id,
            record.depositor,
            versions,
            ledger,
            record.deposit_agreement_acknowledged_at,
            record.created_at,
        )?;
        match record.highest_version_number {
            Some(highest) => work.with_highest_version_number(highest),
            None => Ok(work),
        }
    }
}

/// A full export: agents plus works.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub works: Vec<WorkRecord>,
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

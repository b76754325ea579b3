//! # Access Control Ledger
//!
//! The set of grants scoped to one resource.
//!
//! ## Invariants
//! - At most one grant per agent; a higher grant replaces a lower one
//! - Grant operations never downgrade an existing row
//! - Revoking a level deletes only that agent's row, and only at that level
//! - Bulk group replacement never touches user grants

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::level::{AccessLevel, VisibilityTier};
use crate::agent::AgentRef;
use crate::errors::{CoreError, CoreResult};
use crate::ids::{AgentId, ResourceRef};

/// One row binding an agent to a resource at a level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub agent: AgentRef,
    pub resource: ResourceRef,
    pub level: AccessLevel,
}

/// Grants held on a single resource, keyed by agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLedger {
    resource: ResourceRef,
    grants: BTreeMap<AgentRef, AccessLevel>,
}

impl AccessLedger {
    /// An empty ledger. The resource is fully private.
    pub fn new(resource: ResourceRef) -> Self {
        Self {
            resource,
            grants: BTreeMap::new(),
        }
    }

    /// Rebuild a ledger from persisted rows.
    ///
    /// Rejects rows for another resource and duplicate agents before
    /// building anything.
    pub fn from_grants(resource: ResourceRef, rows: Vec<AccessGrant>) -> CoreResult<Self> {
        let mut grants = BTreeMap::new();
        for row in rows {
            if row.resource != resource {
                return Err(CoreError::constraint(format!(
                    "grant for {} loaded into ledger of {}",
                    row.resource, resource
                )));
            }
            if grants.insert(row.agent, row.level).is_some() {
                return Err(CoreError::constraint(format!(
                    "duplicate grant for {} on {}",
                    row.agent, resource
                )));
            }
        }
        Ok(Self { resource, grants })
    }

    #[inline]
    pub fn resource(&self) -> ResourceRef {
        self.resource
    }

    /// The level stored directly for `agent`, ignoring memberships.
    #[inline]
    pub fn level_of(&self, agent: AgentRef) -> Option<AccessLevel> {
        self.grants.get(&agent).copied()
    }

    pub fn grants(&self) -> Vec<AccessGrant> {
        self.grants
            .iter()
            .map(|(agent, level)| AccessGrant {
                agent: *agent,
                resource: self.resource,
                level: *level,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    // ==================
    // Per-agent grants
    // ==================

    /// Grant `level` to `agent`. Returns true if the row changed.
    pub fn grant(&mut self, agent: AgentRef, level: AccessLevel) -> bool {
        match level {
            AccessLevel::Discover => self.grant_discover(agent),
            AccessLevel::Read => self.grant_read(agent),
            AccessLevel::Edit => self.grant_edit(agent),
        }
    }

    /// Revoke exactly `level` from `agent`. Returns true if a row was deleted.
    pub fn revoke(&mut self, agent: AgentRef, level: AccessLevel) -> bool {
        self.revoke_exact(agent, level)
    }

    pub fn grant_discover(&mut self, agent: AgentRef) -> bool {
        self.raise(agent, AccessLevel::Discover)
    }

    pub fn grant_read(&mut self, agent: AgentRef) -> bool {
        self.raise(agent, AccessLevel::Read)
    }

    pub fn grant_edit(&mut self, agent: AgentRef) -> bool {
        self.raise(agent, AccessLevel::Edit)
    }

    pub fn revoke_discover(&mut self, agent: AgentRef) -> bool {
        self.revoke_exact(agent, AccessLevel::Discover)
    }

    pub fn revoke_read(&mut self, agent: AgentRef) -> bool {
        self.revoke_exact(agent, AccessLevel::Read)
    }

    pub fn revoke_edit(&mut self, agent: AgentRef) -> bool {
        self.revoke_exact(agent, AccessLevel::Edit)
    }

    /// Delete the agent's row whatever its level.
    pub fn revoke_all(&mut self, agent: AgentRef) -> bool {
        self.grants.remove(&agent).is_some()
    }

    fn raise(&mut self, agent: AgentRef, level: AccessLevel) -> bool {
        if self.grants.get(&agent).is_some_and(|current| *current >= level) {
            return false;
        }
        self.grants.insert(agent, level);
        true
    }

    fn revoke_exact(&mut self, agent: AgentRef, level: AccessLevel) -> bool {
        if self.grants.get(&agent) == Some(&level) {
            self.grants.remove(&agent);
            true
        } else {
            false
        }
    }

    /// Store exactly `level` for `agent`, downgrading if necessary.
    fn set_exact(&mut self, agent: AgentRef, level: AccessLevel) -> bool {
        self.grants.insert(agent, level) != Some(level)
    }

    // ==================
    // Singleton-group tiers
    // ==================

    pub fn grant_open_access(&mut self) -> bool {
        self.grant_read(AgentRef::PUBLIC)
    }

    pub fn revoke_open_access(&mut self) -> bool {
        self.revoke_all(AgentRef::PUBLIC)
    }

    /// Grant `authorized` read and keep the resource discoverable by
    /// anonymous visitors through a separate `public` discover row.
    pub fn grant_authorized_access(&mut self) -> bool {
        let authorized = self.grant_read(AgentRef::AUTHORIZED);
        let public = self.grant_discover(AgentRef::PUBLIC);
        authorized || public
    }

    /// Deletes the `authorized` row only; any `public` row stays.
    pub fn revoke_authorized_access(&mut self) -> bool {
        self.revoke_all(AgentRef::AUTHORIZED)
    }

    pub fn open_access(&self) -> bool {
        self.level_of(AgentRef::PUBLIC)
            .is_some_and(|l| l.satisfies(AccessLevel::Read))
    }

    pub fn authorized_access(&self) -> bool {
        self.level_of(AgentRef::AUTHORIZED)
            .is_some_and(|l| l.satisfies(AccessLevel::Read))
    }

    pub fn visibility(&self) -> VisibilityTier {
        if self.open_access() {
            VisibilityTier::Open
        } else if self.authorized_access() {
            VisibilityTier::Authorized
        } else {
            VisibilityTier::Private
        }
    }

    /// Rewrite the singleton-group rows so the ledger lands on `tier`.
    ///
    /// - open: `public` read, no `authorized` row
    /// - authorized: `authorized` read, `public` discover
    /// - private: neither singleton group holds a row
    pub fn set_visibility(&mut self, tier: VisibilityTier) -> bool {
        match tier {
            VisibilityTier::Open => {
                let authorized = self.revoke_all(AgentRef::AUTHORIZED);
                let public = self.set_exact(AgentRef::PUBLIC, AccessLevel::Read);
                authorized || public
            }
            VisibilityTier::Authorized => {
                let authorized = self.set_exact(AgentRef::AUTHORIZED, AccessLevel::Read);
                let public = self.set_exact(AgentRef::PUBLIC, AccessLevel::Discover);
                authorized || public
            }
            VisibilityTier::Private => {
                let authorized = self.revoke_all(AgentRef::AUTHORIZED);
                let public = self.revoke_all(AgentRef::PUBLIC);
                authorized || public
            }
        }
    }

    // ==================
    // Bulk group replacement
    // ==================

    pub fn set_discover_groups<I: IntoIterator<Item = AgentId>>(&mut self, groups: I) {
        self.set_groups_at(AccessLevel::Discover, groups);
    }

    pub fn set_read_groups<I: IntoIterator<Item = AgentId>>(&mut self, groups: I) {
        self.set_groups_at(AccessLevel::Read, groups);
    }

    pub fn set_edit_groups<I: IntoIterator<Item = AgentId>>(&mut self, groups: I) {
        self.set_groups_at(AccessLevel::Edit, groups);
    }

    fn set_groups_at<I: IntoIterator<Item = AgentId>>(&mut self, level: AccessLevel, groups: I) {
        let wanted: BTreeSet<AgentId> = groups.into_iter().collect();

        self.grants.retain(|agent, held| match agent {
            AgentRef::Group(id) => *held != level || wanted.contains(id),
            AgentRef::User(_) => true,
        });
        for id in wanted {
            self.raise(AgentRef::Group(id), level);
        }
    }

    pub fn discover_groups(&self) -> Vec<AgentId> {
        self.agents_at(AccessLevel::Discover, true)
    }

    pub fn read_groups(&self) -> Vec<AgentId> {
        self.agents_at(AccessLevel::Read, true)
    }

    pub fn edit_groups(&self) -> Vec<AgentId> {
        self.agents_at(AccessLevel::Edit, true)
    }

    pub fn discover_users(&self) -> Vec<AgentId> {
        self.agents_at(AccessLevel::Discover, false)
    }

    pub fn read_users(&self) -> Vec<AgentId> {
        self.agents_at(AccessLevel::Read, false)
    }

    pub fn edit_users(&self) -> Vec<AgentId> {
        self.agents_at(AccessLevel::Edit, false)
    }

    /// Agents holding exactly `level`.
    fn agents_at(&self, level: AccessLevel, groups: bool) -> Vec<AgentId> {
        self.grants
            .iter()
            .filter(|(agent, held)| agent.is_group() == groups && **held == level)
            .map(|(agent, _)| agent.id())
            .collect()
    }
}

//! # Permissioned resources
//!
//! One trait for every resource type that owns an access ledger. All grant
//! logic lives in [`AccessLedger`] and [`AccessEngine`]; implementors only
//! expose their ledger.

use crate::access::{AccessEngine, AccessLedger, AccessLevel, VisibilityTier};
use crate::agent::{AgentRef, Principal};
use crate::errors::CoreResult;
use crate::ids::{AgentId, ResourceRef};

pub trait Permissioned {
    fn ledger(&self) -> &AccessLedger;

    fn ledger_mut(&mut self) -> &mut AccessLedger;

    fn resource_ref(&self) -> ResourceRef {
        self.ledger().resource()
    }

    // Decisions

    fn effective_level(
        &self,
        engine: &AccessEngine<'_>,
        principal: &Principal,
    ) -> CoreResult<Option<AccessLevel>> {
        engine.effective_level(principal, self.ledger())
    }

    fn discover_access(&self, engine: &AccessEngine<'_>, principal: &Principal) -> CoreResult<bool> {
        engine.discover_access(principal, self.ledger())
    }

    fn read_access(&self, engine: &AccessEngine<'_>, principal: &Principal) -> CoreResult<bool> {
        engine.read_access(principal, self.ledger())
    }

    fn edit_access(&self, engine: &AccessEngine<'_>, principal: &Principal) -> CoreResult<bool> {
        engine.edit_access(principal, self.ledger())
    }

    fn open_access(&self) -> bool {
        self.ledger().open_access()
    }

    fn authorized_access(&self) -> bool {
        self.ledger().authorized_access()
    }

    fn visibility(&self) -> VisibilityTier {
        self.ledger().visibility()
    }

    // Mutators

    fn grant_discover(&mut self, agent: AgentRef) -> bool {
        self.ledger_mut().grant_discover(agent)
    }

    fn grant_read(&mut self, agent: AgentRef) -> bool {
        self.ledger_mut().grant_read(agent)
    }

    fn grant_edit(&mut self, agent: AgentRef) -> bool {
        self.ledger_mut().grant_edit(agent)
    }

    fn revoke_discover(&mut self, agent: AgentRef) -> bool {
        self.ledger_mut().revoke_discover(agent)
    }

    fn revoke_read(&mut self, agent: AgentRef) -> bool {
        self.ledger_mut().revoke_read(agent)
    }

    fn revoke_edit(&mut self, agent: AgentRef) -> bool {
        self.ledger_mut().revoke_edit(agent)
    }

    fn grant_open_access(&mut self) -> bool {
        self.ledger_mut().grant_open_access()
    }

    fn revoke_open_access(&mut self) -> bool {
        self.ledger_mut().revoke_open_access()
    }

    fn grant_authorized_access(&mut self) -> bool {
        self.ledger_mut().grant_authorized_access()
    }

    fn revoke_authorized_access(&mut self) -> bool {
        self.ledger_mut().revoke_authorized_access()
    }

    fn set_visibility(&mut self, tier: VisibilityTier) -> bool {
        self.ledger_mut().set_visibility(tier)
    }

    fn set_read_groups(&mut self, groups: Vec<AgentId>) {
        self.ledger_mut().set_read_groups(groups)
    }

    fn set_discover_groups(&mut self, groups: Vec<AgentId>) {
        self.ledger_mut().set_discover_groups(groups)
    }

    fn set_edit_groups(&mut self, groups: Vec<AgentId>) {
        self.ledger_mut().set_edit_groups(groups)
    }
}

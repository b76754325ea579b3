//! # Access Engine
//!
//! The single source of truth for "can agent X do Y on resource Z".
//!
//! ## Decision Rule
//!
//! The effective level is the maximum of:
//! 1. the agent's own row on the resource
//! 2. rows for every group the agent belongs to, with `public` always
//!    counted and `authorized` counted for authenticated non-guest users
//! 3. `edit` if the agent is an admin
//!
//! Checks are thresholds against that maximum, so `edit` satisfies `read`
//! and `read` satisfies `discover` regardless of how rows were written.

use tracing::trace;

use super::ledger::AccessLedger;
use super::level::{level_label, AccessLevel};
use crate::agent::{AgentDirectory, AgentRef, Principal};
use crate::errors::{CoreError, CoreResult};

/// Stateless evaluator bound to a directory for membership lookups.
pub struct AccessEngine<'a> {
    directory: &'a dyn AgentDirectory,
}

impl<'a> AccessEngine<'a> {
    pub fn new(directory: &'a dyn AgentDirectory) -> Self {
        Self { directory }
    }

    /// Computes the effective level, `None` meaning no access.
    ///
    /// A user id unknown to the directory is an error rather than a silent
    /// downgrade to anonymous.
    pub fn effective_level(
        &self,
        principal: &Principal,
        ledger: &AccessLedger,
    ) -> CoreResult<Option<AccessLevel>> {
        let mut best = ledger.level_of(AgentRef::PUBLIC);

        match principal {
            Principal::Anonymous => {}
            Principal::Agent(group @ AgentRef::Group(_)) => {
                best = best.max(ledger.level_of(*group));
            }
            Principal::Agent(agent @ AgentRef::User(id)) => {
                let user = self
                    .directory
                    .find_user(*id)?
                    .ok_or(CoreError::UnknownAgent(*id))?;

                if user.admin {
                    best = Some(AccessLevel::Edit);
                } else {
                    best = best.max(ledger.level_of(*agent));
                    if !user.guest {
                        best = best.max(ledger.level_of(AgentRef::AUTHORIZED));
                    }
                    for group in &user.groups {
                        best = best.max(ledger.level_of(AgentRef::Group(*group)));
                    }
                }
            }
        }

        trace!(
            event = "ACCESS_EVALUATED",
            principal = %principal,
            resource = %ledger.resource(),
            level = level_label(best),
        );
        Ok(best)
    }

    pub fn has_access(
        &self,
        principal: &Principal,
        ledger: &AccessLedger,
        required: AccessLevel,
    ) -> CoreResult<bool> {
        Ok(self
            .effective_level(principal, ledger)?
            .is_some_and(|level| level.satisfies(required)))
    }

    pub fn discover_access(&self, principal: &Principal, ledger: &AccessLedger) -> CoreResult<bool> {
        self.has_access(principal, ledger, AccessLevel::Discover)
    }

    pub fn read_access(&self, principal: &Principal, ledger: &AccessLedger) -> CoreResult<bool> {
        self.has_access(principal, ledger, AccessLevel::Read)
    }

    pub fn edit_access(&self, principal: &Principal, ledger: &AccessLedger) -> CoreResult<bool> {
        self.has_access(principal, ledger, AccessLevel::Edit)
    }

    /// Like [`has_access`](Self::has_access) but fails with `Unauthorized`.
    pub fn require(
        &self,
        principal: &Principal,
        ledger: &AccessLedger,
        required: AccessLevel,
        action: &str,
    ) -> CoreResult<()> {
        if self.has_access(principal, ledger, required)? {
            Ok(())
        } else {
            Err(CoreError::Unauthorized(format!("{} {}", action, ledger.resource())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{InMemoryAgentDirectory, User};
    use crate::ids::{AgentId, ResourceRef, WorkId};

    fn ledger() -> AccessLedger {
        AccessLedger::new(ResourceRef::Work(WorkId::generate()))
    }

    #[test]
    fn test_public_discover_only() {
        let dir = InMemoryAgentDirectory::new();
        let engine = AccessEngine::new(&dir);
        let mut l = ledger();
        l.grant_discover(AgentRef::PUBLIC);

        assert!(engine.discover_access(&Principal::Anonymous, &l).unwrap());
        assert!(!engine.read_access(&Principal::Anonymous, &l).unwrap());
    }

    #[test]
    fn test_group_edit_implies_read_and_discover() {
        let dir = InMemoryAgentDirectory::new();
        let group = dir.create_group("curators").unwrap();
        let user = dir.create_user("jdoe").unwrap();
        dir.add_member(group.id, user.id).unwrap();

        let mut l = ledger();
        l.grant_edit(AgentRef::Group(group.id));

        let engine = AccessEngine::new(&dir);
        let p = Principal::user(user.id);
        assert!(engine.edit_access(&p, &l).unwrap());
        assert!(engine.read_access(&p, &l).unwrap());
        assert!(engine.discover_access(&p, &l).unwrap());
    }

    #[test]
    fn test_authorized_excludes_anonymous_and_guests() {
        let dir = InMemoryAgentDirectory::new();
        let member = dir.create_user("jdoe").unwrap();
        let guest = User::guest("visitor");
        dir.insert_user(guest.clone()).unwrap();

        let mut l = ledger();
        l.grant_authorized_access();

        let engine = AccessEngine::new(&dir);
        assert!(engine.read_access(&Principal::user(member.id), &l).unwrap());
        assert!(!engine.read_access(&Principal::user(guest.id), &l).unwrap());
        assert!(engine.discover_access(&Principal::user(guest.id), &l).unwrap());
        assert!(!engine.read_access(&Principal::Anonymous, &l).unwrap());
    }

    #[test]
    fn test_empty_ledger_is_private_except_for_admins() {
        let dir = InMemoryAgentDirectory::new();
        let user = dir.create_user("jdoe").unwrap();
        let admin = dir.create_admin("root").unwrap();
        let l = ledger();

        let engine = AccessEngine::new(&dir);
        assert_eq!(engine.effective_level(&Principal::Anonymous, &l).unwrap(), None);
        assert_eq!(engine.effective_level(&Principal::user(user.id), &l).unwrap(), None);
        assert_eq!(
            engine.effective_level(&Principal::user(admin.id), &l).unwrap(),
            Some(AccessLevel::Edit)
        );
    }

    #[test]
    fn test_revoke_edit_falls_back_to_group_read() {
        let dir = InMemoryAgentDirectory::new();
        let group = dir.create_group("readers").unwrap();
        let user = dir.create_user("jdoe").unwrap();
        dir.add_member(group.id, user.id).unwrap();

        let mut l = ledger();
        l.grant_read(AgentRef::Group(group.id));
        l.grant_edit(AgentRef::User(user.id));

        let engine = AccessEngine::new(&dir);
        let p = Principal::user(user.id);
        assert_eq!(engine.effective_level(&p, &l).unwrap(), Some(AccessLevel::Edit));

        l.revoke_edit(AgentRef::User(user.id));
        assert_eq!(engine.effective_level(&p, &l).unwrap(), Some(AccessLevel::Read));
    }

    #[test]
    fn test_revoke_edit_same_agent_keeps_only_group_and_public_rows() {
        let dir = InMemoryAgentDirectory::new();
        let group = dir.create_group("readers").unwrap();
        let user = dir.create_user("jdoe").unwrap();
        let mut l = ledger();
        let p = Principal::user(user.id);
        let engine = AccessEngine::new(&dir);

        l.grant_read(AgentRef::User(user.id));
        l.grant_edit(AgentRef::User(user.id));
        l.revoke_edit(AgentRef::User(user.id));
        assert_eq!(engine.effective_level(&p, &l).unwrap(), None);

        l.grant_discover(AgentRef::PUBLIC);
        assert_eq!(engine.effective_level(&p, &l).unwrap(), Some(AccessLevel::Discover));

        dir.add_member(group.id, user.id).unwrap();
        l.grant_read(AgentRef::Group(group.id));
        l.grant_edit(AgentRef::User(user.id));
        l.revoke_edit(AgentRef::User(user.id));
        assert_eq!(engine.effective_level(&p, &l).unwrap(), Some(AccessLevel::Read));
    }

    #[test]
    fn test_group_principal_uses_own_row_and_public() {
        let dir = InMemoryAgentDirectory::new();
        let group = dir.create_group("curators").unwrap();
        let mut l = ledger();
        l.grant_authorized_access();

        let engine = AccessEngine::new(&dir);
        let p = Principal::group(group.id);
        assert_eq!(engine.effective_level(&p, &l).unwrap(), Some(AccessLevel::Discover));

        l.grant_edit(AgentRef::Group(group.id));
        assert_eq!(engine.effective_level(&p, &l).unwrap(), Some(AccessLevel::Edit));
    }

    #[test]
    fn test_unknown_user_is_reported() {
        let dir = InMemoryAgentDirectory::new();
        let engine = AccessEngine::new(&dir);
        let ghost = AgentId::generate();

        assert_eq!(
            engine.effective_level(&Principal::user(ghost), &ledger()),
            Err(CoreError::UnknownAgent(ghost))
        );
    }

    #[test]
    fn test_require_reports_unauthorized() {
        let dir = InMemoryAgentDirectory::new();
        let engine = AccessEngine::new(&dir);
        let mut l = ledger();
        l.grant_open_access();

        assert!(engine.require(&Principal::Anonymous, &l, AccessLevel::Read, "read").is_ok());
        assert!(matches!(
            engine.require(&Principal::Anonymous, &l, AccessLevel::Edit, "edit"),
            Err(CoreError::Unauthorized(_))
        ));
    }
}

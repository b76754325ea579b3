//! # Collection
//!
//! A curated grouping of works. Carries its own access ledger; permissions
//! on a collection do not propagate to the works in it.

use chrono::{DateTime, Utc};

use super::Permissioned;
use crate::access::AccessLedger;
use crate::agent::AgentRef;
use crate::ids::{CollectionId, ResourceRef};

#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    id: CollectionId,
    title: String,
    ledger: AccessLedger,
    created_at: DateTime<Utc>,
}

impl Collection {
    /// Create a collection administered (edit) by `owner`.
    pub fn new(title: impl Into<String>, owner: AgentRef) -> Self {
        let id = CollectionId::generate();
        let mut ledger = AccessLedger::new(ResourceRef::Collection(id));
        ledger.grant_edit(owner);

        Self {
            id,
            title: title.into(),
            ledger,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> CollectionId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Permissioned for Collection {
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
    use crate::access::{AccessEngine, VisibilityTier};
    use crate::agent::{InMemoryAgentDirectory, Principal};

    #[test]
    fn test_collection_shares_permission_engine() {
        let dir = InMemoryAgentDirectory::new();
        let owner = dir.create_user("curator").unwrap();
        let submitters = dir.create_group("submitters").unwrap();
        let member = dir.create_user("jdoe").unwrap();
        dir.add_member(submitters.id, member.id).unwrap();

        let mut c = Collection::new("Research Data", AgentRef::User(owner.id));
        c.set_read_groups(vec![submitters.id]);
        c.grant_authorized_access();

        let engine = AccessEngine::new(&dir);
        assert!(c.edit_access(&engine, &Principal::user(owner.id)).unwrap());
        assert!(c.read_access(&engine, &Principal::user(member.id)).unwrap());
        assert!(!c.edit_access(&engine, &Principal::user(member.id)).unwrap());
        assert!(c.discover_access(&engine, &Principal::Anonymous).unwrap());
        assert_eq!(c.visibility(), VisibilityTier::Authorized);
        assert!(matches!(c.resource_ref(), ResourceRef::Collection(_)));
    }
}

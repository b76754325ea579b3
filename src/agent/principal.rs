//! # Principals
//!
//! Users, groups, and the reference types the access ledger keys on.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::AgentId;

/// An individual account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: AgentId,

    /// Login identifier (unique)
    pub uid: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Admins hold `edit` on every resource
    #[serde(default)]
    pub admin: bool,

    /// Guest accounts are authenticated but do not count as `authorized`
    #[serde(default)]
    pub guest: bool,

    /// Explicit group memberships (never the singleton groups)
    #[serde(default)]
    pub groups: BTreeSet<AgentId>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            id: AgentId::generate(),
            uid: uid.into(),
            display_name: None,
            admin: false,
            guest: false,
            groups: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    pub fn admin(uid: impl Into<String>) -> Self {
        Self {
            admin: true,
            ..Self::new(uid)
        }
    }

    pub fn guest(uid: impl Into<String>) -> Self {
        Self {
            guest: true,
            ..Self::new(uid)
        }
    }

    pub fn is_member_of(&self, group: AgentId) -> bool {
        self.groups.contains(&group)
    }
}

/// A named collection of users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: AgentId,

    /// Unique across the directory
    pub name: String,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: AgentId::generate(),
            name: name.into(),
        }
    }

    pub(crate) fn singleton(id: AgentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn is_singleton(&self) -> bool {
        self.id.is_singleton()
    }
}

/// The holder side of an access grant.
///
/// Carries the agent kind so that bulk group replacement never touches
/// user grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum AgentRef {
    User(AgentId),
    Group(AgentId),
}

impl AgentRef {
    pub const PUBLIC: AgentRef = AgentRef::Group(AgentId::PUBLIC);
    pub const AUTHORIZED: AgentRef = AgentRef::Group(AgentId::AUTHORIZED);

    #[inline]
    pub fn id(&self) -> AgentId {
        match self {
            AgentRef::User(id) | AgentRef::Group(id) => *id,
        }
    }

    #[inline]
    pub fn is_group(&self) -> bool {
        matches!(self, AgentRef::Group(_))
    }
}

impl From<&User> for AgentRef {
    fn from(user: &User) -> Self {
        AgentRef::User(user.id)
    }
}

impl From<&Group> for AgentRef {
    fn from(group: &Group) -> Self {
        AgentRef::Group(group.id)
    }
}

impl fmt::Display for AgentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentRef::User(id) => write!(f, "user:{}", id),
            AgentRef::Group(id) => write!(f, "group:{}", id),
        }
    }
}

/// Who is asking. Carried with every access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    /// Not logged in. Matches only `public`.
    Anonymous,
    /// A specific user or group.
    Agent(AgentRef),
}

impl Principal {
    pub fn user(id: AgentId) -> Self {
        Principal::Agent(AgentRef::User(id))
    }

    pub fn group(id: AgentId) -> Self {
        Principal::Agent(AgentRef::Group(id))
    }

    pub fn agent(&self) -> Option<AgentRef> {
        match self {
            Principal::Anonymous => None,
            Principal::Agent(agent) => Some(*agent),
        }
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Principal::user(user.id)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::Anonymous => write!(f, "anonymous"),
            Principal::Agent(agent) => write!(f, "{}", agent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_ref_orders_users_before_groups() {
        let u = AgentRef::User(AgentId::generate());
        assert!(u < AgentRef::PUBLIC);
    }

    #[test]
    fn test_user_deserializes_with_defaults() {
        let id = AgentId::generate();
        let json = serde_json::json!({ "id": id, "uid": "jdoe" });
        let user: User = serde_json::from_value(json).unwrap();

        assert_eq!(user.uid, "jdoe");
        assert!(!user.admin);
        assert!(!user.guest);
        assert!(user.groups.is_empty());
    }

    #[test]
    fn test_principal_from_user() {
        let user = User::new("jdoe");
        assert_eq!(Principal::from(&user).agent(), Some(AgentRef::User(user.id)));
        assert_eq!(Principal::Anonymous.agent(), None);
    }
}

//! # Agent Directory
//!
//! Lookup of users, groups and memberships. The two singleton groups are
//! seeded when the directory is created and are never created again.

use std::collections::BTreeMap;
use std::sync::RwLock;

use tracing::debug;

use super::principal::{Group, User};
use crate::errors::{CoreError, CoreResult};
use crate::ids::AgentId;

/// Default name of the group matching every request.
pub const PUBLIC_GROUP_NAME: &str = "public";

/// Default name of the group matching every authenticated user.
pub const AUTHORIZED_GROUP_NAME: &str = "authorized";

/// Directory trait
///
/// Abstracts agent storage for the access engine.
pub trait AgentDirectory: Send + Sync {
    fn find_user(&self, id: AgentId) -> CoreResult<Option<User>>;

    fn find_user_by_uid(&self, uid: &str) -> CoreResult<Option<User>>;

    fn find_group(&self, id: AgentId) -> CoreResult<Option<Group>>;

    fn find_group_by_name(&self, name: &str) -> CoreResult<Option<Group>>;

    /// Explicit group memberships of a user.
    ///
    /// The singleton groups are implicit and never listed here.
    fn groups_for(&self, user: AgentId) -> CoreResult<Vec<AgentId>> {
        Ok(self
            .find_user(user)?
            .map(|u| u.groups.into_iter().collect())
            .unwrap_or_default())
    }
}

#[derive(Debug, Default)]
struct DirectoryState {
    users: BTreeMap<AgentId, User>,
    groups: BTreeMap<AgentId, Group>,
}

/// In-memory agent directory
#[derive(Debug)]
pub struct InMemoryAgentDirectory {
    state: RwLock<DirectoryState>,
}

impl InMemoryAgentDirectory {
    /// Create a directory seeded with the singleton groups under their
    /// default names.
    pub fn new() -> Self {
        Self::with_singleton_names(PUBLIC_GROUP_NAME, AUTHORIZED_GROUP_NAME)
    }

    /// Create a directory whose singleton groups carry custom display names.
    pub fn with_singleton_names(public_name: &str, authorized_name: &str) -> Self {
        let mut state = DirectoryState::default();
        for group in [
            Group::singleton(AgentId::PUBLIC, public_name),
            Group::singleton(AgentId::AUTHORIZED, authorized_name),
        ] {
            state.groups.insert(group.id, group);
        }
        Self {
            state: RwLock::new(state),
        }
    }

    /// Load users and groups. Groups are inserted first so memberships
    /// resolve.
    ///
    /// Singleton groups in `groups` are skipped; they already exist.
    pub fn load(&self, users: Vec<User>, groups: Vec<Group>) -> CoreResult<()> {
        for group in groups.into_iter().filter(|g| !g.is_singleton()) {
            self.insert_group(group)?;
        }
        for user in users {
            self.insert_user(user)?;
        }
        Ok(())
    }

    pub fn create_user(&self, uid: &str) -> CoreResult<User> {
        let user = User::new(uid);
        self.insert_user(user.clone())?;
        Ok(user)
    }

    pub fn create_admin(&self, uid: &str) -> CoreResult<User> {
        let user = User::admin(uid);
        self.insert_user(user.clone())?;
        Ok(user)
    }

    /// Insert a fully formed user. Memberships must name existing,
    /// non-singleton groups.
    pub fn insert_user(&self, user: User) -> CoreResult<()> {
        let mut state = self.state.write().map_err(|_| CoreError::poisoned("directory"))?;

        if state.users.contains_key(&user.id) {
            return Err(CoreError::constraint(format!("user id {} already exists", user.id)));
        }
        if state.users.values().any(|u| u.uid == user.uid) {
            return Err(CoreError::constraint(format!("uid '{}' already exists", user.uid)));
        }
        for group in &user.groups {
            match state.groups.get(group) {
                Some(g) if g.is_singleton() => {
                    return Err(CoreError::constraint(format!(
                        "membership in singleton group '{}' is implicit",
                        g.name
                    )))
                }
                Some(_) => {}
                None => return Err(CoreError::UnknownAgent(*group)),
            }
        }

        debug!(event = "USER_CREATED", uid = %user.uid, admin = user.admin);
        state.users.insert(user.id, user);
        Ok(())
    }

    pub fn create_group(&self, name: &str) -> CoreResult<Group> {
        let group = Group::new(name);
        self.insert_group(group.clone())?;
        Ok(group)
    }

    fn insert_group(&self, group: Group) -> CoreResult<()> {
        let mut state = self.state.write().map_err(|_| CoreError::poisoned("directory"))?;

        if state.groups.contains_key(&group.id) {
            return Err(CoreError::constraint(format!("group id {} already exists", group.id)));
        }
        if state.groups.values().any(|g| g.name == group.name) {
            return Err(CoreError::constraint(format!(
                "group name '{}' already exists",
                group.name
            )));
        }

        debug!(event = "GROUP_CREATED", name = %group.name);
        state.groups.insert(group.id, group);
        Ok(())
    }

    pub fn add_member(&self, group: AgentId, user: AgentId) -> CoreResult<()> {
        let mut state = self.state.write().map_err(|_| CoreError::poisoned("directory"))?;

        match state.groups.get(&group) {
            Some(g) if g.is_singleton() => {
                return Err(CoreError::constraint(format!(
                    "membership in singleton group '{}' is implicit",
                    g.name
                )))
            }
            Some(_) => {}
            None => return Err(CoreError::UnknownAgent(group)),
        }

        let member = state.users.get_mut(&user).ok_or(CoreError::UnknownAgent(user))?;
        member.groups.insert(group);
        Ok(())
    }

    pub fn remove_member(&self, group: AgentId, user: AgentId) -> CoreResult<()> {
        let mut state = self.state.write().map_err(|_| CoreError::poisoned("directory"))?;
        let member = state.users.get_mut(&user).ok_or(CoreError::UnknownAgent(user))?;
        member.groups.remove(&group);
        Ok(())
    }

    pub fn set_admin(&self, user: AgentId, admin: bool) -> CoreResult<()> {
        let mut state = self.state.write().map_err(|_| CoreError::poisoned("directory"))?;
        let target = state.users.get_mut(&user).ok_or(CoreError::UnknownAgent(user))?;
        target.admin = admin;
        Ok(())
    }

    pub fn users(&self) -> CoreResult<Vec<User>> {
        let state = self.state.read().map_err(|_| CoreError::poisoned("directory"))?;
        Ok(state.users.values().cloned().collect())
    }

    pub fn groups(&self) -> CoreResult<Vec<Group>> {
        let state = self.state.read().map_err(|_| CoreError::poisoned("directory"))?;
        Ok(state.groups.values().cloned().collect())
    }
}

impl Default for InMemoryAgentDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentDirectory for InMemoryAgentDirectory {
    fn find_user(&self, id: AgentId) -> CoreResult<Option<User>> {
        let state = self.state.read().map_err(|_| CoreError::poisoned("directory"))?;
        Ok(state.users.get(&id).cloned())
    }

    fn find_user_by_uid(&self, uid: &str) -> CoreResult<Option<User>> {
        let state = self.state.read().map_err(|_| CoreError::poisoned("directory"))?;
        Ok(state.users.values().find(|u| u.uid == uid).cloned())
    }

    fn find_group(&self, id: AgentId) -> CoreResult<Option<Group>> {
        let state = self.state.read().map_err(|_| CoreError::poisoned("directory"))?;
        Ok(state.groups.get(&id).cloned())
    }

    fn find_group_by_name(&self, name: &str) -> CoreResult<Option<Group>> {
        let state = self.state.read().map_err(|_| CoreError::poisoned("directory"))?;
        Ok(state.groups.values().find(|g| g.name == name).cloned())
    }
}

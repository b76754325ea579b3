//! # Agent Directory
//!
//! Principals that can hold access grants: individual users and groups,
//! plus the `public` and `authorized` singleton groups.

mod directory;
mod principal;

pub use directory::{
    AgentDirectory, InMemoryAgentDirectory, AUTHORIZED_GROUP_NAME, PUBLIC_GROUP_NAME,
};
pub use principal::{AgentRef, Group, Principal, User};

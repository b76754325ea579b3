//! depositum - versioned research deposits with access control
//!
//! A work is deposited as a numbered series of versions. Each version moves
//! through `draft -> published -> withdrawn -> removed` under an explicit
//! transition table, and one version is chosen to represent the work. Who
//! may find, read or edit a work is decided from discover/read/edit grants
//! held by users, groups and the `public`/`authorized` singleton groups.
//!
//! # Layout
//!
//! - `lifecycle` - version states, the transition table, resolution
//! - `agent` - users, groups, the agent directory
//! - `access` - grant ledger, visibility tiers, the decision engine
//! - `resource` - `Work` and `Collection` over a shared `Permissioned` trait
//! - `store` - transactional work storage and the snapshot format
//! - `repository` - audited, authorized operations over all of the above

pub mod access;
pub mod agent;
pub mod cli;
pub mod config;
pub mod errors;
pub mod ids;
pub mod lifecycle;
pub mod observability;
pub mod repository;
pub mod resource;
pub mod store;

pub use access::{AccessEngine, AccessLedger, AccessLevel, VisibilityTier};
pub use agent::{AgentDirectory, AgentRef, Group, InMemoryAgentDirectory, Principal, User};
pub use config::RepositoryConfig;
pub use errors::{CoreError, CoreResult};
pub use ids::{AgentId, CollectionId, ResourceRef, VersionId, WorkId};
pub use lifecycle::{LifecycleEvent, Version, VersionResolver, VersionState};
pub use repository::{Repository, WorkObserver};
pub use resource::{Collection, Permissioned, TransitionOutcome, Work};

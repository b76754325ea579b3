//! # Store
//!
//! Work persistence and the serde record layout.

mod memory;
mod record;

pub use memory::{InMemoryWorkStore, WorkMutation, WorkStore};
pub use record::{Snapshot, VersionRecord, WorkRecord};

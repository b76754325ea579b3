//! # Access Control
//!
//! Three-tier grant model (discover / read / edit) over users and groups.
//!
//! - `AccessLedger` - the grant rows of one resource and their mutators
//! - `AccessEngine` - effective-level decisions, consulting the directory
//! - `VisibilityTier` - open / authorized / private, derived from rows

mod engine;
mod ledger;
mod level;

pub use engine::AccessEngine;
pub use ledger::{AccessGrant, AccessLedger};
pub use level::{level_label, AccessLevel, VisibilityTier};

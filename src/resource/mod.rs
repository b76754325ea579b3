//! # Resource Facade
//!
//! Entities that own an access ledger. `Work` also owns versions and is the
//! only place version state is mutated.

mod collection;
mod permissioned;
mod work;

pub use collection::Collection;
pub use permissioned::Permissioned;
pub use work::{TransitionOutcome, Work};

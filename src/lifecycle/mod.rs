//! Version Lifecycle Engine
//!
//! This module provides:
//! - `VersionState` / `LifecycleEvent` - the state vocabulary
//! - `LifecycleMachine` - the explicit `(state, event) -> state` table
//! - `Version` - a numbered revision whose state changes only through the table
//! - `VersionResolver` - representative-version resolution
//! - `PostTransitionEffect` - ordered side effects planned after a transition
//!
//! # Principles
//!
//! 1. Versions are born in `draft`
//! 2. `removed` is terminal
//! 3. A failed transition leaves the version unchanged
//! 4. Resolution is a pure function of the current versions

mod effects;
mod resolver;
mod state;
mod version;

pub use effects::{plan_effects, PostTransitionEffect};
pub use resolver::VersionResolver;
pub use state::{LifecycleEvent, LifecycleMachine, VersionState};
pub use version::{Transition, Version};

//! Version states and the transition table
//!
//! ```text
//!            publish              withdraw
//!   draft ──────────▶ published ──────────▶ withdrawn
//!     │                   ▲                    │
//!     │                   └────── publish ─────┤
//!     │ remove                                 │ remove
//!     └──────────────────▶ removed ◀───────────┘
//! ```
//!
//! `removed` is terminal. The machine is side-effect-free: it only answers
//! "what state follows" and never touches a version or its parent.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{CoreError, CoreResult};

/// Lifecycle state of a single version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionState {
    /// Initial state. Every version is created here.
    Draft,
    /// Visible to public consumers; content is frozen.
    Published,
    /// Taken down after publication; may be republished.
    Withdrawn,
    /// Soft-deleted. Terminal.
    Removed,
}

impl VersionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionState::Draft => "draft",
            VersionState::Published => "published",
            VersionState::Withdrawn => "withdrawn",
            VersionState::Removed => "removed",
        }
    }

    /// Returns true if no event leaves this state.
    pub fn is_terminal(&self) -> bool {
        LifecycleMachine::events_from(*self).is_empty()
    }
}

impl fmt::Display for VersionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Events that drive a version between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    Publish,
    Withdraw,
    Remove,
}

impl LifecycleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::Publish => "publish",
            LifecycleEvent::Withdraw => "withdraw",
            LifecycleEvent::Remove => "remove",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `(from, event) -> to`. Any pair not listed is illegal.
const TRANSITIONS: &[(VersionState, LifecycleEvent, VersionState)] = &[
    (VersionState::Draft, LifecycleEvent::Publish, VersionState::Published),
    (VersionState::Withdrawn, LifecycleEvent::Publish, VersionState::Published),
    (VersionState::Published, LifecycleEvent::Withdraw, VersionState::Withdrawn),
    (VersionState::Draft, LifecycleEvent::Remove, VersionState::Removed),
    (VersionState::Withdrawn, LifecycleEvent::Remove, VersionState::Removed),
];

/// Stateless transition resolver.
///
/// Lookups are evaluated identically every time for identical inputs.
pub struct LifecycleMachine;

impl LifecycleMachine {
    /// Returns the state that follows `from` under `event`, if legal.
    pub fn next_state(from: VersionState, event: LifecycleEvent) -> Option<VersionState> {
        TRANSITIONS
            .iter()
            .find(|(f, e, _)| *f == from && *e == event)
            .map(|(_, _, to)| *to)
    }

    /// Like [`next_state`](Self::next_state) but reports illegal pairs.
    pub fn transition(from: VersionState, event: LifecycleEvent) -> CoreResult<VersionState> {
        Self::next_state(from, event).ok_or(CoreError::InvalidTransition { from, event })
    }

    /// Events accepted from `state`, in table order.
    pub fn events_from(state: VersionState) -> Vec<LifecycleEvent> {
        TRANSITIONS
            .iter()
            .filter(|(f, _, _)| *f == state)
            .map(|(_, e, _)| *e)
            .collect()
    }
}

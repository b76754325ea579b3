//! # Core Errors
//!
//! Error taxonomy for the lifecycle and access-control engines.
//!
//! Error codes:
//! - DEPOSITUM_INVALID_TRANSITION (REJECT)
//! - DEPOSITUM_IRREVERSIBLE_DELETION (REJECT)
//! - DEPOSITUM_CONSTRAINT_VIOLATION (REJECT)
//! - DEPOSITUM_WORK_NOT_FOUND (REJECT)
//! - DEPOSITUM_VERSION_NOT_FOUND (REJECT)
//! - DEPOSITUM_UNKNOWN_AGENT (REJECT)
//! - DEPOSITUM_UNAUTHORIZED (REJECT)
//! - DEPOSITUM_STORAGE_ERROR (FAIL)
//!
//! All errors are returned synchronously at the point of the offending call.
//! Nothing in the core retries.

use thiserror::Error;

use crate::ids::{AgentId, WorkId};
use crate::lifecycle::{LifecycleEvent, VersionState};

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Lifecycle and access-control errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ==================
    // Lifecycle Errors
    // ==================

    /// The requested event is not legal from the version's current state
    #[error("Invalid transition: cannot {event} a {from} version")]
    InvalidTransition {
        from: VersionState,
        event: LifecycleEvent,
    },

    /// Destroying a published version without an explicit override
    #[error("Refusing to destroy published version {version_number} without force")]
    IrreversibleDeletion { version_number: u32 },

    /// A structural invariant would be broken by the operation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    // ==================
    // Lookup Errors
    // ==================

    #[error("Work not found: {0}")]
    WorkNotFound(WorkId),

    #[error("Version {version_number} not found in work {work_id}")]
    VersionNotFound { work_id: WorkId, version_number: u32 },

    #[error("Unknown agent: {0}")]
    UnknownAgent(AgentId),

    // ==================
    // Authorization Errors
    // ==================

    /// Actor lacks the access level the operation requires
    #[error("Not authorized to {0}")]
    Unauthorized(String),

    // ==================
    // Internal Errors
    // ==================

    /// Store lock was poisoned (a thread panicked while holding it)
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl CoreError {
    /// Returns the stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::InvalidTransition { .. } => "DEPOSITUM_INVALID_TRANSITION",
            CoreError::IrreversibleDeletion { .. } => "DEPOSITUM_IRREVERSIBLE_DELETION",
            CoreError::ConstraintViolation(_) => "DEPOSITUM_CONSTRAINT_VIOLATION",
            CoreError::WorkNotFound(_) => "DEPOSITUM_WORK_NOT_FOUND",
            CoreError::VersionNotFound { .. } => "DEPOSITUM_VERSION_NOT_FOUND",
            CoreError::UnknownAgent(_) => "DEPOSITUM_UNKNOWN_AGENT",
            CoreError::Unauthorized(_) => "DEPOSITUM_UNAUTHORIZED",
            CoreError::StorageError(_) => "DEPOSITUM_STORAGE_ERROR",
        }
    }

    /// Returns true if the caller can fix the cause and try again
    pub fn is_client_error(&self) -> bool {
        !matches!(self, CoreError::StorageError(_))
    }

    pub(crate) fn constraint(message: impl Into<String>) -> Self {
        CoreError::ConstraintViolation(message.into())
    }

    pub(crate) fn poisoned(context: &str) -> Self {
        CoreError::StorageError(format!("{} lock poisoned", context))
    }
}

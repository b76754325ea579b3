//! Observability subsystem
//!
//! - Structured logging through `tracing`, one event per line, with an
//!   `event` field carrying a SCREAMING_SNAKE event name
//! - Append-only audit records for every mutation attempt
//!
//! # Usage
//!
//! ```ignore
//! use depositum::observability::init_logging;
//!
//! init_logging("depositum=info");
//! tracing::info!(event = "VERSION_PUBLISHED", work = %id, version = 2);
//! ```

pub mod audit;

pub use audit::{AuditAction, AuditLog, AuditOutcome, AuditRecord, FileAuditLog, MemoryAuditLog};

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Calling this twice is
/// harmless; the second call leaves the first subscriber in place.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

//! Audit Logging
//!
//! - Every lifecycle and grant mutation attempt is recorded
//! - Every outcome (success, rejection, failure) is recorded
//! - The audit log is append-only
//! - One JSON record per line

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::ids::AgentId;

/// Audit action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    WorkCreated,
    DraftCreated,
    DraftUpdated,
    VersionPublished,
    VersionWithdrawn,
    VersionRemoved,
    VersionDestroyed,
    WorkDeleted,
    GrantChanged,
    VisibilityChanged,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::WorkCreated => "WORK_CREATED",
            AuditAction::DraftCreated => "DRAFT_CREATED",
            AuditAction::DraftUpdated => "DRAFT_UPDATED",
            AuditAction::VersionPublished => "VERSION_PUBLISHED",
            AuditAction::VersionWithdrawn => "VERSION_WITHDRAWN",
            AuditAction::VersionRemoved => "VERSION_REMOVED",
            AuditAction::VersionDestroyed => "VERSION_DESTROYED",
            AuditAction::WorkDeleted => "WORK_DELETED",
            AuditAction::GrantChanged => "GRANT_CHANGED",
            AuditAction::VisibilityChanged => "VISIBILITY_CHANGED",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Audit record outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditOutcome {
    /// Action succeeded.
    Success,
    /// Action was refused by a validation or authorization check.
    Rejected,
    /// Action failed for an internal reason.
    Failed,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Success => "SUCCESS",
            AuditOutcome::Rejected => "REJECTED",
            AuditOutcome::Failed => "FAILED",
        }
    }

    /// Classify an error result.
    pub fn of_error(err: &CoreError) -> Self {
        if err.is_client_error() {
            AuditOutcome::Rejected
        } else {
            AuditOutcome::Failed
        }
    }
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single audit record.
///
/// Each record includes: timestamp, action, actor, target, outcome.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub id: Uuid,

    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,

    pub action: AuditAction,

    /// `None` for anonymous or system actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<AgentId>,

    /// Resource or version reference, e.g. `work:<id>/v2`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    pub outcome: AuditOutcome,

    /// Error code (if outcome is Rejected or Failed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AuditRecord {
    pub fn new(action: AuditAction, outcome: AuditOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action,
            actor: None,
            target: None,
            outcome,
            error_code: None,
            error_message: None,
        }
    }

    pub fn with_actor(mut self, actor: Option<AgentId>) -> Self {
        self.actor = actor;
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_error(mut self, err: &CoreError) -> Self {
        self.error_code = Some(err.code());
        self.error_message = Some(err.to_string());
        self
    }

    /// Serialize to a single JSON line.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"id":"{}","serialization_error":"{}"}}"#, self.id, e)
        })
    }
}

/// Audit log trait.
///
/// Append-only. A record must be visible after `append` returns.
pub trait AuditLog: Send + Sync {
    fn append(&self, record: &AuditRecord) -> io::Result<()>;
}

/// File-based audit log: one JSON record per line, flushed per write.
pub struct FileAuditLog {
    path: PathBuf,
    writer: Arc<Mutex<BufWriter<File>>>,
}

impl FileAuditLog {
    /// Open or create an audit log file.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            writer: Arc::new(Mutex::new(BufWriter::new(file))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditLog for FileAuditLog {
    fn append(&self, record: &AuditRecord) -> io::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "audit log lock poisoned"))?;
        writeln!(writer, "{}", record.to_json())?;
        writer.flush()
    }
}

/// In-memory audit log for testing.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditLog for MemoryAuditLog {
    fn append(&self, record: &AuditRecord) -> io::Result<()> {
        self.records
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "audit log lock poisoned"))?
            .push(record.clone());
        Ok(())
    }
}

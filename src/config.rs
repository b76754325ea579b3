//! Repository Configuration
//!
//! Loaded from a JSON file. Every field has a default, so `{}` is a valid
//! configuration.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::access::VisibilityTier;
use crate::agent::{AUTHORIZED_GROUP_NAME, PUBLIC_GROUP_NAME};

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Display name of the group matching every request (default: "public")
    #[serde(default = "default_public_group")]
    pub public_group_name: String,

    /// Display name of the group matching every authenticated user
    /// (default: "authorized")
    #[serde(default = "default_authorized_group")]
    pub authorized_group_name: String,

    /// uids promoted to admin when loaded into the directory
    #[serde(default)]
    pub admin_uids: Vec<String>,

    /// Tier applied to newly created works (default: open)
    #[serde(default = "default_visibility")]
    pub default_visibility: VisibilityTier,

    /// Whether `force` may be used to destroy published versions or delete
    /// works that have them (default: true)
    #[serde(default = "default_allow_forced_destroy")]
    pub allow_forced_destroy: bool,

    /// Append-only audit log file. In-memory when absent.
    #[serde(default)]
    pub audit_log_path: Option<PathBuf>,

    /// `tracing` filter directive used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_public_group() -> String {
    PUBLIC_GROUP_NAME.to_string()
}

fn default_authorized_group() -> String {
    AUTHORIZED_GROUP_NAME.to_string()
}

fn default_visibility() -> VisibilityTier {
    VisibilityTier::Open
}

fn default_allow_forced_destroy() -> bool {
    true
}

fn default_log_filter() -> String {
    "depositum=info".to_string()
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            public_group_name: default_public_group(),
            authorized_group_name: default_authorized_group(),
            admin_uids: Vec::new(),
            default_visibility: default_visibility(),
            allow_forced_destroy: default_allow_forced_destroy(),
            audit_log_path: None,
            log_filter: default_log_filter(),
        }
    }
}

impl RepositoryConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: RepositoryConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let public = self.public_group_name.trim();
        let authorized = self.authorized_group_name.trim();

        if public.is_empty() || authorized.is_empty() {
            return Err(ConfigError::Invalid(
                "singleton group names must not be empty".to_string(),
            ));
        }
        if public == authorized {
            return Err(ConfigError::Invalid(format!(
                "singleton groups share the name '{}'",
                public
            )));
        }

        let mut seen = BTreeSet::new();
        for uid in &self.admin_uids {
            if uid.trim().is_empty() {
                return Err(ConfigError::Invalid("empty admin uid".to_string()));
            }
            if !seen.insert(uid.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate admin uid '{}'", uid)));
            }
        }

        Ok(())
    }
}

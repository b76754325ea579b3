//! CLI command implementations
//!
//! Each command builds an in-memory repository from a snapshot file and
//! answers one question about it. Nothing is written back.

use std::fs;
use std::path::Path;

use serde_json::{json, Value};
use uuid::Uuid;

use crate::access::level_label;
use crate::agent::{AgentDirectory, AgentRef, Principal};
use crate::config::RepositoryConfig;
use crate::ids::{AgentId, WorkId};
use crate::lifecycle::Version;
use crate::observability::init_logging;
use crate::repository::Repository;
use crate::resource::Permissioned;
use crate::store::Snapshot;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments, installs logging and dispatches. This is the only
/// function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.log_filter);

    match run_command(&config, cli.command) {
        Ok(data) => write_response(data),
        Err(e) => {
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

/// Run one command and return its JSON payload.
pub fn run_command(config: &RepositoryConfig, cmd: Command) -> CliResult<Value> {
    match cmd {
        Command::Validate { snapshot } => validate(config, &snapshot),
        Command::Resolve { snapshot, work } => resolve(config, &snapshot, WorkId::from_uuid(work)),
        Command::Access {
            snapshot,
            work,
            user,
        } => access(config, &snapshot, WorkId::from_uuid(work), user.as_deref()),
        Command::CheckConfig => check_config(config),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<RepositoryConfig> {
    match path {
        Some(path) => Ok(RepositoryConfig::load(path)?),
        None => Ok(RepositoryConfig::default()),
    }
}

fn load_repository(config: &RepositoryConfig, path: &Path) -> CliResult<Repository> {
    let content = fs::read_to_string(path)
        .map_err(|e| CliError::io_error(format!("Failed to read snapshot {}: {}", path.display(), e)))?;
    let snapshot = Snapshot::from_json(&content)
        .map_err(|e| CliError::invalid_snapshot(format!("Invalid snapshot JSON: {}", e)))?;

    // Audit records are never needed for read-only inspection.
    let mut config = config.clone();
    config.audit_log_path = None;
    Ok(Repository::from_snapshot(config, snapshot)?)
}

/// Load a snapshot and check that every grant names a known agent.
pub fn validate(config: &RepositoryConfig, snapshot: &Path) -> CliResult<Value> {
    let repository = load_repository(config, snapshot)?;
    let directory = repository.directory();

    let mut works = 0usize;
    let mut published = 0usize;
    let mut withdrawn = 0usize;
    let mut versions = 0usize;

    for id in repository.work_ids()? {
        let work = repository.work(id)?;
        for grant in work.ledger().grants() {
            let known = match grant.agent {
                AgentRef::User(agent) => directory.find_user(agent)?.is_some(),
                AgentRef::Group(agent) => directory.find_group(agent)?.is_some(),
            };
            if !known {
                return Err(CliError::invalid_snapshot(format!(
                    "work {} grants {} to unknown agent {}",
                    id, grant.level, grant.agent
                )));
            }
        }

        works += 1;
        versions += work.versions().len();
        if work.has_published_version() {
            published += 1;
        }
        if work.is_withdrawn() {
            withdrawn += 1;
        }
    }

    Ok(json!({
        "valid": true,
        "works": works,
        "versions": versions,
        "published_works": published,
        "withdrawn_works": withdrawn,
    }))
}

/// Print the representative version of a work.
pub fn resolve(config: &RepositoryConfig, snapshot: &Path, id: WorkId) -> CliResult<Value> {
    let repository = load_repository(config, snapshot)?;
    let work = repository.work(id)?;

    Ok(json!({
        "work": id.to_string(),
        "representative": work.representative_version().map(version_summary),
        "latest": version_summary(work.latest_version()),
        "draft": work.draft_version().map(version_summary),
        "withdrawn": work.is_withdrawn(),
        "deposit_agreement_acknowledged": work.deposit_agreement_acknowledged(),
    }))
}

/// Print grants, tier and the effective level of one principal.
pub fn access(
    config: &RepositoryConfig,
    snapshot: &Path,
    id: WorkId,
    user: Option<&str>,
) -> CliResult<Value> {
    let repository = load_repository(config, snapshot)?;
    let work = repository.work(id)?;

    let principal = match user {
        Some(user) => Principal::user(find_user(repository.directory(), user)?),
        None => Principal::Anonymous,
    };
    let engine = repository.engine();

    let grants: Vec<Value> = work
        .ledger()
        .grants()
        .into_iter()
        .map(|g| json!({"agent": g.agent.to_string(), "level": g.level.as_str()}))
        .collect();

    Ok(json!({
        "work": id.to_string(),
        "visibility": work.visibility().as_str(),
        "open_access": work.open_access(),
        "authorized_access": work.authorized_access(),
        "grants": grants,
        "principal": principal.to_string(),
        "level": level_label(work.effective_level(&engine, &principal)?),
        "discover": work.discover_access(&engine, &principal)?,
        "read": work.read_access(&engine, &principal)?,
        "edit": work.edit_access(&engine, &principal)?,
    }))
}

/// Report the configuration in effect. Loading already validated it.
pub fn check_config(config: &RepositoryConfig) -> CliResult<Value> {
    Ok(json!({
        "valid": true,
        "config": serde_json::to_value(config)?,
    }))
}

fn find_user(directory: &dyn AgentDirectory, user: &str) -> CliResult<AgentId> {
    let found = match Uuid::parse_str(user) {
        Ok(uuid) => directory.find_user(AgentId::from_uuid(uuid))?,
        Err(_) => directory.find_user_by_uid(user)?,
    };
    found
        .map(|u| u.id)
        .ok_or_else(|| CliError::not_found(format!("no user '{}'", user)))
}

fn version_summary(version: &Version) -> Value {
    json!({
        "version_number": version.version_number(),
        "state": version.state().as_str(),
    })
}

//! Repository Scenario Tests
//!
//! End-to-end deposit workflows through the audited repository:
//! - Atomic transition plus agreement acknowledgement
//! - Serialization of concurrent transitions
//! - File-backed audit trail
//! - Snapshot export and reload

use std::fs;
use std::sync::Arc;
use std::thread;

use serde_json::json;
use tempfile::tempdir;

use depositum::access::{AccessLevel, VisibilityTier};
use depositum::agent::{AgentDirectory, AgentRef, InMemoryAgentDirectory, Principal};
use depositum::config::RepositoryConfig;
use depositum::errors::CoreError;
use depositum::lifecycle::VersionState;
use depositum::repository::Repository;
use depositum::store::{Snapshot, WorkRecord};

fn repository(config: RepositoryConfig) -> (Repository, Arc<InMemoryAgentDirectory>) {
    let directory = Arc::new(InMemoryAgentDirectory::new());
    let repo = Repository::in_memory(config, directory.clone()).unwrap();
    (repo, directory)
}

// =============================================================================
// Deposit Workflow Tests
// =============================================================================

/// Deposit, revise, publish the revision, withdraw the original.
#[test]
fn test_revision_workflow() {
    let (repo, directory) = repository(RepositoryConfig::default());
    let owner = directory.create_user("depositor").unwrap();
    let actor = Principal::from(&owner);

    let work = repo.create_work(owner.id, json!({"title": "Tide gauges"})).unwrap();
    let id = work.id();

    let first = repo.publish(&actor, id, 1).unwrap();
    assert!(first.acknowledged_agreement());

    repo.create_draft(&actor, id, json!({"title": "Tide gauges (corrected)"})).unwrap();
    repo.update_draft(&actor, id, 2, json!({"title": "Tide gauges, corrected"})).unwrap();
    assert_eq!(repo.representative_version(id).unwrap().unwrap().version_number(), 1);

    let second = repo.publish(&actor, id, 2).unwrap();
    assert!(!second.acknowledged_agreement());
    repo.withdraw(&actor, id, 1).unwrap();

    let work = repo.work(id).unwrap();
    let representative = work.representative_version().unwrap();
    assert_eq!(representative.version_number(), 2);
    assert_eq!(representative.metadata()["title"], "Tide gauges, corrected");
    assert_eq!(work.version(1).unwrap().state(), VersionState::Withdrawn);
    assert!(!work.is_withdrawn());
}

/// Editing a published version is refused and nothing changes.
#[test]
fn test_update_published_version_rejected() {
    let (repo, directory) = repository(RepositoryConfig::default());
    let owner = directory.create_user("depositor").unwrap();
    let actor = Principal::from(&owner);
    let id = repo.create_work(owner.id, json!({"title": "A"})).unwrap().id();
    repo.publish(&actor, id, 1).unwrap();

    let before = repo.work(id).unwrap();
    assert!(matches!(
        repo.update_draft(&actor, id, 1, json!({"title": "B"})),
        Err(CoreError::ConstraintViolation(_))
    ));
    assert_eq!(repo.work(id).unwrap(), before);
}

/// Group editors may run the workflow; their members' other grants do not matter.
#[test]
fn test_group_editor_may_publish() {
    let (repo, directory) = repository(RepositoryConfig::default());
    let owner = directory.create_user("depositor").unwrap();
    let curators = directory.create_group("curators").unwrap();
    let curator = directory.create_user("curator").unwrap();
    directory.add_member(curators.id, curator.id).unwrap();

    let id = repo.create_work(owner.id, json!({})).unwrap().id();
    let curator = Principal::from(&curator);
    assert!(repo.publish(&curator, id, 1).is_err());

    repo.grant(&Principal::from(&owner), id, AgentRef::from(&curators), AccessLevel::Edit)
        .unwrap();
    repo.publish(&curator, id, 1).unwrap();
    assert_eq!(
        repo.effective_level(&curator, id).unwrap(),
        Some(AccessLevel::Edit)
    );
}

// =============================================================================
// Concurrency Tests
// =============================================================================

/// Concurrent publishes of the same draft: exactly one wins.
#[test]
fn test_concurrent_publish_single_winner() {
    let (repo, directory) = repository(RepositoryConfig::default());
    let owner = directory.create_user("depositor").unwrap();
    let id = repo.create_work(owner.id, json!({})).unwrap().id();

    let repo = Arc::new(repo);
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let repo = Arc::clone(&repo);
            let actor = Principal::from(&owner);
            thread::spawn(move || repo.publish(&actor, id, 1))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert!(winners[0].acknowledged_agreement());

    for loser in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(loser, CoreError::InvalidTransition { .. }));
    }
}

// =============================================================================
// Audit Trail Tests
// =============================================================================

/// Successes and rejections both land in the file audit log.
#[test]
fn test_file_audit_log_records_outcomes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let config = RepositoryConfig {
        audit_log_path: Some(path.clone()),
        ..RepositoryConfig::default()
    };
    let (repo, directory) = repository(config);
    let owner = directory.create_user("depositor").unwrap();
    let id = repo.create_work(owner.id, json!({})).unwrap().id();

    repo.publish(&Principal::from(&owner), id, 1).unwrap();
    assert!(repo.publish(&Principal::Anonymous, id, 1).is_err());

    let lines: Vec<serde_json::Value> = fs::read_to_string(&path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["action"], "WORK_CREATED");
    assert_eq!(lines[1]["outcome"], "SUCCESS");
    assert_eq!(lines[2]["outcome"], "REJECTED");
    assert_eq!(lines[2]["error_code"], "DEPOSITUM_UNAUTHORIZED");
    assert!(lines[2].get("actor").is_none());
}

// =============================================================================
// Snapshot Tests
// =============================================================================

/// Export every work, reload it, and get identical decisions.
#[test]
fn test_snapshot_reload_preserves_decisions() {
    let (repo, directory) = repository(RepositoryConfig {
        default_visibility: VisibilityTier::Authorized,
        ..RepositoryConfig::default()
    });
    let owner = directory.create_user("depositor").unwrap();
    let reader = directory.create_user("reader").unwrap();
    let id = repo.create_work(owner.id, json!({"title": "Ledger"})).unwrap().id();
    repo.publish(&Principal::from(&owner), id, 1).unwrap();

    let snapshot = Snapshot {
        users: directory.users().unwrap(),
        groups: directory.groups().unwrap(),
        works: vec![WorkRecord::from(&repo.work(id).unwrap())],
    };
    let json = snapshot.to_json().unwrap();

    let reloaded = Repository::from_snapshot(
        RepositoryConfig::default(),
        Snapshot::from_json(&json).unwrap(),
    )
    .unwrap();

    assert_eq!(reloaded.work(id).unwrap(), repo.work(id).unwrap());
    assert_eq!(reloaded.visibility(id).unwrap(), VisibilityTier::Authorized);
    assert!(reloaded.read_access(&Principal::from(&reader), id).unwrap());
    assert!(!reloaded.read_access(&Principal::Anonymous, id).unwrap());
    assert!(reloaded.discover_access(&Principal::Anonymous, id).unwrap());
    assert!(reloaded.directory().find_user(owner.id).unwrap().is_some());
}

/// Admin uids in the config are promoted when a snapshot loads.
#[test]
fn test_snapshot_admin_promotion() {
    let directory = InMemoryAgentDirectory::new();
    let curator = directory.create_user("curator").unwrap();
    let config = RepositoryConfig {
        admin_uids: vec!["curator".to_string()],
        ..RepositoryConfig::default()
    };
    let snapshot = Snapshot {
        users: directory.users().unwrap(),
        groups: Vec::new(),
        works: Vec::new(),
    };

    let repo = Repository::from_snapshot(config, snapshot).unwrap();
    assert!(repo.directory().find_user(curator.id).unwrap().unwrap().admin);
}

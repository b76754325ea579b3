//! Representative-version resolution
//!
//! Given a work's versions, decides which one to show, link, index or edit.
//!
//! ## Resolution Rule
//!
//! 1. `latest_published` = greatest `version_number` in `published`
//! 2. `draft` = greatest `version_number` in `draft`
//! 3. `withdrawn` = greatest `version_number` in `withdrawn`
//! 4. `representative` = latest published, else withdrawn, else draft
//! 5. The work is withdrawn iff it has a withdrawn version and no published one
//!
//! `version_number` is unique per work, so "greatest" never ties.
//! Nothing here is cached; every call re-reads the slice it is given.

use super::{Version, VersionState};

/// Stateless resolver over a slice of versions.
pub struct VersionResolver;

impl VersionResolver {
    /// Greatest-numbered version in `state`.
    pub fn latest_in(versions: &[Version], state: VersionState) -> Option<&Version> {
        versions
            .iter()
            .filter(|v| v.state() == state)
            .max_by_key(|v| v.version_number())
    }

    pub fn latest_published_version(versions: &[Version]) -> Option<&Version> {
        Self::latest_in(versions, VersionState::Published)
    }

    pub fn draft_version(versions: &[Version]) -> Option<&Version> {
        Self::latest_in(versions, VersionState::Draft)
    }

    pub fn withdrawn_version(versions: &[Version]) -> Option<&Version> {
        Self::latest_in(versions, VersionState::Withdrawn)
    }

    /// The canonical version for display and indexing.
    ///
    /// Removed versions are never representative.
    pub fn representative_version(versions: &[Version]) -> Option<&Version> {
        Self::latest_published_version(versions)
            .or_else(|| Self::withdrawn_version(versions))
            .or_else(|| Self::draft_version(versions))
    }

    /// The version a depositor should edit: the pending draft if there is
    /// one, otherwise the representative version.
    pub fn editable_version(versions: &[Version]) -> Option<&Version> {
        Self::draft_version(versions).or_else(|| Self::representative_version(versions))
    }

    /// Greatest `version_number` regardless of state.
    pub fn latest_version(versions: &[Version]) -> Option<&Version> {
        versions.iter().max_by_key(|v| v.version_number())
    }

    pub fn is_withdrawn(versions: &[Version]) -> bool {
        Self::withdrawn_version(versions).is_some()
            && Self::latest_published_version(versions).is_none()
    }

    pub fn has_published_version(versions: &[Version]) -> bool {
        versions.iter().any(Version::is_published)
    }
}

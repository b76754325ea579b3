//! Permission levels and visibility tiers

use std::fmt;

use serde::{Deserialize, Serialize};

/// A permission level, totally ordered `Discover < Read < Edit`.
///
/// "No access" is `None` in an `Option<AccessLevel>`, which orders below
/// every level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Can see that the resource exists
    Discover,
    /// Can view and download
    Read,
    /// Can modify
    Edit,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Discover => "discover",
            AccessLevel::Read => "read",
            AccessLevel::Edit => "edit",
        }
    }

    /// True if holding `self` satisfies a check for `required`.
    #[inline]
    pub fn satisfies(&self, required: AccessLevel) -> bool {
        *self >= required
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Display label for an effective level, `"none"` when absent.
pub fn level_label(level: Option<AccessLevel>) -> &'static str {
    level.map(|l| l.as_str()).unwrap_or("none")
}

/// A resource's overall visibility, derived from its singleton-group grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityTier {
    /// `public` holds read
    Open,
    /// `authorized` holds read, `public` does not
    Authorized,
    /// Neither singleton group holds read
    Private,
}

impl VisibilityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisibilityTier::Open => "open",
            VisibilityTier::Authorized => "authorized",
            VisibilityTier::Private => "private",
        }
    }
}

impl fmt::Display for VisibilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

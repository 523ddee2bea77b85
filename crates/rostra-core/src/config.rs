//! Session configuration
//!
//! Policies that decide how the session manager reacts to duplicate roster
//! ids, unreadable rosters and being dropped with unsaved state.

use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Policies
// ----------------------------------------------------------------------------

/// What `add_user_info_roster` does when the id is already present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    /// Return the existing handle without marking the session modified
    ReturnExisting,
    /// Fail with `RosterError::AlreadyExists`
    Reject,
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        Self::ReturnExisting
    }
}

/// What `init` does when the roster exists but cannot be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RosterLoadPolicy {
    /// Start with an empty roster and report the failure as a warning
    Degrade,
    /// Abort the session start
    Fail,
}

impl Default for RosterLoadPolicy {
    fn default() -> Self {
        Self::Degrade
    }
}

// ----------------------------------------------------------------------------
// Session Configuration
// ----------------------------------------------------------------------------

/// Configuration for a `SessionManager`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Behaviour of adding an id that is already in the roster
    pub duplicate_policy: DuplicatePolicy,
    /// Behaviour when the stored roster is unreadable
    pub roster_load_policy: RosterLoadPolicy,
    /// Run `clean` when an active manager is dropped
    pub clean_on_drop: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::ReturnExisting,
            roster_load_policy: RosterLoadPolicy::Degrade,
            clean_on_drop: true,
        }
    }
}

impl SessionConfig {
    /// Reject duplicates and refuse to start on an unreadable roster
    pub fn strict() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Reject,
            roster_load_policy: RosterLoadPolicy::Fail,
            clean_on_drop: true,
        }
    }

    /// Never persist implicitly; callers decide when to `clean`
    pub fn ephemeral() -> Self {
        Self {
            clean_on_drop: false,
            ..Self::default()
        }
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn with_roster_load_policy(mut self, policy: RosterLoadPolicy) -> Self {
        self.roster_load_policy = policy;
        self
    }

    pub fn with_clean_on_drop(mut self, clean_on_drop: bool) -> Self {
        self.clean_on_drop = clean_on_drop;
        self
    }
}

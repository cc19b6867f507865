//! Optimistic mutation policy and action vocabulary.
//!
//! DESIGN
//! ======
//! Status changes are applied to the local cache before the request is sent.
//! What happens when the request fails is a policy choice: keep the change
//! until the next list refresh overwrites it, put the previous status back,
//! or refetch the list right away. Keeping the change is the default.

#[cfg(test)]
#[path = "optimistic_test.rs"]
mod tests;

use std::fmt;
use std::str::FromStr;

use crate::net::types::ApiError;
use crate::state::leads::LeadStatus;

// =============================================================================
// POLICY
// =============================================================================

/// Failure handling for optimistic status updates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OptimisticPolicy {
    /// Leave the optimistic status in place.
    #[default]
    NoRollback,
    /// Restore the previous status, unless a newer local change replaced it.
    RollbackOnFailure,
    /// Reconcile with the server by fetching the list immediately.
    RefetchOnFailure,
}

impl OptimisticPolicy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoRollback => "no_rollback",
            Self::RollbackOnFailure => "rollback",
            Self::RefetchOnFailure => "refetch",
        }
    }
}

impl fmt::Display for OptimisticPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a policy or action name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownName {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for OptimisticPolicy {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "no_rollback" | "none" => Ok(Self::NoRollback),
            "rollback" | "rollback_on_failure" => Ok(Self::RollbackOnFailure),
            "refetch" | "refetch_on_failure" => Ok(Self::RefetchOnFailure),
            _ => Err(UnknownName { kind: "optimistic policy", value: s.to_owned() }),
        }
    }
}

// =============================================================================
// ACTIONS
// =============================================================================

/// Per-row menu entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    View,
    MarkContacted,
    MarkQualified,
    MarkClosed,
    OpenDetail,
}

impl MenuAction {
    /// Status a `Mark*` action sets; `None` for the view actions.
    #[must_use]
    pub fn target_status(self) -> Option<LeadStatus> {
        match self {
            Self::MarkContacted => Some(LeadStatus::Contacted),
            Self::MarkQualified => Some(LeadStatus::Qualified),
            Self::MarkClosed => Some(LeadStatus::Closed),
            Self::View | Self::OpenDetail => None,
        }
    }
}

/// Bulk toolbar actions over the selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BulkAction {
    Contacted,
    Qualified,
    Closed,
}

impl BulkAction {
    #[must_use]
    pub fn status(self) -> LeadStatus {
        match self {
            Self::Contacted => LeadStatus::Contacted,
            Self::Qualified => LeadStatus::Qualified,
            Self::Closed => LeadStatus::Closed,
        }
    }
}

impl FromStr for BulkAction {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contacted" => Ok(Self::Contacted),
            "qualified" => Ok(Self::Qualified),
            "closed" => Ok(Self::Closed),
            _ => Err(UnknownName { kind: "bulk action", value: s.to_owned() }),
        }
    }
}

// =============================================================================
// OUTCOME
// =============================================================================

/// One failed item of a bulk update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkFailure {
    pub id: String,
    pub error: ApiError,
}

/// Per-item result of a bulk update. Each id was sent at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<BulkFailure>,
}

impl BulkOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    #[must_use]
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

//! Core types shared by every reconciler

use serde::{Deserialize, Serialize};
use std::fmt;
use transport::CommandSpec;

/// Result of converging one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    /// Already in the desired state
    NoChange,
    /// The entity did not exist and was created
    Created,
    /// The entity existed and was changed
    Modified,
    /// A change was needed but not made (dry run)
    Skipped { reason: String },
}

impl ApplyResult {
    /// Check if the result represents a change
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Modified)
    }
}

impl fmt::Display for ApplyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoChange => write!(f, "unchanged"),
            Self::Created => write!(f, "created"),
            Self::Modified => write!(f, "modified"),
            Self::Skipped { reason } => write!(f, "skipped ({reason})"),
        }
    }
}

/// The single corrective step a reconciler decided on.
///
/// Produced by a pure planning function from observed and desired state,
/// so the decision can be checked without running anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing to do
    None,
    /// Create the entity with this command
    Add(CommandSpec),
    /// Change the existing entity with this command
    Modify(CommandSpec),
}

impl Action {
    /// The command this action would run, if any
    pub fn command(&self) -> Option<&CommandSpec> {
        match self {
            Self::None => None,
            Self::Add(spec) | Self::Modify(spec) => Some(spec),
        }
    }
}

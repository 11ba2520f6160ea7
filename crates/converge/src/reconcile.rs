//! The inspect → plan → apply protocol
//!
//! A reconciler observes one named entity, decides on at most one
//! corrective command, and runs it. Planning is a pure function of the
//! observed and desired state, so the decision is testable on its own.

use crate::context::ApplyContext;
use crate::error::Result;
use crate::types::{Action, ApplyResult};

/// Converges one kind of named entity toward a desired spec.
///
/// Observed state is read fresh on every call. Two concurrent `ensure`
/// calls for the same entity may both decide to add it; callers serialize
/// per entity.
pub trait Reconciler {
    /// Desired state
    type Spec;
    /// State read back from the system
    type Observed;

    /// Entity kind used in log lines (e.g., "group", "user")
    fn kind(&self) -> &'static str;

    /// Context used to run the chosen action
    fn context(&self) -> ApplyContext<'_>;

    /// Read the current state, or `None` when the entity does not exist.
    ///
    /// `spec` names what is about to be compared, so the reconciler can
    /// resolve references in it (a group name to its gid) while reading.
    fn inspect(&self, name: &str, spec: &Self::Spec) -> Result<Option<Self::Observed>>;

    /// Decide the corrective action. Must not touch the system.
    fn plan(&self, name: &str, observed: Option<&Self::Observed>, spec: &Self::Spec) -> Action;

    /// Whether the entity exists.
    fn exists(&self, name: &str) -> Result<bool>
    where
        Self::Spec: Default,
    {
        Ok(self.inspect(name, &Self::Spec::default())?.is_some())
    }

    /// Create the entity unconditionally.
    fn add(&self, name: &str, spec: &Self::Spec) -> Result<ApplyResult> {
        let action = self.plan(name, None, spec);
        self.context().apply(self.kind(), name, action)
    }

    /// Bring the entity to `spec`: add when absent, modify what differs,
    /// do nothing when it already matches.
    fn ensure(&self, name: &str, spec: &Self::Spec) -> Result<ApplyResult> {
        let observed = self.inspect(name, spec)?;
        let action = self.plan(name, observed.as_ref(), spec);
        self.context().apply(self.kind(), name, action)
    }
}

//! Apply context handed to every reconciler

use transport::{CancelToken, CommandRunner, CommandSpec, ExecutionResult};

use crate::error::Result;
use crate::types::{Action, ApplyResult};

/// Everything a reconciler needs to act on a target.
///
/// Holds borrowed handles only, so it is cheap to copy into each
/// reconciler that shares the same runner.
#[derive(Clone, Copy)]
pub struct ApplyContext<'a> {
    /// Where mutating and query commands run
    pub runner: &'a dyn CommandRunner,
    /// Cancellation shared with the caller
    pub cancel: &'a CancelToken,
    /// Report what would change without changing it
    pub dry_run: bool,
}

impl<'a> ApplyContext<'a> {
    /// Create a context that applies changes.
    pub fn new(runner: &'a dyn CommandRunner, cancel: &'a CancelToken) -> Self {
        Self {
            runner,
            cancel,
            dry_run: false,
        }
    }

    /// Set dry-run mode.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run a command, failing on a non-zero exit.
    pub fn run(&self, spec: &CommandSpec) -> Result<ExecutionResult> {
        Ok(self.runner.run(spec, self.cancel)?)
    }

    /// Run a command and report the exit status without failing on it.
    pub fn probe(&self, spec: &CommandSpec) -> Result<ExecutionResult> {
        Ok(self.runner.execute(spec, self.cancel)?)
    }

    /// Carry out a planned action.
    pub fn apply(&self, kind: &str, name: &str, action: Action) -> Result<ApplyResult> {
        let (spec, outcome) = match action {
            Action::None => {
                log::debug!("{kind} {name}: up to date");
                return Ok(ApplyResult::NoChange);
            }
            Action::Add(spec) => (spec, ApplyResult::Created),
            Action::Modify(spec) => (spec, ApplyResult::Modified),
        };

        if self.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: format!("dry run, would run `{spec}`"),
            });
        }

        self.run(&spec)?;
        log::info!("{kind} {name}: {outcome}");
        Ok(outcome)
    }
}

impl std::fmt::Debug for ApplyContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplyContext")
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

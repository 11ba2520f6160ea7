//! Transport implementations.
//!
//! A [`Transport`] only builds the invocation that reaches the target; the
//! [`Runner`](crate::Runner) executes it. That keeps the wiring testable
//! without spawning anything.

use std::fmt;
use std::path::Path;

use crate::command::CommandSpec;

pub mod local;
pub mod ssh;
pub mod sudo;

pub use local::Local;
pub use ssh::Ssh;
pub use sudo::Sudo;

/// Strategy for turning a [`CommandSpec`] into a process invocation.
pub trait Transport: Send + Sync + fmt::Debug {
    /// Short name for logs ("local", "ssh deploy@web1", ...)
    fn describe(&self) -> String;

    /// Build the invocation that runs `spec` on the target.
    fn wrap(&self, spec: &CommandSpec) -> CommandSpec;

    /// Build the invocation that copies one local file to `remote` on the target.
    fn push(&self, local: &Path, remote: &str) -> CommandSpec;
}

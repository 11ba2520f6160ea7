//! # transport
//!
//! One way to run a program, whether it lives on this machine or on a host
//! reached over ssh.
//!
//! - [`CommandSpec`] describes an invocation (program, args, stdin, cwd).
//! - A [`Transport`] turns it into the process that reaches the target:
//!   [`Local`] runs it directly, [`Ssh`] wraps it in an ssh call, [`Sudo`]
//!   prefixes `sudo -n` on whichever side the inner transport runs.
//! - A [`Runner`] executes the wrapped spec, draining stdout and stderr on
//!   their own threads so large outputs never deadlock, and returns an
//!   [`ExecutionResult`] with both streams captured.
//!
//! ## Example
//!
//! ```no_run
//! use transport::{CancelToken, CommandRunner, CommandSpec, Host, Runner};
//!
//! let host = Host::from_file("config.yml")?;
//! let runner = Runner::remote(host);
//! let result = runner.run(&CommandSpec::new("uname").arg("-sm"), &CancelToken::new())?;
//! println!("{}", result.stdout_str());
//! # Ok::<(), transport::Error>(())
//! ```

#![deny(unsafe_code)]

/// Transport implementations (local, ssh, sudo).
pub mod backend;
/// Cooperative cancellation token.
pub mod cancel;
/// Command specs and captured results.
pub mod command;
/// Error types for command execution.
pub mod error;
/// Process spawning and output draining.
pub mod exec;
/// Remote host descriptor.
pub mod host;
/// The command runner trait and its transport-backed implementation.
pub mod runner;
/// Fake runner for tests in this crate and its dependents.
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backend::{Local, Ssh, Sudo, Transport};
pub use cancel::CancelToken;
pub use command::{CommandSpec, ExecutionResult, ExitFailure, Input, shell_quote};
pub use error::{Error, ErrorCategory, Result};
pub use host::Host;
pub use runner::{CommandRunner, Runner, check};

//! # converge
//!
//! Reconcilers that bring one named entity at a time to a desired state,
//! running the minimal corrective command through a [`CommandRunner`].
//!
//! ## Core Concepts
//!
//! - **Reconciler**: inspect the entity, plan a single [`Action`] from the
//!   observed and desired state, apply it. [`Groups`] and [`Users`] follow
//!   this protocol through the [`Reconciler`] trait.
//! - **ApplyContext**: the injected runner, cancel token and dry-run flag.
//! - **ApplyResult**: what happened (`NoChange`, `Created`, `Modified`,
//!   `Skipped`).
//!
//! [`Directories`] and [`GitCheckout`] have their own `ensure` methods as
//! their state lives on the local filesystem rather than in a database.
//!
//! ## Example
//!
//! ```no_run
//! use converge::{ApplyContext, GroupSpec, Groups, Reconciler};
//! use transport::{CancelToken, Runner};
//!
//! let runner = Runner::local();
//! let cancel = CancelToken::new();
//! let db = sysdb::Files::default();
//!
//! let groups = Groups::new(ApplyContext::new(&runner, &cancel), &db);
//! let result = groups.ensure("web", &GroupSpec::new().with_gid(1200))?;
//! println!("web: {result}");
//! # Ok::<(), converge::Error>(())
//! ```
//!
//! [`CommandRunner`]: transport::CommandRunner

#![deny(unsafe_code)]

pub mod context;
pub mod dir;
pub mod error;
pub mod git;
pub mod group;
pub mod mysql;
pub mod reconcile;
pub mod types;
pub mod user;

#[cfg(test)]
mod testing;

pub use context::ApplyContext;
pub use dir::{DEFAULT_MODE, Directories, DirectorySpec};
pub use error::{Error, ErrorCategory, Result};
pub use git::{GitCheckout, GitCheckoutSpec};
pub use group::{GroupSpec, Groups};
pub use mysql::{Connection, CreateUser, MySql, Privilege};
pub use reconcile::Reconciler;
pub use types::{Action, ApplyResult};
pub use user::{EXPIRY_FORMAT, ObservedUser, UserSpec, Users};

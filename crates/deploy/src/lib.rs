//! # deploy
//!
//! Ship a freshly built binary to a host and run it there.
//!
//! 1. [`probe::detect`] asks the host for `uname -sm` and maps the answer
//!    to a [`Platform`].
//! 2. A [`Builder`] produces an artifact for that platform
//!    ([`CargoBuilder`] cross-compiles with `cargo build --target`).
//! 3. The artifact and its config are copied to `/tmp/<name>` and
//!    `/tmp/<name>-config.yml`.
//! 4. The binary is run as `/tmp/<name> --config /tmp/<name>-config.yml`.
//!
//! Each stage is reported to a [`StageObserver`].

#![deny(unsafe_code)]

pub mod build;
pub mod error;
pub mod pipeline;
pub mod probe;

pub use build::{Builder, CargoBuilder, target_triple};
pub use error::{Error, ErrorCategory, Result};
pub use pipeline::{DeployReport, Deployment, NoObserver, STAGING_DIR, Stage, StageObserver};
pub use probe::{Arch, Os, Platform, detect};

//! Producing an artifact for a detected platform.

use std::path::{Path, PathBuf};

use transport::{CancelToken, CommandRunner, CommandSpec, ExitFailure, Runner};

use crate::error::{Error, Result};
use crate::probe::{Arch, Os, Platform};

/// Builds a binary that runs on a given platform.
pub trait Builder: Send + Sync {
    /// Build for `platform` and return the local path of the artifact.
    fn build(&self, platform: &Platform, cancel: &CancelToken) -> Result<PathBuf>;
}

/// Rust target triple for a platform.
///
/// # Errors
///
/// Returns `Error::UnsupportedTarget` for pairs without a tier-1/2 target.
pub fn target_triple(platform: &Platform) -> Result<&'static str> {
    let triple = match (platform.os, platform.arch) {
        (Os::Linux, Arch::Amd64) => "x86_64-unknown-linux-gnu",
        (Os::Linux, Arch::I386) => "i686-unknown-linux-gnu",
        (Os::Linux, Arch::Arm) => "armv7-unknown-linux-gnueabihf",
        (Os::Linux, Arch::Arm64) => "aarch64-unknown-linux-gnu",
        (Os::Linux, Arch::S390x) => "s390x-unknown-linux-gnu",

        (Os::Darwin, Arch::Amd64) => "x86_64-apple-darwin",
        (Os::Darwin, Arch::Arm64) => "aarch64-apple-darwin",

        (Os::FreeBsd, Arch::Amd64) => "x86_64-unknown-freebsd",
        (Os::FreeBsd, Arch::I386) => "i686-unknown-freebsd",
        (Os::FreeBsd, Arch::Arm64) => "aarch64-unknown-freebsd",

        (Os::DragonFly, Arch::Amd64) => "x86_64-unknown-dragonfly",

        _ => {
            return Err(Error::UnsupportedTarget {
                what: "platform",
                value: platform.to_string(),
            });
        }
    };
    Ok(triple)
}

/// Cross-compiles one binary of a cargo package on this machine.
pub struct CargoBuilder {
    package_dir: PathBuf,
    bin: String,
    runner: Box<dyn CommandRunner>,
}

impl CargoBuilder {
    /// Build `bin` from the package at `package_dir` with the local cargo.
    pub fn new(package_dir: impl Into<PathBuf>, bin: impl Into<String>) -> Self {
        Self::with_runner(package_dir, bin, Runner::local())
    }

    /// Same as [`CargoBuilder::new`] with a custom runner for cargo.
    pub fn with_runner(
        package_dir: impl Into<PathBuf>,
        bin: impl Into<String>,
        runner: impl CommandRunner + 'static,
    ) -> Self {
        Self {
            package_dir: package_dir.into(),
            bin: bin.into(),
            runner: Box::new(runner),
        }
    }

    pub fn package_dir(&self) -> &Path {
        &self.package_dir
    }

    fn command(&self, triple: &str) -> CommandSpec {
        CommandSpec::new("cargo")
            .args(["build", "--release", "--target", triple, "--bin", self.bin.as_str()])
            .cwd(&self.package_dir)
    }

    /// Where cargo leaves the binary for `triple`
    pub fn artifact_path(&self, triple: &str) -> PathBuf {
        self.package_dir
            .join("target")
            .join(triple)
            .join("release")
            .join(&self.bin)
    }
}

impl Builder for CargoBuilder {
    fn build(&self, platform: &Platform, cancel: &CancelToken) -> Result<PathBuf> {
        let triple = target_triple(platform)?;
        let cmd = self.command(triple);
        log::info!("LOCAL: {cmd}");

        match self.runner.run(&cmd, cancel) {
            Ok(_) => {}
            Err(transport::Error::CommandFailed {
                command,
                failure,
                stdout,
                stderr,
            }) if failure != ExitFailure::Cancelled => {
                return Err(Error::Build {
                    command,
                    output: format!("{stdout}{stderr}"),
                });
            }
            Err(e) => return Err(e.into()),
        }

        let artifact = self.artifact_path(triple);
        log::debug!("Built {}", artifact.display());
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transport::testing::FakeRunner;

    fn linux_amd64() -> Platform {
        Platform {
            os: Os::Linux,
            arch: Arch::Amd64,
        }
    }

    #[test]
    fn test_target_triple() {
        assert_eq!(
            target_triple(&linux_amd64()).unwrap(),
            "x86_64-unknown-linux-gnu"
        );
        let err = target_triple(&Platform {
            os: Os::DragonFly,
            arch: Arch::S390x,
        })
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedTarget { what: "platform", .. }));
    }

    #[test]
    fn test_cargo_command_and_artifact() {
        let builder = CargoBuilder::with_runner("/src/agent", "agent", FakeRunner::new());
        let artifact = builder.build(&linux_amd64(), &CancelToken::new()).unwrap();
        assert_eq!(
            artifact,
            PathBuf::from("/src/agent/target/x86_64-unknown-linux-gnu/release/agent")
        );
        let cmd = builder.command("x86_64-unknown-linux-gnu");
        assert_eq!(
            cmd.argv(),
            vec![
                "cargo", "build", "--release", "--target", "x86_64-unknown-linux-gnu", "--bin",
                "agent",
            ]
        );
        assert_eq!(cmd.cwd.as_deref(), Some(Path::new("/src/agent")));
    }

    #[test]
    fn test_build_failure_carries_output() {
        let fake = FakeRunner::new();
        fake.fail(&["cargo"], 101, "error[E0425]: cannot find value `x`");
        let builder = CargoBuilder::with_runner("/src/agent", "agent", fake);

        let err = builder.build(&linux_amd64(), &CancelToken::new()).unwrap_err();
        match err {
            Error::Build { output, command } => {
                assert!(output.contains("E0425"));
                assert!(command.starts_with("cargo build"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

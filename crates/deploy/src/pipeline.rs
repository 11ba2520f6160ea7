//! Detect → Build → Transfer → Invoke.
//!
//! Stages run strictly in order and the first error aborts the run. Nothing
//! is retried and nothing already transferred is cleaned up.

use std::fmt;
use std::path::{Path, PathBuf};

use transport::{CancelToken, CommandRunner, CommandSpec, ExecutionResult};

use crate::build::Builder;
use crate::error::Result;
use crate::probe::{self, Platform};

/// Directory the artifact and its config are staged in on the target.
///
/// Fixed paths: two deploys of the same name to one host at the same time
/// overwrite each other.
pub const STAGING_DIR: &str = "/tmp";

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Detect,
    Build,
    TransferArtifact,
    TransferConfig,
    Invoke,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Detect => "detect platform",
            Self::Build => "build",
            Self::TransferArtifact => "transfer binary",
            Self::TransferConfig => "transfer config",
            Self::Invoke => "invoke",
        };
        f.write_str(name)
    }
}

/// Receives stage progress.
pub trait StageObserver {
    /// Called before a stage starts
    fn on_stage_start(&mut self, stage: Stage);

    /// Called after a stage succeeded
    fn on_stage_complete(&mut self, stage: Stage);
}

/// Observer that ignores everything
pub struct NoObserver;

impl StageObserver for NoObserver {
    fn on_stage_start(&mut self, _stage: Stage) {}
    fn on_stage_complete(&mut self, _stage: Stage) {}
}

/// What a successful deploy did.
#[derive(Debug, Clone)]
pub struct DeployReport {
    pub platform: Platform,
    /// Local build artifact
    pub artifact: PathBuf,
    pub remote_binary: String,
    pub remote_config: String,
    /// Captured output of the invoked binary
    pub output: ExecutionResult,
}

/// One deploy of a named binary with its config file.
pub struct Deployment<'a> {
    runner: &'a dyn CommandRunner,
    builder: &'a dyn Builder,
    name: String,
    config: PathBuf,
}

impl<'a> Deployment<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        builder: &'a dyn Builder,
        name: impl Into<String>,
        config: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            builder,
            name: name.into(),
            config: config.into(),
        }
    }

    /// Staging path of the binary: `/tmp/<name>`
    pub fn remote_binary(&self) -> String {
        format!("{STAGING_DIR}/{}", self.name)
    }

    /// Staging path of the config: `/tmp/<name>-config.yml`
    pub fn remote_config(&self) -> String {
        format!("{STAGING_DIR}/{}-config.yml", self.name)
    }

    /// Command that runs the staged binary against the staged config
    pub fn invocation(&self) -> CommandSpec {
        CommandSpec::new(self.remote_binary()).args(["--config".to_string(), self.remote_config()])
    }

    /// Run every stage.
    pub fn run(&self, cancel: &CancelToken, observer: &mut dyn StageObserver) -> Result<DeployReport> {
        let platform = stage(observer, Stage::Detect, || probe::detect(self.runner, cancel))?;
        log::info!("Deploying {} to {platform}", self.name);

        let artifact = stage(observer, Stage::Build, || self.builder.build(&platform, cancel))?;

        let remote_binary = self.remote_binary();
        stage(observer, Stage::TransferArtifact, || {
            self.push(&artifact, &remote_binary, cancel)
        })?;

        let remote_config = self.remote_config();
        stage(observer, Stage::TransferConfig, || {
            self.push(&self.config, &remote_config, cancel)
        })?;

        let output = stage(observer, Stage::Invoke, || {
            Ok(self.runner.run(&self.invocation(), cancel)?)
        })?;

        Ok(DeployReport {
            platform,
            artifact,
            remote_binary,
            remote_config,
            output,
        })
    }

    fn push(&self, local: &Path, remote: &str, cancel: &CancelToken) -> Result<()> {
        self.runner.put_file(local, remote, cancel)?;
        Ok(())
    }
}

fn stage<T>(
    observer: &mut dyn StageObserver,
    stage: Stage,
    f: impl FnOnce() -> Result<T>,
) -> Result<T> {
    observer.on_stage_start(stage);
    let value = f().inspect_err(|e| log::error!("Deploy stage '{stage}' failed: {e}"))?;
    observer.on_stage_complete(stage);
    Ok(value)
}

//! The command runner seam used by reconcilers and the deploy pipeline.

use std::path::Path;

use crate::backend::{Local, Ssh, Transport};
use crate::cancel::CancelToken;
use crate::command::{CommandSpec, ExecutionResult};
use crate::error::{Error, Result};
use crate::exec;
use crate::host::Host;

/// Executes commands against one target.
///
/// Implement this trait to substitute a fake in tests; production code
/// uses [`Runner`].
pub trait CommandRunner: Send + Sync {
    /// Run `spec` and capture its output. Exit failures are reported in
    /// the result, not as `Err`.
    fn execute(&self, spec: &CommandSpec, cancel: &CancelToken) -> Result<ExecutionResult>;

    /// Copy one local file to `remote` on the target.
    fn put_file(&self, local: &Path, remote: &str, cancel: &CancelToken) -> Result<()>;

    /// Run `spec` and turn an exit failure into [`Error::CommandFailed`],
    /// logging the command line and both streams first.
    fn run(&self, spec: &CommandSpec, cancel: &CancelToken) -> Result<ExecutionResult> {
        let result = self.execute(spec, cancel)?;
        check(spec, result)
    }
}

/// Turn a failed result into an error, reporting it to the log.
pub fn check(spec: &CommandSpec, result: ExecutionResult) -> Result<ExecutionResult> {
    let Some(failure) = result.failure else {
        return Ok(result);
    };

    let stdout = result.stdout_str();
    let stderr = result.stderr_str();

    log::error!("FAILED ({failure}): {spec}");
    if !stdout.trim().is_empty() {
        log::error!("stdout:\n{}", stdout.trim_end());
    }
    if !stderr.trim().is_empty() {
        log::error!("stderr:\n{}", stderr.trim_end());
    }

    Err(Error::CommandFailed {
        command: spec.to_string(),
        failure,
        stdout,
        stderr,
    })
}

/// [`CommandRunner`] that executes through a [`Transport`].
#[derive(Debug)]
pub struct Runner {
    transport: Box<dyn Transport>,
}

impl Runner {
    /// Create a runner over any transport.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
        }
    }

    /// Runner for this machine.
    pub fn local() -> Self {
        Self::new(Local)
    }

    /// Runner for a remote host over ssh.
    pub fn remote(host: Host) -> Self {
        Self::new(Ssh::new(host))
    }

    /// The underlying transport
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }
}

impl CommandRunner for Runner {
    fn execute(&self, spec: &CommandSpec, cancel: &CancelToken) -> Result<ExecutionResult> {
        let wrapped = self.transport.wrap(spec);
        log::debug!("{}: {spec}", self.transport.describe());
        exec::execute(&wrapped, cancel)
    }

    fn put_file(&self, local: &Path, remote: &str, cancel: &CancelToken) -> Result<()> {
        log::info!(
            "PUT: {} -> {} ({})",
            local.display(),
            remote,
            self.transport.describe()
        );
        let spec = self.transport.push(local, remote);
        check(&spec, exec::execute(&spec, cancel)?)?;
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::command::ExitFailure;
    use tempfile::TempDir;

    #[test]
    fn test_local_runner_run_success() {
        let runner = Runner::local();
        let result = runner
            .run(&CommandSpec::new("echo").arg("hi"), &CancelToken::new())
            .unwrap();
        assert_eq!(result.stdout_str(), "hi\n");
    }

    #[test]
    fn test_run_turns_failure_into_error_with_streams() {
        let runner = Runner::local();
        let spec = CommandSpec::new("sh").args(["-c", "echo o; echo e >&2; exit 4"]);
        let err = runner.run(&spec, &CancelToken::new()).unwrap_err();
        match err {
            Error::CommandFailed {
                failure,
                stdout,
                stderr,
                command,
            } => {
                assert_eq!(failure, ExitFailure::Code(4));
                assert_eq!(stdout, "o\n");
                assert_eq!(stderr, "e\n");
                assert!(command.starts_with("sh -c"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_execute_does_not_error_on_exit_failure() {
        let runner = Runner::local();
        let result = runner
            .execute(&CommandSpec::new("false"), &CancelToken::new())
            .unwrap();
        assert_eq!(result.failure, Some(ExitFailure::Code(1)));
    }

    #[test]
    fn test_local_put_file() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.bin");
        let dst = dir.path().join("dst.bin");
        std::fs::write(&src, b"\x7fELF").unwrap();

        Runner::local()
            .put_file(&src, &dst.to_string_lossy(), &CancelToken::new())
            .unwrap();
        assert_eq!(std::fs::read(&dst).unwrap(), b"\x7fELF");
    }

    #[test]
    fn test_put_file_failure() {
        let dir = TempDir::new().unwrap();
        let err = Runner::local()
            .put_file(
                &dir.path().join("missing"),
                &dir.path().join("dst").to_string_lossy(),
                &CancelToken::new(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));
    }
}

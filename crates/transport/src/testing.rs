//! Scriptable [`CommandRunner`] for tests.
//!
//! Records every spec it receives and answers with canned results matched
//! by argv prefix. Unmatched commands succeed with empty output.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::cancel::CancelToken;
use crate::command::{CommandSpec, ExecutionResult, ExitFailure};
use crate::error::Result;
use crate::runner::{CommandRunner, check};

#[derive(Debug)]
struct Response {
    prefix: Vec<String>,
    result: ExecutionResult,
}

/// Fake runner that never spawns a process.
#[derive(Debug, Default)]
pub struct FakeRunner {
    calls: Mutex<Vec<CommandSpec>>,
    pushes: Mutex<Vec<(PathBuf, String)>>,
    responses: Mutex<Vec<Response>>,
    push_failure: Mutex<Option<String>>,
}

impl FakeRunner {
    /// Create a runner with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands whose argv starts with `prefix` with `stdout`.
    pub fn respond(&self, prefix: &[&str], stdout: &str) -> &Self {
        self.script(
            prefix,
            ExecutionResult {
                stdout: stdout.as_bytes().to_vec(),
                ..Default::default()
            },
        )
    }

    /// Make commands whose argv starts with `prefix` exit with `code`.
    pub fn fail(&self, prefix: &[&str], code: i32, stderr: &str) -> &Self {
        self.script(
            prefix,
            ExecutionResult {
                stderr: stderr.as_bytes().to_vec(),
                failure: Some(ExitFailure::Code(code)),
                ..Default::default()
            },
        )
    }

    /// Make every `put_file` call fail with `stderr`.
    pub fn fail_pushes(&self, stderr: &str) -> &Self {
        *lock(&self.push_failure) = Some(stderr.to_string());
        self
    }

    fn script(&self, prefix: &[&str], result: ExecutionResult) -> &Self {
        lock(&self.responses).push(Response {
            prefix: prefix.iter().map(ToString::to_string).collect(),
            result,
        });
        self
    }

    /// Every spec executed so far, in order
    pub fn calls(&self) -> Vec<CommandSpec> {
        lock(&self.calls).clone()
    }

    /// Executed argv lines joined with spaces, for compact assertions
    pub fn lines(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.argv().join(" ")).collect()
    }

    /// Number of executed commands running `program`
    pub fn count(&self, program: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.program == program)
            .count()
    }

    /// Every `(local, remote)` pair pushed so far
    pub fn pushes(&self) -> Vec<(PathBuf, String)> {
        lock(&self.pushes).clone()
    }
}

impl CommandRunner for FakeRunner {
    fn execute(&self, spec: &CommandSpec, _cancel: &CancelToken) -> Result<ExecutionResult> {
        lock(&self.calls).push(spec.clone());
        let argv = spec.argv();
        let responses = lock(&self.responses);
        let result = responses
            .iter()
            .find(|r| argv.len() >= r.prefix.len() && r.prefix.iter().zip(&argv).all(|(p, a)| p == a))
            .map(|r| r.result.clone())
            .unwrap_or_default();
        Ok(result)
    }

    fn put_file(&self, local: &Path, remote: &str, _cancel: &CancelToken) -> Result<()> {
        lock(&self.pushes).push((local.to_path_buf(), remote.to_string()));
        if let Some(stderr) = lock(&self.push_failure).clone() {
            let spec = CommandSpec::new("scp")
                .arg(local.to_string_lossy())
                .arg(remote);
            let result = ExecutionResult {
                stderr: stderr.into_bytes(),
                failure: Some(ExitFailure::Code(1)),
                ..Default::default()
            };
            check(&spec, result)?;
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_prefix_match() {
        let fake = FakeRunner::new();
        fake.respond(&["uname", "-sm"], "Linux x86_64\n")
            .fail(&["false"], 1, "nope");

        let cancel = CancelToken::new();
        let out = fake
            .execute(&CommandSpec::new("uname").arg("-sm"), &cancel)
            .unwrap();
        assert_eq!(out.stdout_str(), "Linux x86_64\n");

        assert!(fake.run(&CommandSpec::new("false"), &cancel).is_err());
        assert!(fake.run(&CommandSpec::new("true"), &cancel).is_ok());
        assert_eq!(fake.lines(), vec!["uname -sm", "false", "true"]);
        assert_eq!(fake.count("uname"), 1);
    }
}

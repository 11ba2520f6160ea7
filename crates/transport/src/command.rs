//! Command descriptions and captured results.

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

/// Data fed to a command's standard input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// In-memory bytes
    Bytes(Vec<u8>),
    /// Contents of a local file, streamed
    File(PathBuf),
}

/// A single program invocation.
///
/// Specs are plain values: transports build new specs from them instead of
/// mutating the caller's copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program name or path
    pub program: String,
    /// Arguments, passed verbatim
    pub args: Vec<String>,
    /// Optional standard input
    pub input: Option<Input>,
    /// Optional working directory
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    /// Create a spec for `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            input: None,
            cwd: None,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Feed `input` to standard input.
    pub fn input(mut self, input: Input) -> Self {
        self.input = Some(input);
        self
    }

    /// Feed in-memory bytes to standard input.
    pub fn stdin_bytes(self, bytes: impl Into<Vec<u8>>) -> Self {
        self.input(Input::Bytes(bytes.into()))
    }

    /// Run in `dir`.
    pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Program followed by arguments
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line: Vec<Cow<'_, str>> = self.argv().into_iter().map(shell_quote).collect();
        write!(f, "{}", line.join(" "))?;
        if let Some(dir) = &self.cwd {
            write!(f, " (in {})", dir.display())?;
        }
        Ok(())
    }
}

/// How a process ended unsuccessfully
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitFailure {
    /// Non-zero exit status
    Code(i32),
    /// Terminated by a signal
    Signal(i32),
    /// Killed because the cancel token fired
    Cancelled,
}

impl fmt::Display for ExitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "exited with status {code}"),
            Self::Signal(signal) => write!(f, "was killed by signal {signal}"),
            Self::Cancelled => write!(f, "was cancelled"),
        }
    }
}

/// Everything a finished process produced.
///
/// Both streams are populated even when the process failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub failure: Option<ExitFailure>,
}

impl ExecutionResult {
    /// A result for a command that was never started because the token
    /// had already fired.
    pub fn cancelled() -> Self {
        Self {
            failure: Some(ExitFailure::Cancelled),
            ..Default::default()
        }
    }

    /// Whether the process exited successfully
    pub fn success(&self) -> bool {
        self.failure.is_none()
    }

    /// Get stdout as a string
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as a string
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }
}

/// Quote an argument for a POSIX shell, leaving plain words untouched.
pub fn shell_quote(arg: &str) -> Cow<'_, str> {
    let plain = !arg.is_empty()
        && arg
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"_-./=:,@%+".contains(&b));
    if plain {
        Cow::Borrowed(arg)
    } else {
        Cow::Owned(format!("'{}'", arg.replace('\'', "'\\''")))
    }
}

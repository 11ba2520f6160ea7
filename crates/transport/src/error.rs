//! Error types for command execution.
//!
//! Every failure that comes out of a finished process carries both captured
//! streams so callers can report them without running the command again.

use std::fmt;
use thiserror::Error;

use crate::command::ExitFailure;

/// Categories of transport errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A process could not be started or exited unsuccessfully
    Transport,
    /// The run was cancelled by the caller
    Cancelled,
    /// The host descriptor or other input was invalid
    Configuration,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Transport => "Command execution failed",
            Self::Cancelled => "Cancelled",
            Self::Configuration => "Invalid configuration",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Transport => "Check the captured output above for the cause",
            Self::Cancelled => "Re-run the operation when ready",
            Self::Configuration => "Fix the host descriptor before contacting the host",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while running commands.
#[derive(Debug, Error)]
pub enum Error {
    /// The program could not be started
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        /// The attempted command line
        command: String,
        /// Underlying OS error
        source: std::io::Error,
    },

    /// The program ran and reported failure
    #[error("`{command}` {failure}")]
    CommandFailed {
        /// The attempted command line
        command: String,
        /// How the process ended
        failure: ExitFailure,
        /// Captured standard output
        stdout: String,
        /// Captured standard error
        stderr: String,
    },

    /// Host descriptor is missing or malformed
    #[error("invalid host configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::CommandFailed {
                failure: ExitFailure::Cancelled,
                ..
            } => ErrorCategory::Cancelled,
            Error::Config(_) => ErrorCategory::Configuration,
            _ => ErrorCategory::Transport,
        }
    }

    /// Whether the command was stopped through its cancel token.
    pub fn is_cancelled(&self) -> bool {
        self.category() == ErrorCategory::Cancelled
    }

    /// Captured stderr of a failed command, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Error::CommandFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, Error>;

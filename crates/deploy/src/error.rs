//! Error types for the deploy pipeline.

use std::fmt;
use thiserror::Error;

/// Result type alias for deploy operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of deploy errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The host runs an OS or architecture we cannot target
    UnsupportedTarget,
    /// Compilation failed
    Build,
    /// A remote command or transfer failed
    Transport,
    /// The run was cancelled
    Cancelled,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnsupportedTarget => "Unsupported target platform",
            Self::Build => "Build failed",
            Self::Transport => "Remote command failed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::UnsupportedTarget => "Deploy to a supported OS/architecture",
            Self::Build => "Fix the compiler errors above; is the target installed (rustup target add)?",
            Self::Transport => "Check that the host is reachable with ssh and scp",
            Self::Cancelled => "Re-run the deploy when ready",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while deploying.
#[derive(Debug, Error)]
pub enum Error {
    /// A probe token has no mapping, or the platform has no build target
    #[error("unsupported {what}: {value}")]
    UnsupportedTarget {
        /// Which token ("operating system", "architecture", "platform")
        what: &'static str,
        /// The value reported by the host
        value: String,
    },

    /// `uname -sm` did not return exactly two fields
    #[error("malformed platform probe output: {0:?}")]
    MalformedProbe(String),

    /// The build command failed
    #[error("build failed: `{command}`\n{output}")]
    Build {
        /// The attempted build command
        command: String,
        /// Captured compiler output
        output: String,
    },

    /// A remote command or transfer failed
    #[error(transparent)]
    Transport(#[from] transport::Error),
}

impl Error {
    /// Get the category of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedTarget { .. } | Self::MalformedProbe(_) => {
                ErrorCategory::UnsupportedTarget
            }
            Self::Build { .. } => ErrorCategory::Build,
            Self::Transport(e) if e.is_cancelled() => ErrorCategory::Cancelled,
            Self::Transport(_) => ErrorCategory::Transport,
        }
    }
}

//! Error types for reconciliation.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Categories of reconciliation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A subprocess failed or could not be started
    Transport,
    /// The account database could not be read
    Database,
    /// The requested capability is not implemented
    Unsupported,
    /// The desired state was described incorrectly
    InvalidInput,
    /// The working tree is not in a state we can reason about
    Repository,
    /// Reading or changing the local filesystem failed
    Filesystem,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Transport => "Command execution failed",
            Self::Database => "Account database unreadable",
            Self::Unsupported => "Not supported",
            Self::InvalidInput => "Invalid desired state",
            Self::Repository => "Unexpected repository state",
            Self::Filesystem => "Filesystem operation failed",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Transport => "Check the captured output above for the cause",
            Self::Database => "Check that /etc/passwd and /etc/group are readable",
            Self::Unsupported => "Perform this step by hand",
            Self::InvalidInput => "Fix the arguments and try again",
            Self::Repository => "Inspect the checkout with git status",
            Self::Filesystem => "Check that the path exists and you may write to it (or use --sudo)",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while converging an entity.
#[derive(Debug, Error)]
pub enum Error {
    /// A command failed; the transport error carries both streams
    #[error(transparent)]
    Transport(#[from] transport::Error),

    /// Reading the account database failed for a reason other than a miss
    #[error(transparent)]
    Database(#[from] sysdb::Error),

    /// The operation is known but not implemented
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A path that must be absolute was not
    #[error("not an absolute path: {}", .0.display())]
    InvalidPath(PathBuf),

    /// A path component exists but is not a directory
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// A repository is missing state we need to read
    #[error("repository {}: {message}", .path.display())]
    Repository {
        /// The checkout
        path: PathBuf,
        /// What was wrong
        message: String,
    },

    /// Local filesystem failure
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) => ErrorCategory::Transport,
            Self::Database(_) => ErrorCategory::Database,
            Self::Unsupported(_) => ErrorCategory::Unsupported,
            Self::InvalidPath(_) | Self::NotADirectory(_) => ErrorCategory::InvalidInput,
            Self::Repository { .. } => ErrorCategory::Repository,
            Self::Io(_) => ErrorCategory::Filesystem,
        }
    }

    /// Check if this error means the operation was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_cancelled())
    }
}

/// Result type for reconciliation.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category() {
        assert_eq!(
            Error::Unsupported("submodules".into()).category(),
            ErrorCategory::Unsupported
        );
        assert_eq!(
            Error::InvalidPath("rel/dir".into()).category(),
            ErrorCategory::InvalidInput
        );
        let err: Error = sysdb::Error::Io(std::io::Error::other("boom")).into();
        assert_eq!(err.category(), ErrorCategory::Database);
    }

    #[test]
    fn test_io_error_names_its_cause_once() {
        use std::error::Error as _;

        let err: Error = std::io::Error::from(std::io::ErrorKind::PermissionDenied).into();
        assert_eq!(err.category(), ErrorCategory::Filesystem);
        assert_eq!(err.to_string(), "I/O error");
        assert!(err.source().is_some_and(|s| s.to_string().contains("denied")));
    }

    #[test]
    fn test_display() {
        let err = Error::InvalidPath("var/www".into());
        assert_eq!(err.to_string(), "not an absolute path: var/www");
    }
}

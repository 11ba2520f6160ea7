use thiserror::Error;

/// Errors that can occur while reading the account databases.
///
/// The `Unknown*` variants mean the record is absent. Callers that only
/// want to know whether an account exists should check [`Error::is_unknown`]
/// instead of treating every error as "not found".
#[derive(Debug, Error)]
pub enum Error {
    /// No passwd record with this name
    #[error("unknown user: {0}")]
    UnknownUser(String),

    /// No passwd record with this uid
    #[error("unknown user id: {0}")]
    UnknownUserId(u32),

    /// No group record with this name
    #[error("unknown group: {0}")]
    UnknownGroup(String),

    /// No group record with this gid
    #[error("unknown group id: {0}")]
    UnknownGroupId(u32),

    /// The database could not be read
    #[error("IO error")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true if the lookup completed and found no matching record.
    pub fn is_unknown(&self) -> bool {
        !matches!(self, Error::Io(_))
    }
}

/// Result type for database lookups
pub type Result<T> = std::result::Result<T, Error>;

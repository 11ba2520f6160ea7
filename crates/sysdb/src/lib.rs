//! # sysdb
//!
//! Read-only access to the local account and group databases
//! (`/etc/passwd` and `/etc/group`).
//!
//! Lookups never spawn a process. A lookup that reads the whole database
//! without a match returns one of the `Unknown*` errors, which callers
//! treat as "absent"; anything else is an I/O failure.
//!
//! ## Example
//!
//! ```no_run
//! use sysdb::{AccountDatabase, Files};
//!
//! let db = Files::default();
//! match db.user("deploy") {
//!     Ok(user) => println!("uid {}", user.uid),
//!     Err(e) if e.is_unknown() => println!("no such user"),
//!     Err(e) => eprintln!("cannot read passwd: {e}"),
//! }
//! ```

#![deny(unsafe_code)]

/// Error types for database lookups.
pub mod error;
/// Group database parser.
pub mod group;
mod parse;
/// Passwd database parser.
pub mod passwd;

pub use error::{Error, Result};
pub use group::{GROUP_FILE, Group};
pub use passwd::{PASSWD_FILE, User};

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Lookup interface over the account databases.
///
/// Reconcilers take this as an injected dependency so tests can supply
/// an in-memory database.
pub trait AccountDatabase: Send + Sync {
    /// Find a user by login name
    fn user(&self, name: &str) -> Result<User>;

    /// Find a user by uid
    fn user_by_id(&self, uid: u32) -> Result<User>;

    /// Find a group by name
    fn group(&self, name: &str) -> Result<Group>;

    /// Find a group by gid
    fn group_by_id(&self, gid: u32) -> Result<Group>;

    /// Names of the supplementary groups that list `user` as a member
    fn memberships(&self, user: &str) -> Result<Vec<String>>;
}

/// Database backed by passwd/group files on disk.
///
/// Files are reopened on every lookup, so results always reflect the
/// current state of the system.
#[derive(Debug, Clone)]
pub struct Files {
    passwd: PathBuf,
    group: PathBuf,
}

impl Default for Files {
    fn default() -> Self {
        Self::new(PASSWD_FILE, GROUP_FILE)
    }
}

impl Files {
    /// Create a database reading from custom file locations.
    pub fn new(passwd: impl Into<PathBuf>, group: impl Into<PathBuf>) -> Self {
        Self {
            passwd: passwd.into(),
            group: group.into(),
        }
    }

    fn open(path: &Path) -> Result<BufReader<File>> {
        Ok(BufReader::new(File::open(path)?))
    }
}

impl AccountDatabase for Files {
    fn user(&self, name: &str) -> Result<User> {
        passwd::find_user(name, Self::open(&self.passwd)?)
    }

    fn user_by_id(&self, uid: u32) -> Result<User> {
        passwd::find_user_id(uid, Self::open(&self.passwd)?)
    }

    fn group(&self, name: &str) -> Result<Group> {
        group::find_group(name, Self::open(&self.group)?)
    }

    fn group_by_id(&self, gid: u32) -> Result<Group> {
        group::find_group_id(gid, Self::open(&self.group)?)
    }

    fn memberships(&self, user: &str) -> Result<Vec<String>> {
        group::find_memberships(user, Self::open(&self.group)?)
    }
}

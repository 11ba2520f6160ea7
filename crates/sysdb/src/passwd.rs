//! Parser for the passwd database.
//!
//! Record layout: `name:password:uid:gid:comment:home[:shell]`

use serde::Serialize;
use std::io::BufRead;

use crate::error::{Error, Result};
use crate::parse;

/// Default location of the passwd database
pub const PASSWD_FILE: &str = "/etc/passwd";

const MIN_FIELDS: usize = 6;
const MAX_FIELDS: usize = 7;

/// An account record from the passwd database
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Login name
    pub name: String,
    /// Numeric user id
    pub uid: u32,
    /// Numeric primary group id
    pub gid: u32,
    /// Comment (GECOS) field, usually the full name
    pub comment: String,
    /// Home directory
    pub home: String,
    /// Login shell, empty when the record leaves it unset
    pub shell: String,
}

impl User {
    fn from_fields(fields: &[&str]) -> Option<Self> {
        let uid = fields[2].parse().ok()?;
        let gid = fields[3].parse().ok()?;
        Some(Self {
            name: fields[0].to_string(),
            uid,
            gid,
            comment: fields[4].to_string(),
            home: fields[5].to_string(),
            shell: fields.get(6).map(|s| (*s).to_string()).unwrap_or_default(),
        })
    }
}

/// Find a user by login name.
pub fn find_user<R: BufRead>(name: &str, reader: R) -> Result<User> {
    parse::scan(reader, MIN_FIELDS, MAX_FIELDS, |fields| {
        if fields[0] != name {
            return None;
        }
        let user = User::from_fields(fields);
        if user.is_none() {
            log::debug!("Skipping passwd record for {name} with non-numeric ids");
        }
        user
    })?
    .ok_or_else(|| Error::UnknownUser(name.to_string()))
}

/// Find a user by numeric uid.
pub fn find_user_id<R: BufRead>(uid: u32, reader: R) -> Result<User> {
    parse::scan(reader, MIN_FIELDS, MAX_FIELDS, |fields| {
        User::from_fields(fields).filter(|u| u.uid == uid)
    })?
    .ok_or(Error::UnknownUserId(uid))
}

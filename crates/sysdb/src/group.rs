//! Parser for the group database.
//!
//! Record layout: `name:password:gid:member,member,...`

use serde::Serialize;
use std::io::BufRead;

use crate::error::{Error, Result};
use crate::parse;

/// Default location of the group database
pub const GROUP_FILE: &str = "/etc/group";

const FIELDS: usize = 4;

/// A record from the group database
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    /// Group name
    pub name: String,
    /// Numeric group id
    pub gid: u32,
    /// Users listed as supplementary members
    pub members: Vec<String>,
}

impl Group {
    fn from_fields(fields: &[&str]) -> Option<Self> {
        let gid = fields[2].parse().ok()?;
        let members = fields[3]
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(ToString::to_string)
            .collect();
        Some(Self {
            name: fields[0].to_string(),
            gid,
            members,
        })
    }

    /// Check if a user is listed as a member of this group
    pub fn has_member(&self, user: &str) -> bool {
        self.members.iter().any(|m| m == user)
    }
}

/// Find a group by name.
pub fn find_group<R: BufRead>(name: &str, reader: R) -> Result<Group> {
    parse::scan(reader, FIELDS, FIELDS, |fields| {
        if fields[0] == name && !fields[2].is_empty() {
            Group::from_fields(fields)
        } else {
            None
        }
    })?
    .ok_or_else(|| Error::UnknownGroup(name.to_string()))
}

/// Find a group by numeric gid.
pub fn find_group_id<R: BufRead>(gid: u32, reader: R) -> Result<Group> {
    parse::scan(reader, FIELDS, FIELDS, |fields| {
        Group::from_fields(fields).filter(|g| g.gid == gid)
    })?
    .ok_or(Error::UnknownGroupId(gid))
}

/// Names of every group that lists `user` as a supplementary member.
pub fn find_memberships<R: BufRead>(user: &str, reader: R) -> Result<Vec<String>> {
    let names = parse::scan_all(reader, FIELDS, FIELDS, |fields| {
        Group::from_fields(fields)
            .filter(|g| g.has_member(user))
            .map(|g| g.name)
    })?;
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const GROUP: &str = "\
wheel:*:0:root
# comment line
daemon:x:1:
docker:x:998:alice, bob
dev:x:1000:bob
nogid:x::alice
";

    #[test]
    fn test_find_group_by_name() {
        let group = find_group("docker", Cursor::new(GROUP)).unwrap();
        assert_eq!(group.gid, 998);
        assert_eq!(group.members, vec!["alice", "bob"]);
    }

    #[test]
    fn test_find_group_empty_members() {
        let group = find_group("daemon", Cursor::new(GROUP)).unwrap();
        assert!(group.members.is_empty());
    }

    #[test]
    fn test_find_group_requires_gid() {
        let err = find_group("nogid", Cursor::new(GROUP)).unwrap_err();
        assert!(matches!(err, Error::UnknownGroup(_)));
    }

    #[test]
    fn test_find_group_by_id() {
        let group = find_group_id(0, Cursor::new(GROUP)).unwrap();
        assert_eq!(group.name, "wheel");

        let err = find_group_id(31337, Cursor::new(GROUP)).unwrap_err();
        assert!(matches!(err, Error::UnknownGroupId(31337)));
        assert!(err.is_unknown());
    }

    #[test]
    fn test_find_memberships() {
        let groups = find_memberships("bob", Cursor::new(GROUP)).unwrap();
        assert_eq!(groups, vec!["docker", "dev"]);

        let groups = find_memberships("carol", Cursor::new(GROUP)).unwrap();
        assert!(groups.is_empty());
    }
}

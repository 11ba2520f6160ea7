//! In-memory account database and log capture for reconciler tests.

use std::cell::RefCell;
use std::sync::{Mutex, Once};

use sysdb::{AccountDatabase, Error, Group, Result, User};

#[derive(Debug, Default)]
pub struct MemoryDb {
    users: Mutex<Vec<User>>,
    groups: Mutex<Vec<Group>>,
    unreadable: bool,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// A database whose every lookup fails with an I/O error
    pub fn unreadable() -> Self {
        Self {
            unreadable: true,
            ..Self::default()
        }
    }

    pub fn with_group(self, name: &str, gid: u32, members: &[&str]) -> Self {
        self.add_group(name, gid, members);
        self
    }

    pub fn with_user(self, user: User) -> Self {
        self.add_user(user);
        self
    }

    pub fn add_group(&self, name: &str, gid: u32, members: &[&str]) {
        self.groups.lock().unwrap().push(Group {
            name: name.to_string(),
            gid,
            members: members.iter().map(ToString::to_string).collect(),
        });
    }

    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    fn check(&self) -> Result<()> {
        if self.unreadable {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "permission denied",
            )));
        }
        Ok(())
    }
}

pub fn user(name: &str, uid: u32, gid: u32) -> User {
    User {
        name: name.to_string(),
        uid,
        gid,
        comment: String::new(),
        home: format!("/home/{name}"),
        shell: "/bin/sh".to_string(),
    }
}

impl AccountDatabase for MemoryDb {
    fn user(&self, name: &str) -> Result<User> {
        self.check()?;
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.name == name)
            .cloned()
            .ok_or_else(|| Error::UnknownUser(name.to_string()))
    }

    fn user_by_id(&self, uid: u32) -> Result<User> {
        self.check()?;
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.uid == uid)
            .cloned()
            .ok_or(Error::UnknownUserId(uid))
    }

    fn group(&self, name: &str) -> Result<Group> {
        self.check()?;
        self.groups
            .lock()
            .unwrap()
            .iter()
            .find(|g| g.name == name)
            .cloned()
            .ok_or_else(|| Error::UnknownGroup(name.to_string()))
    }

    fn group_by_id(&self, gid: u32) -> Result<Group> {
        self.check()?;
        self.groups
            .lock()
            .unwrap()
            .iter()
            .find(|g| g.gid == gid)
            .cloned()
            .ok_or(Error::UnknownGroupId(gid))
    }

    fn memberships(&self, user: &str) -> Result<Vec<String>> {
        self.check()?;
        Ok(self
            .groups
            .lock()
            .unwrap()
            .iter()
            .filter(|g| g.has_member(user))
            .map(|g| g.name.clone())
            .collect())
    }
}

thread_local! {
    static RECORDS: RefCell<Vec<(log::Level, String)>> = const { RefCell::new(Vec::new()) };
}

/// Logger that keeps each thread's records apart, so parallel tests only
/// see their own.
struct Capture;

impl log::Log for Capture {
    fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        RECORDS.with(|r| r.borrow_mut().push((record.level(), record.args().to_string())));
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture;

/// Start recording log output on the current thread.
pub fn capture_logs() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        log::set_logger(&CAPTURE).unwrap();
        log::set_max_level(log::LevelFilter::Trace);
    });
    RECORDS.with(|r| r.borrow_mut().clear());
}

/// Messages logged at `level` on this thread since [`capture_logs`]
pub fn captured(level: log::Level) -> Vec<String> {
    RECORDS.with(|r| {
        r.borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message.clone())
            .collect()
    })
}

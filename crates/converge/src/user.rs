//! User reconciler (`useradd` / `usermod`)
//!
//! Only attributes set on the [`UserSpec`] are compared. Expiry, password,
//! home directory creation and the system flag are applied when the
//! account is created and never revisited.

use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::path::PathBuf;

use sysdb::{AccountDatabase, User};
use transport::CommandSpec;

use crate::context::ApplyContext;
use crate::error::Result;
use crate::reconcile::Reconciler;
use crate::types::Action;

/// Format `useradd --expiredate` accepts
pub const EXPIRY_FORMAT: &str = "%Y-%m-%d";

/// Desired state of a user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSpec {
    pub uid: Option<u32>,
    /// Primary group, by name or numeric gid
    pub group: Option<String>,
    /// Supplementary groups
    pub groups: Vec<String>,
    /// Keep supplementary groups not listed in `groups`
    pub append_groups: bool,
    /// GECOS field, usually the full name
    pub comment: Option<String>,
    pub home: Option<PathBuf>,
    pub shell: Option<String>,
    /// Day the account is disabled
    pub expires: Option<NaiveDate>,
    /// Encrypted password as returned by crypt(3)
    pub password: Option<String>,
    pub create_home: bool,
    pub system: bool,
}

impl Default for UserSpec {
    fn default() -> Self {
        Self {
            uid: None,
            group: None,
            groups: Vec::new(),
            append_groups: false,
            comment: None,
            home: None,
            shell: None,
            expires: None,
            password: None,
            create_home: true,
            system: false,
        }
    }
}

impl UserSpec {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_uid(mut self, uid: u32) -> Self {
        self.uid = Some(uid);
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    #[must_use]
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_append_groups(mut self, append: bool) -> Self {
        self.append_groups = append;
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    #[must_use]
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    #[must_use]
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = Some(shell.into());
        self
    }

    #[must_use]
    pub fn with_expires(mut self, date: NaiveDate) -> Self {
        self.expires = Some(date);
        self
    }

    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn with_create_home(mut self, create: bool) -> Self {
        self.create_home = create;
        self
    }

    #[must_use]
    pub fn with_system(mut self, system: bool) -> Self {
        self.system = system;
        self
    }
}

/// A user account as read from the databases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedUser {
    pub account: User,
    /// Name of the primary group, if the gid resolves to one
    pub primary_group: Option<String>,
    /// Gid of the group the spec asks for, if it resolves to one
    pub wanted_gid: Option<u32>,
    /// Supplementary groups listing this user
    pub groups: Vec<String>,
}

/// Reconciles user accounts.
pub struct Users<'a> {
    ctx: ApplyContext<'a>,
    db: &'a dyn AccountDatabase,
}

impl<'a> Users<'a> {
    pub fn new(ctx: ApplyContext<'a>, db: &'a dyn AccountDatabase) -> Self {
        Self { ctx, db }
    }

    /// Gid for a group given by number or name; `None` if no such group.
    fn resolve_gid(&self, group: &str) -> Result<Option<u32>> {
        if let Ok(gid) = group.parse::<u32>() {
            return Ok(Some(gid));
        }
        match self.db.group(group) {
            Ok(found) => Ok(Some(found.gid)),
            Err(e) if e.is_unknown() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl Reconciler for Users<'_> {
    type Spec = UserSpec;
    type Observed = ObservedUser;

    fn kind(&self) -> &'static str {
        "user"
    }

    fn context(&self) -> ApplyContext<'_> {
        self.ctx
    }

    fn inspect(&self, name: &str, spec: &UserSpec) -> Result<Option<ObservedUser>> {
        let account = match self.db.user(name) {
            Ok(account) => account,
            Err(e) if e.is_unknown() => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let primary_group = match self.db.group_by_id(account.gid) {
            Ok(group) => Some(group.name),
            Err(e) if e.is_unknown() => {
                log::debug!("user {name}: gid {} has no group entry", account.gid);
                None
            }
            Err(e) => return Err(e.into()),
        };

        let wanted_gid = match spec.group.as_deref() {
            None => None,
            Some(group) => self.resolve_gid(group)?,
        };

        let groups = self.db.memberships(name)?;

        Ok(Some(ObservedUser {
            account,
            primary_group,
            wanted_gid,
            groups,
        }))
    }

    fn plan(&self, name: &str, observed: Option<&ObservedUser>, spec: &UserSpec) -> Action {
        match observed {
            None => Action::Add(add_command(name, spec)),
            Some(observed) => {
                let args = modify_args(observed, spec);
                if args.is_empty() {
                    Action::None
                } else {
                    log::debug!("user {name}: {} argument(s) differ", args.len());
                    Action::Modify(CommandSpec::new("usermod").args(args).arg(name))
                }
            }
        }
    }
}

fn add_command(name: &str, spec: &UserSpec) -> CommandSpec {
    let mut args: Vec<String> = Vec::new();
    if let Some(uid) = spec.uid {
        args.extend(["--uid".into(), uid.to_string()]);
    }
    if let Some(group) = &spec.group {
        args.extend(["--gid".into(), group.clone()]);
    }
    if !spec.groups.is_empty() {
        args.extend(["--groups".into(), spec.groups.join(",")]);
    }
    if let Some(comment) = &spec.comment {
        args.extend(["--comment".into(), comment.clone()]);
    }
    if let Some(home) = &spec.home {
        args.extend(["--home-dir".into(), home.display().to_string()]);
    }
    if let Some(shell) = &spec.shell {
        args.extend(["--shell".into(), shell.clone()]);
    }
    if let Some(date) = spec.expires {
        args.extend(["--expiredate".into(), date.format(EXPIRY_FORMAT).to_string()]);
    }
    if let Some(password) = &spec.password {
        args.extend(["--password".into(), password.clone()]);
    }
    let home_flag = if spec.create_home { "--create-home" } else { "-M" };
    args.push(home_flag.into());
    if spec.system {
        args.push("--system".into());
    }
    CommandSpec::new("useradd").args(args).arg(name)
}

fn modify_args(observed: &ObservedUser, spec: &UserSpec) -> Vec<String> {
    let account = &observed.account;
    let mut args: Vec<String> = Vec::new();

    if let Some(uid) = spec.uid.filter(|uid| *uid != account.uid) {
        args.extend(["--uid".into(), uid.to_string()]);
    }

    let on_wanted_gid = observed.wanted_gid == Some(account.gid);
    if let Some(group) = spec.group.as_ref().filter(|_| !on_wanted_gid) {
        args.extend(["--gid".into(), group.clone()]);
    }

    if !spec.groups.is_empty() {
        // membership in the primary group comes from the gid, whatever
        // the member lists say
        let mut primary: BTreeSet<&str> =
            observed.primary_group.iter().map(String::as_str).collect();
        if on_wanted_gid {
            primary.extend(spec.group.as_deref());
        }
        let desired: BTreeSet<&str> = spec
            .groups
            .iter()
            .map(String::as_str)
            .filter(|g| !primary.contains(g))
            .collect();
        let current: BTreeSet<&str> = observed
            .groups
            .iter()
            .map(String::as_str)
            .filter(|g| !primary.contains(g))
            .collect();

        if spec.append_groups {
            if !desired.is_subset(&current) {
                args.extend(["--append".into(), "--groups".into(), spec.groups.join(",")]);
            }
        } else if desired != current {
            args.extend(["--groups".into(), spec.groups.join(",")]);
        }
    }

    if let Some(comment) = spec.comment.as_ref().filter(|c| **c != account.comment) {
        args.extend(["--comment".into(), comment.clone()]);
    }

    if let Some(home) = spec
        .home
        .as_ref()
        .filter(|h| h.as_os_str() != account.home.as_str())
    {
        args.extend(["--home".into(), home.display().to_string()]);
    }

    if let Some(shell) = spec.shell.as_ref().filter(|s| **s != account.shell) {
        args.extend(["--shell".into(), shell.clone()]);
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryDb, user};
    use crate::types::ApplyResult;
    use transport::CancelToken;
    use transport::testing::FakeRunner;

    fn observed(db: &MemoryDb, name: &str, spec: &UserSpec) -> ObservedUser {
        let fake = FakeRunner::new();
        let cancel = CancelToken::new();
        Users::new(ApplyContext::new(&fake, &cancel), db)
            .inspect(name, spec)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_add_command_full() {
        let spec = UserSpec::new()
            .with_uid(1500)
            .with_group("deploy")
            .with_groups(["adm", "www-data"])
            .with_comment("Deploy User")
            .with_home("/srv/deploy")
            .with_shell("/bin/bash")
            .with_expires(NaiveDate::from_ymd_opt(2030, 1, 31).unwrap())
            .with_password("$6$salt$hash")
            .with_system(true);

        let cmd = add_command("deploy", &spec);
        assert_eq!(
            cmd.argv().join(" "),
            "useradd --uid 1500 --gid deploy --groups adm,www-data --comment Deploy User \
             --home-dir /srv/deploy --shell /bin/bash --expiredate 2030-01-31 \
             --password $6$salt$hash --create-home --system deploy"
        );
    }

    #[test]
    fn test_add_command_without_home() {
        let cmd = add_command("svc", &UserSpec::new().with_create_home(false));
        assert_eq!(cmd.argv(), vec!["useradd", "-M", "svc"]);
    }

    #[test]
    fn test_ensure_absent_adds_once_then_settles() {
        let fake = FakeRunner::new();
        let cancel = CancelToken::new();
        let db = MemoryDb::new().with_group("deploy", 1500, &[]);
        let users = Users::new(ApplyContext::new(&fake, &cancel), &db);
        let spec = UserSpec::new().with_uid(1500).with_group("deploy");

        assert_eq!(users.ensure("deploy", &spec).unwrap(), ApplyResult::Created);
        assert_eq!(fake.count("useradd"), 1);
        assert_eq!(fake.count("usermod"), 0);

        db.add_user(user("deploy", 1500, 1500));
        assert_eq!(users.ensure("deploy", &spec).unwrap(), ApplyResult::NoChange);
        assert_eq!(fake.calls().len(), 1);
    }

    #[test]
    fn test_matching_user_runs_nothing() {
        let fake = FakeRunner::new();
        let cancel = CancelToken::new();
        let mut account = user("deploy", 1500, 1500);
        account.comment = "Deploy User".into();
        let db = MemoryDb::new()
            .with_group("deploy", 1500, &[])
            .with_group("adm", 4, &["deploy"])
            .with_user(account);
        let users = Users::new(ApplyContext::new(&fake, &cancel), &db);

        let spec = UserSpec::new()
            .with_uid(1500)
            .with_group("1500")
            .with_groups(["adm", "deploy"])
            .with_comment("Deploy User")
            .with_home("/home/deploy")
            .with_shell("/bin/sh")
            .with_password("ignored after creation");

        assert_eq!(users.ensure("deploy", &spec).unwrap(), ApplyResult::NoChange);
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn test_modify_only_changed_attributes() {
        let fake = FakeRunner::new();
        let cancel = CancelToken::new();
        let db = MemoryDb::new()
            .with_group("deploy", 1500, &[])
            .with_group("staff", 50, &[])
            .with_user(user("deploy", 1500, 1500));
        let users = Users::new(ApplyContext::new(&fake, &cancel), &db);

        let spec = UserSpec::new()
            .with_uid(1500)
            .with_group("staff")
            .with_shell("/bin/bash");

        assert_eq!(users.ensure("deploy", &spec).unwrap(), ApplyResult::Modified);
        assert_eq!(
            fake.lines(),
            vec!["usermod --gid staff --shell /bin/bash deploy"]
        );
    }

    #[test]
    fn test_supplementary_groups_exact_and_append() {
        let db = MemoryDb::new()
            .with_group("deploy", 1500, &[])
            .with_group("adm", 4, &["deploy"])
            .with_group("docker", 998, &["deploy"])
            .with_user(user("deploy", 1500, 1500));
        let obs = observed(&db, "deploy", &UserSpec::new());
        assert_eq!(obs.primary_group.as_deref(), Some("deploy"));

        // exact: docker must go
        let exact = modify_args(&obs, &UserSpec::new().with_groups(["adm"]));
        assert_eq!(exact, vec!["--groups", "adm"]);

        // append: already a member of adm, nothing to do
        let append = modify_args(
            &obs,
            &UserSpec::new().with_groups(["adm"]).with_append_groups(true),
        );
        assert!(append.is_empty());

        let append_new = modify_args(
            &obs,
            &UserSpec::new().with_groups(["wheel"]).with_append_groups(true),
        );
        assert_eq!(append_new, vec!["--append", "--groups", "wheel"]);
    }

    #[test]
    fn test_unresolvable_primary_group_is_rewritten() {
        let db = MemoryDb::new().with_user(user("deploy", 1500, 4242));
        let spec = UserSpec::new().with_group("deploy");
        let obs = observed(&db, "deploy", &spec);
        assert_eq!(obs.primary_group, None);
        assert_eq!(obs.wanted_gid, None);

        let args = modify_args(&obs, &spec);
        assert_eq!(args, vec!["--gid", "deploy"]);
    }

    #[test]
    fn test_home_change_uses_usermod_flag() {
        let db = MemoryDb::new().with_user(user("deploy", 1500, 1500));
        let obs = observed(&db, "deploy", &UserSpec::new());
        let args = modify_args(&obs, &UserSpec::new().with_home("/srv/deploy"));
        assert_eq!(args, vec!["--home", "/srv/deploy"]);
    }

    #[test]
    fn test_listed_in_own_primary_group_settles() {
        let fake = FakeRunner::new();
        let cancel = CancelToken::new();
        let db = MemoryDb::new()
            .with_group("deploy", 1500, &["deploy"])
            .with_group("adm", 4, &["deploy"])
            .with_user(user("deploy", 1500, 1500));
        let users = Users::new(ApplyContext::new(&fake, &cancel), &db);
        let spec = UserSpec::new().with_groups(["adm", "deploy"]);

        assert_eq!(users.ensure("deploy", &spec).unwrap(), ApplyResult::NoChange);
        assert_eq!(users.ensure("deploy", &spec).unwrap(), ApplyResult::NoChange);
        assert!(fake.calls().is_empty());

        // dropping adm still leaves the primary group out of the comparison
        let spec = UserSpec::new().with_groups(["deploy"]);
        assert_eq!(users.ensure("deploy", &spec).unwrap(), ApplyResult::Modified);
        assert_eq!(fake.lines(), vec!["usermod --groups deploy deploy"]);
    }

    #[test]
    fn test_primary_group_compared_by_gid() {
        let fake = FakeRunner::new();
        let cancel = CancelToken::new();
        let db = MemoryDb::new()
            .with_group("wheel", 10, &[])
            .with_group("admin", 10, &[])
            .with_group("staff", 50, &[])
            .with_user(user("ops", 2000, 10));
        let users = Users::new(ApplyContext::new(&fake, &cancel), &db);

        let spec = UserSpec::new().with_group("admin");
        let obs = users.inspect("ops", &spec).unwrap().unwrap();
        assert_eq!(obs.primary_group.as_deref(), Some("wheel"));
        assert_eq!(obs.wanted_gid, Some(10));

        assert_eq!(users.ensure("ops", &spec).unwrap(), ApplyResult::NoChange);
        assert!(fake.calls().is_empty());

        let spec = UserSpec::new().with_group("staff");
        assert_eq!(users.ensure("ops", &spec).unwrap(), ApplyResult::Modified);
        assert_eq!(fake.lines(), vec!["usermod --gid staff ops"]);
    }

    #[test]
    fn test_io_failure_propagates() {
        let fake = FakeRunner::new();
        let cancel = CancelToken::new();
        let db = MemoryDb::unreadable();
        let users = Users::new(ApplyContext::new(&fake, &cancel), &db);

        assert!(users.exists("deploy").is_err());
        assert!(fake.calls().is_empty());
    }
}

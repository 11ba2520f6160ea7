//! Group reconciler (`groupadd` / `groupmod`)

use sysdb::{AccountDatabase, Group};
use transport::CommandSpec;

use crate::context::ApplyContext;
use crate::error::Result;
use crate::reconcile::Reconciler;
use crate::types::Action;

/// Desired state of a group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupSpec {
    /// Fixed gid; left to the system when unset
    pub gid: Option<u32>,
    /// Allocate from the system range when no gid is given
    pub system: bool,
}

impl GroupSpec {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_gid(mut self, gid: u32) -> Self {
        self.gid = Some(gid);
        self
    }

    #[must_use]
    pub fn with_system(mut self, system: bool) -> Self {
        self.system = system;
        self
    }
}

/// Reconciles groups in the local group database.
pub struct Groups<'a> {
    ctx: ApplyContext<'a>,
    db: &'a dyn AccountDatabase,
}

impl<'a> Groups<'a> {
    pub fn new(ctx: ApplyContext<'a>, db: &'a dyn AccountDatabase) -> Self {
        Self { ctx, db }
    }
}

impl Reconciler for Groups<'_> {
    type Spec = GroupSpec;
    type Observed = Group;

    fn kind(&self) -> &'static str {
        "group"
    }

    fn context(&self) -> ApplyContext<'_> {
        self.ctx
    }

    fn inspect(&self, name: &str, _spec: &GroupSpec) -> Result<Option<Group>> {
        match self.db.group(name) {
            Ok(group) => Ok(Some(group)),
            Err(e) if e.is_unknown() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn plan(&self, name: &str, observed: Option<&Group>, spec: &GroupSpec) -> Action {
        let Some(group) = observed else {
            let mut cmd = CommandSpec::new("groupadd");
            if let Some(gid) = spec.gid {
                cmd = cmd.args(["-g".to_string(), gid.to_string()]);
            } else if spec.system {
                cmd = cmd.arg("-r");
            }
            return Action::Add(cmd.arg(name));
        };

        match spec.gid {
            Some(gid) if gid != group.gid => {
                log::debug!("group {name}: gid {} -> {gid}", group.gid);
                Action::Modify(
                    CommandSpec::new("groupmod").args(["-g".to_string(), gid.to_string(), name.to_string()]),
                )
            }
            _ => Action::None,
        }
    }
}

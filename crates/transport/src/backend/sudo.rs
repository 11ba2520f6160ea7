//! Privilege escalation for system utilities.
//!
//! Commands are run through `sudo -n`, which fails instead of prompting
//! when no cached credential or NOPASSWD rule is available. The sudo
//! prefix is applied before the inner transport wraps the command, so on
//! a remote host it is the remote sudo that runs.

use std::path::Path;

use super::Transport;
use crate::command::CommandSpec;

/// Transport decorator that prefixes `sudo -n`.
#[derive(Debug)]
pub struct Sudo {
    inner: Box<dyn Transport>,
}

impl Sudo {
    /// Wrap `inner` so every command runs through sudo.
    pub fn new(inner: impl Transport + 'static) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    fn elevate(spec: &CommandSpec) -> CommandSpec {
        CommandSpec {
            program: "sudo".to_string(),
            args: ["-n".to_string(), spec.program.clone()]
                .into_iter()
                .chain(spec.args.iter().cloned())
                .collect(),
            input: spec.input.clone(),
            cwd: spec.cwd.clone(),
        }
    }
}

impl Transport for Sudo {
    fn describe(&self) -> String {
        format!("sudo via {}", self.inner.describe())
    }

    fn wrap(&self, spec: &CommandSpec) -> CommandSpec {
        self.inner.wrap(&Self::elevate(spec))
    }

    /// File pushes keep the inner transport's identity: scp cannot be
    /// elevated on the far side.
    fn push(&self, local: &Path, remote: &str) -> CommandSpec {
        self.inner.push(local, remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Local, Ssh};
    use crate::host::Host;

    #[test]
    fn test_local_sudo() {
        let sudo = Sudo::new(Local);
        let wrapped = sudo.wrap(&CommandSpec::new("groupadd").args(["-r", "app"]));
        assert_eq!(wrapped.argv(), vec!["sudo", "-n", "groupadd", "-r", "app"]);
    }

    #[test]
    fn test_remote_sudo_runs_on_the_remote_side() {
        let host = Host::new("web1", None).unwrap();
        let sudo = Sudo::new(Ssh::new(host));
        let wrapped = sudo.wrap(&CommandSpec::new("useradd").arg("deploy"));
        assert_eq!(wrapped.program, "ssh");
        assert_eq!(wrapped.args.last().unwrap(), "sudo -n useradd deploy");
        assert_eq!(sudo.describe(), "sudo via ssh web1");
    }

    #[test]
    fn test_push_is_not_elevated() {
        let sudo = Sudo::new(Local);
        let spec = sudo.push(Path::new("/a"), "/b");
        assert_eq!(spec.program, "cp");
    }
}

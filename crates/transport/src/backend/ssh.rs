//! Run commands on a remote host through the `ssh` client.
//!
//! Every invocation opens its own connection: compression is on and
//! connection multiplexing is off (`ControlMaster=no`), so a command never
//! shares a channel with another one.

use std::path::Path;

use super::Transport;
use crate::command::{CommandSpec, shell_quote};
use crate::host::Host;

/// Options passed to every ssh invocation, before the destination
const SSH_OPTIONS: [&str; 3] = ["-C", "-o", "ControlMaster=no"];

/// Transport that wraps commands in `ssh <destination> <command>`.
#[derive(Debug, Clone)]
pub struct Ssh {
    host: Host,
}

impl Ssh {
    /// Create a transport for `host`.
    pub fn new(host: Host) -> Self {
        Self { host }
    }

    /// The target host
    pub fn host(&self) -> &Host {
        &self.host
    }

    /// The command line the remote shell will run.
    ///
    /// The remote side always goes through a shell, so every word is quoted
    /// to keep the argument boundaries the caller asked for.
    fn remote_command(spec: &CommandSpec) -> String {
        let mut line = String::new();
        if let Some(dir) = &spec.cwd {
            line.push_str("cd ");
            line.push_str(&shell_quote(&dir.to_string_lossy()));
            line.push_str(" && ");
        }
        let words: Vec<_> = spec.argv().into_iter().map(shell_quote).collect();
        line.push_str(&words.join(" "));
        line
    }
}

impl Transport for Ssh {
    fn describe(&self) -> String {
        format!("ssh {}", self.host.destination())
    }

    fn wrap(&self, spec: &CommandSpec) -> CommandSpec {
        CommandSpec {
            program: "ssh".to_string(),
            args: SSH_OPTIONS
                .iter()
                .map(ToString::to_string)
                .chain([self.host.destination(), Self::remote_command(spec)])
                .collect(),
            input: spec.input.clone(),
            cwd: None,
        }
    }

    fn push(&self, local: &Path, remote: &str) -> CommandSpec {
        CommandSpec::new("scp")
            .arg(local.to_string_lossy())
            .arg(format!("{}:{remote}", self.host.destination()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Input;

    fn ssh(user: Option<&str>) -> Ssh {
        Ssh::new(Host::new("web1", user.map(ToString::to_string)).unwrap())
    }

    #[test]
    fn test_wrap_with_user() {
        let wrapped = ssh(Some("deploy")).wrap(&CommandSpec::new("uname").arg("-sm"));
        assert_eq!(
            wrapped.argv(),
            vec!["ssh", "-C", "-o", "ControlMaster=no", "deploy@web1", "uname -sm"]
        );
    }

    #[test]
    fn test_wrap_without_user() {
        let wrapped = ssh(None).wrap(&CommandSpec::new("true"));
        assert_eq!(wrapped.args[3], "web1");
    }

    #[test]
    fn test_wrap_quotes_arguments() {
        let spec = CommandSpec::new("useradd").args(["--comment", "Deploy User", "deploy"]);
        let wrapped = ssh(None).wrap(&spec);
        assert_eq!(wrapped.args[4], "useradd --comment 'Deploy User' deploy");
    }

    #[test]
    fn test_wrap_moves_cwd_into_remote_command() {
        let spec = CommandSpec::new("git").arg("status").cwd("/srv/my app");
        let wrapped = ssh(None).wrap(&spec);
        assert_eq!(wrapped.args[4], "cd '/srv/my app' && git status");
        assert_eq!(wrapped.cwd, None);
    }

    #[test]
    fn test_wrap_forwards_stdin() {
        let spec = CommandSpec::new("mysql").stdin_bytes("SELECT 1;");
        let wrapped = ssh(None).wrap(&spec);
        assert_eq!(wrapped.input, Some(Input::Bytes(b"SELECT 1;".to_vec())));
    }

    #[test]
    fn test_push_uses_same_addressing() {
        let spec = ssh(Some("deploy")).push(Path::new("target/app"), "/tmp/app");
        assert_eq!(spec.argv(), vec!["scp", "target/app", "deploy@web1:/tmp/app"]);
    }
}

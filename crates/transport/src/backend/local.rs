//! Run commands directly on this machine.

use std::path::Path;

use super::Transport;
use crate::command::CommandSpec;

/// Transport that runs programs as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct Local;

impl Transport for Local {
    fn describe(&self) -> String {
        "local".to_string()
    }

    fn wrap(&self, spec: &CommandSpec) -> CommandSpec {
        spec.clone()
    }

    fn push(&self, local: &Path, remote: &str) -> CommandSpec {
        CommandSpec::new("cp")
            .arg(local.to_string_lossy())
            .arg(remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_is_identity() {
        let spec = CommandSpec::new("id").arg("-u").stdin_bytes("x").cwd("/tmp");
        assert_eq!(Local.wrap(&spec), spec);
    }

    #[test]
    fn test_push_copies() {
        let spec = Local.push(Path::new("/build/app"), "/tmp/app");
        assert_eq!(spec.argv(), vec!["cp", "/build/app", "/tmp/app"]);
    }
}

// Host inspection and delivery
pub mod deploy;
pub mod detect;

// Convergence on this machine
pub mod dir;
pub mod git;
pub mod group;
pub mod mysql;
pub mod user;

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use transport::{Host, Local, Runner, Ssh, Sudo};

/// Runner for this machine, going through `sudo -n` when asked
pub fn local_runner(sudo: bool) -> Runner {
    if sudo {
        Runner::new(Sudo::new(Local))
    } else {
        Runner::local()
    }
}

/// Runner for the host named in `host_file`, or this machine without one
pub fn target_runner(host_file: Option<&Path>, sudo: bool) -> Result<Runner> {
    let Some(path) = host_file else {
        return Ok(local_runner(sudo));
    };
    let host = load_host(path)?;
    Ok(if sudo {
        Runner::new(Sudo::new(Ssh::new(host)))
    } else {
        Runner::new(Ssh::new(host))
    })
}

pub fn load_host(path: &Path) -> Result<Host> {
    Host::from_file(path).with_context(|| format!("Failed to load host descriptor {}", path.display()))
}

/// Expand `~` in a user-supplied path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

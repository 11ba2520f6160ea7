//! Directory reconciler
//!
//! Works on the local filesystem directly; no subprocess is involved.

use std::fs::{self, DirBuilder, Permissions};
use std::io;
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::{Path, PathBuf};

use crate::context::ApplyContext;
use crate::error::{Error, Result};
use crate::types::ApplyResult;

/// Mode for created directories when none is given (before umask)
pub const DEFAULT_MODE: u32 = 0o755;

/// Desired state of a directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectorySpec {
    /// Permission bits. When set, an existing directory is chmod'ed to
    /// match and created directories get exactly this mode.
    pub mode: Option<u32>,
}

impl DirectorySpec {
    pub fn with_mode(mode: u32) -> Self {
        Self { mode: Some(mode) }
    }
}

/// Creates directories and keeps their permissions in line.
pub struct Directories<'a> {
    ctx: ApplyContext<'a>,
}

impl<'a> Directories<'a> {
    pub fn new(ctx: ApplyContext<'a>) -> Self {
        Self { ctx }
    }

    /// Ensure `path` exists as a directory.
    ///
    /// Every missing component is created. Relative paths are rejected.
    pub fn ensure(&self, path: &Path, spec: &DirectorySpec) -> Result<ApplyResult> {
        if !path.is_absolute() {
            return Err(Error::InvalidPath(path.to_path_buf()));
        }

        let missing = missing_components(path)?;

        if missing.is_empty() {
            return self.ensure_mode(path, spec);
        }

        if self.ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: format!("dry run, would create {}", path.display()),
            });
        }

        let mode = spec.mode.unwrap_or(DEFAULT_MODE);
        let mut builder = DirBuilder::new();
        builder.mode(mode);
        for part in &missing {
            log::info!("MKDIR: {} (mode {mode:#o})", part.display());
            builder.create(part)?;
            if spec.mode.is_some() {
                // umask may have stripped bits
                fs::set_permissions(part, Permissions::from_mode(mode))?;
            }
        }
        Ok(ApplyResult::Created)
    }

    fn ensure_mode(&self, path: &Path, spec: &DirectorySpec) -> Result<ApplyResult> {
        let Some(mode) = spec.mode else {
            return Ok(ApplyResult::NoChange);
        };
        let current = fs::metadata(path)?.permissions().mode() & 0o7777;
        if current == mode {
            return Ok(ApplyResult::NoChange);
        }
        if self.ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: format!("dry run, would chmod {mode:o} {}", path.display()),
            });
        }
        log::info!("CHMOD: {} {current:#o} -> {mode:#o}", path.display());
        fs::set_permissions(path, Permissions::from_mode(mode))?;
        Ok(ApplyResult::Modified)
    }
}

/// Components of `path` that do not exist yet, outermost first.
fn missing_components(path: &Path) -> Result<Vec<PathBuf>> {
    let mut missing = Vec::new();
    for ancestor in path.ancestors() {
        match fs::metadata(ancestor) {
            Ok(meta) if meta.is_dir() => break,
            Ok(_) => return Err(Error::NotADirectory(ancestor.to_path_buf())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => missing.push(ancestor.to_path_buf()),
            // a file further up; keep climbing until it is reached
            Err(e) if e.kind() == io::ErrorKind::NotADirectory => {}
            Err(e) => return Err(e.into()),
        }
    }
    missing.reverse();
    Ok(missing)
}

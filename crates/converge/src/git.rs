//! Git checkout reconciler
//!
//! Clones a repository when the destination has none, then moves the
//! working tree to the requested version. The destination is inspected on
//! the local filesystem, so the runner must target this machine.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use transport::CommandSpec;

use crate::context::ApplyContext;
use crate::error::{Error, Result};
use crate::types::ApplyResult;

/// Version meaning "whatever the remote's default branch points at"
pub const HEAD: &str = "HEAD";

/// Remote name used when none is given
pub const DEFAULT_REMOTE: &str = "origin";

/// Markers `git branch` prints for a checkout that is not on a branch
const DETACHED_MARKERS: [&str; 3] = ["no branch", "detached from", "detached at"];

/// Desired state of a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCheckoutSpec {
    /// Repository to clone from. May be empty when `dest` is already a
    /// checkout; it is then only switched.
    pub repo: String,
    pub dest: PathBuf,
    pub remote: String,
    /// Branch, tag or commit. A bare commit needs `refspec` to be
    /// reachable in a shallow clone.
    pub version: String,
    /// Extra ref to fetch after cloning (e.g., `refs/meta/config`)
    pub refspec: Option<String>,
    /// Shallow clone depth; 0 fetches full history
    pub depth: u32,
    /// Local repository to borrow objects from
    pub reference: Option<String>,
    pub bare: bool,
}

impl GitCheckoutSpec {
    pub fn new(repo: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            repo: repo.into(),
            dest: dest.into(),
            remote: DEFAULT_REMOTE.to_string(),
            version: HEAD.to_string(),
            refspec: None,
            depth: 0,
            reference: None,
            bare: false,
        }
    }

    #[must_use]
    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn with_refspec(mut self, refspec: impl Into<String>) -> Self {
        self.refspec = Some(refspec.into());
        self
    }

    #[must_use]
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    #[must_use]
    pub fn with_bare(mut self, bare: bool) -> Self {
        self.bare = bare;
        self
    }

    /// Fill in defaults, make `dest` absolute and turn local repository
    /// paths into `file://` URLs.
    pub fn normalized(&self) -> Result<Self> {
        let mut spec = self.clone();
        spec.dest = std::path::absolute(&self.dest)?;
        if spec.repo.starts_with('/') {
            spec.repo = format!("file://{}", spec.repo);
        }
        if spec.remote.is_empty() {
            spec.remote = DEFAULT_REMOTE.to_string();
        }
        if spec.version.is_empty() {
            spec.version = HEAD.to_string();
        }
        Ok(spec)
    }

    /// The repository directory: `dest` itself when bare, `dest/.git` otherwise
    pub fn git_dir(&self) -> PathBuf {
        if self.bare {
            self.dest.clone()
        } else {
            self.dest.join(".git")
        }
    }
}

/// What a version names on the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RemoteRef {
    Branch,
    Tag,
    Unknown,
}

/// Reconciles git checkouts.
pub struct GitCheckout<'a> {
    ctx: ApplyContext<'a>,
}

impl<'a> GitCheckout<'a> {
    pub fn new(ctx: ApplyContext<'a>) -> Self {
        Self { ctx }
    }

    /// Clone if needed, then switch a non-bare checkout to `spec.version`.
    pub fn ensure(&self, spec: &GitCheckoutSpec) -> Result<ApplyResult> {
        let spec = spec.normalized()?;
        let git_dir = spec.git_dir();

        if !spec.bare && git_dir.is_file() {
            return Err(Error::Unsupported(format!(
                "{} is a submodule checkout",
                spec.dest.display()
            )));
        }

        let mut result = ApplyResult::NoChange;
        if !git_dir.join("config").exists() {
            if spec.repo.is_empty() {
                return Err(Error::Repository {
                    path: spec.dest,
                    message: "no checkout and no repository to clone".into(),
                });
            }
            if self.ctx.dry_run {
                return Ok(ApplyResult::Skipped {
                    reason: format!("dry run, would clone {}", spec.repo),
                });
            }
            self.clone_repo(&spec)?;
            result = ApplyResult::Created;
        }

        if spec.bare {
            return Ok(result);
        }

        match self.switch_version(&spec)? {
            ApplyResult::NoChange => Ok(result),
            _ if result == ApplyResult::Created => Ok(result),
            switched => Ok(switched),
        }
    }

    fn git<I, S>(&self, args: I, cwd: Option<&Path>) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cmd = CommandSpec::new("git").args(args);
        if let Some(dir) = cwd {
            cmd = cmd.cwd(dir);
        }
        Ok(self.ctx.run(&cmd)?.stdout_str())
    }

    fn clone_repo(&self, spec: &GitCheckoutSpec) -> Result<()> {
        // created by the runner, so --sudo covers destinations the caller
        // cannot write
        if !spec.dest.is_dir() {
            if spec.dest.exists() {
                return Err(Error::NotADirectory(spec.dest.clone()));
            }
            let mkdir = CommandSpec::new("mkdir")
                .arg("-p")
                .arg(spec.dest.display().to_string());
            self.ctx.run(&mkdir)?;
        }

        let mut args = vec!["clone".to_string()];
        if spec.bare {
            args.push("--bare".into());
        } else {
            args.extend(["--origin".into(), spec.remote.clone()]);
        }

        args.extend(self.depth_arguments(spec)?);

        if let Some(reference) = &spec.reference {
            args.extend(["--reference".into(), reference.clone()]);
        }
        args.extend([spec.repo.clone(), spec.dest.display().to_string()]);
        self.git(args, None)?;

        if spec.bare && spec.remote != DEFAULT_REMOTE {
            self.git(
                ["remote", "add", spec.remote.as_str(), spec.repo.as_str()],
                Some(&spec.dest),
            )?;
        }

        if let Some(refspec) = &spec.refspec {
            let mut fetch = vec!["fetch".to_string()];
            if spec.depth > 0 {
                fetch.extend(["--depth".into(), spec.depth.to_string()]);
            }
            fetch.extend([spec.remote.clone(), refspec.clone()]);
            self.git(fetch, Some(&spec.dest))?;
        }
        Ok(())
    }

    /// `--depth` (and `--branch`) for the clone, or nothing when the
    /// version cannot be fetched shallowly.
    fn depth_arguments(&self, spec: &GitCheckoutSpec) -> Result<Vec<String>> {
        if spec.depth == 0 {
            return Ok(Vec::new());
        }
        let depth = vec!["--depth".to_string(), spec.depth.to_string()];

        if spec.version == HEAD || spec.refspec.is_some() {
            return Ok(depth);
        }

        match self.remote_ref(spec)? {
            RemoteRef::Branch | RemoteRef::Tag => {
                let mut args = depth;
                args.extend(["--branch".into(), spec.version.clone()]);
                Ok(args)
            }
            RemoteRef::Unknown => {
                log::warn!(
                    "Ignoring --depth {}: {} is neither a branch nor a tag on {}",
                    spec.depth,
                    spec.version,
                    spec.repo
                );
                Ok(Vec::new())
            }
        }
    }

    fn remote_ref(&self, spec: &GitCheckoutSpec) -> Result<RemoteRef> {
        let branch = format!("refs/heads/{}", spec.version);
        let out = self.git(["ls-remote", spec.repo.as_str(), "--heads", branch.as_str()], None)?;
        if lists_ref(&out, &branch) {
            return Ok(RemoteRef::Branch);
        }

        let tag = format!("refs/tags/{}", spec.version);
        let out = self.git(["ls-remote", spec.repo.as_str(), "--tags", tag.as_str()], None)?;
        if lists_ref(&out, &tag) {
            return Ok(RemoteRef::Tag);
        }
        Ok(RemoteRef::Unknown)
    }

    fn switch_version(&self, spec: &GitCheckoutSpec) -> Result<ApplyResult> {
        let dest = spec.dest.as_path();
        let listing = self.git(["branch", "--no-color", "-a"], Some(dest))?;
        let branches: Vec<&str> = listing.lines().filter(|l| !l.trim().is_empty()).collect();
        let detached = is_detached(&branches);

        let (target, branch) = if spec.version == HEAD {
            let branch = self.head_branch(spec, detached)?;
            (format!("{}/{branch}", spec.remote), Some(branch))
        } else if has_remote_branch(&branches, &spec.remote, &spec.version) {
            (
                format!("{}/{}", spec.remote, spec.version),
                Some(spec.version.clone()),
            )
        } else {
            (spec.version.clone(), None)
        };

        let head = self.rev_parse(dest, HEAD)?;
        let wanted = self.rev_parse(dest, &format!("{target}^{{commit}}"))?;
        let on_branch = branch
            .as_deref()
            .is_none_or(|b| current_branch(&branches) == Some(b));

        if head == wanted && on_branch {
            log::debug!("git {}: already at {target} ({head})", dest.display());
            return Ok(ApplyResult::NoChange);
        }

        if self.ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: format!("dry run, would switch {} to {target}", dest.display()),
            });
        }

        match branch {
            Some(b) if has_local_branch(&branches, &b) => {
                self.git(["checkout", "--force", b.as_str()], Some(dest))?;
                self.git(["reset", "--hard", target.as_str()], Some(dest))?;
            }
            Some(b) => {
                self.git(["checkout", "--track", "-b", b.as_str(), target.as_str()], Some(dest))?;
            }
            None => {
                self.git(["checkout", "--force", target.as_str()], Some(dest))?;
            }
        }
        log::info!("git {}: switched to {target}", dest.display());
        Ok(ApplyResult::Modified)
    }

    fn rev_parse(&self, dest: &Path, rev: &str) -> Result<String> {
        Ok(self.git(["rev-parse", rev], Some(dest))?.trim().to_string())
    }

    /// Branch the checkout follows: the remote's default branch when
    /// detached, the checked-out branch otherwise.
    fn head_branch(&self, spec: &GitCheckoutSpec, detached: bool) -> Result<String> {
        let git_dir = spec.git_dir();
        let head_file = if detached {
            git_dir.join("refs/remotes").join(&spec.remote).join(HEAD)
        } else {
            git_dir.join(HEAD)
        };

        let content = match fs::read_to_string(&head_file) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::Repository {
                    path: spec.dest.clone(),
                    message: format!("cannot determine head branch: {} is missing", head_file.display()),
                });
            }
            Err(e) => return Err(e.into()),
        };

        parse_head_ref(&content, &spec.remote).ok_or_else(|| Error::Repository {
            path: spec.dest.clone(),
            message: format!("{} is not a symbolic ref", head_file.display()),
        })
    }
}

/// Reduce `ref: refs/heads/<b>` or `ref: refs/remotes/<remote>/<b>` to `<b>`.
fn parse_head_ref(content: &str, remote: &str) -> Option<String> {
    let reference = content.lines().next()?.trim().strip_prefix("ref:")?.trim();
    let remote_prefix = format!("refs/remotes/{remote}/");
    reference
        .strip_prefix(remote_prefix.as_str())
        .or_else(|| reference.strip_prefix("refs/heads/"))
        .filter(|b| !b.is_empty())
        .map(str::to_string)
}

fn lists_ref(ls_remote: &str, reference: &str) -> bool {
    ls_remote
        .lines()
        .any(|line| line.split_whitespace().nth(1) == Some(reference))
}

fn is_detached(branches: &[&str]) -> bool {
    branches
        .iter()
        .any(|b| b.starts_with("* ") && DETACHED_MARKERS.iter().any(|m| b.contains(m)))
}

fn current_branch<'b>(branches: &[&'b str]) -> Option<&'b str> {
    if is_detached(branches) {
        return None;
    }
    branches
        .iter()
        .find_map(|b| b.strip_prefix("* "))
        .map(str::trim)
}

/// Branch name from a `git branch` line, without the `* ` (current) or
/// `+ ` (checked out in another worktree) marker.
fn branch_name(line: &str) -> &str {
    line.strip_prefix("* ")
        .or_else(|| line.strip_prefix("+ "))
        .unwrap_or(line)
        .trim()
}

fn has_local_branch(branches: &[&str], name: &str) -> bool {
    branches.iter().any(|b| branch_name(b) == name)
}

fn has_remote_branch(branches: &[&str], remote: &str, name: &str) -> bool {
    let wanted = format!("remotes/{remote}/{name}");
    branches.iter().any(|b| b.trim() == wanted)
}

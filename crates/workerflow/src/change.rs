//! Change detection
//!
//! Decides whether a worker's published image is stale by diffing the
//! commit it was built from against HEAD. Any doubt resolves to "stale":
//! a missing prior build and a failed diff both force a rebuild.

use crate::error::VcsError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;
use workerflow_core::{CommitRef, Worker};

type Result<T> = std::result::Result<T, VcsError>;

/// One entry of a diff. Renames and copies carry both paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedPath {
    pub path: PathBuf,
    pub previous: Option<PathBuf>,
}

impl ChangedPath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            previous: None,
        }
    }

    pub fn renamed(previous: impl Into<PathBuf>, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            previous: Some(previous.into()),
        }
    }

    /// Every path this change touches.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.path.as_path()).chain(self.previous.as_deref())
    }
}

/// Source-control queries the detector needs.
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Commit HEAD currently points to.
    async fn head_commit(&self) -> Result<CommitRef>;

    /// Paths changed between two commits.
    async fn changed_paths(&self, from: &CommitRef, to: &CommitRef) -> Result<Vec<ChangedPath>>;
}

/// [`SourceControl`] backed by the `git` command line.
pub struct GitCli {
    repo: PathBuf,
}

impl GitCli {
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self { repo: repo.into() }
    }

    async fn run(&self, args: &[&str]) -> Result<Vec<u8>> {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.repo);
        cmd.args(args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        debug!("Running: git -C {} {}", self.repo.display(), args.join(" "));

        let output = cmd.output().await?;
        if !output.status.success() {
            return Err(VcsError::CommandFailed {
                command: args.first().copied().unwrap_or_default().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl SourceControl for GitCli {
    async fn head_commit(&self) -> Result<CommitRef> {
        let stdout = self.run(&["rev-parse", "--verify", "HEAD"]).await?;
        let commit = CommitRef::new(String::from_utf8_lossy(&stdout));
        if commit.as_str().is_empty() {
            return Err(VcsError::UnexpectedOutput("empty HEAD commit".to_string()));
        }
        Ok(commit)
    }

    async fn changed_paths(&self, from: &CommitRef, to: &CommitRef) -> Result<Vec<ChangedPath>> {
        check_ref(from)?;
        check_ref(to)?;

        let stdout = self
            .run(&[
                "diff",
                "--name-status",
                "-z",
                "-M",
                from.as_str(),
                to.as_str(),
            ])
            .await?;
        parse_name_status(&String::from_utf8_lossy(&stdout))
    }
}

/// Reject refs git would read as options.
fn check_ref(commit: &CommitRef) -> Result<()> {
    let id = commit.as_str();
    if id.is_empty() || id.starts_with('-') || id.chars().any(char::is_whitespace) {
        return Err(VcsError::InvalidRef(id.to_string()));
    }
    Ok(())
}

/// Parse `git diff --name-status -z` output.
///
/// Entries are NUL separated: `M\0path\0` or, for renames and copies,
/// `R100\0old\0new\0`.
pub fn parse_name_status(output: &str) -> Result<Vec<ChangedPath>> {
    let mut fields = output.split('\0').filter(|f| !f.is_empty());
    let mut changes = Vec::new();

    while let Some(status) = fields.next() {
        let mut next_path = || {
            fields
                .next()
                .ok_or_else(|| VcsError::UnexpectedOutput(format!("missing path after {}", status)))
        };

        let change = if status.starts_with('R') || status.starts_with('C') {
            let previous = next_path()?;
            let path = next_path()?;
            ChangedPath::renamed(previous, path)
        } else {
            ChangedPath::new(next_path()?)
        };
        changes.push(change);
    }

    Ok(changes)
}

/// Result of a staleness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    /// The registry knows no prior build.
    NoPriorBuild,
    /// A path under the worker changed since the prior build.
    Changed(PathBuf),
    /// Nothing under the worker changed since the prior build.
    Unchanged,
    /// The diff could not be computed.
    DiffFailed(String),
}

impl Staleness {
    pub fn is_stale(&self) -> bool {
        !matches!(self, Staleness::Unchanged)
    }
}

/// Decides whether a worker changed since its last published build.
pub struct ChangeDetector<'a> {
    source: &'a dyn SourceControl,
}

impl<'a> ChangeDetector<'a> {
    pub fn new(source: &'a dyn SourceControl) -> Self {
        Self { source }
    }

    pub async fn head_commit(&self) -> Result<CommitRef> {
        self.source.head_commit().await
    }

    /// Compare `last` against `head` for paths under `worker`.
    pub async fn staleness(
        &self,
        worker: &Worker,
        last: Option<&CommitRef>,
        head: &CommitRef,
    ) -> Staleness {
        let Some(last) = last else {
            return Staleness::NoPriorBuild;
        };

        let changes = match self.source.changed_paths(last, head).await {
            Ok(changes) => changes,
            Err(e) => return Staleness::DiffFailed(e.to_string()),
        };

        changes
            .iter()
            .flat_map(ChangedPath::paths)
            .find(|path| worker.owns(path))
            .map(|path| Staleness::Changed(path.to_path_buf()))
            .unwrap_or(Staleness::Unchanged)
    }

    pub async fn is_stale(
        &self,
        worker: &Worker,
        last: Option<&CommitRef>,
        head: &CommitRef,
    ) -> bool {
        self.staleness(worker, last, head).await.is_stale()
    }
}

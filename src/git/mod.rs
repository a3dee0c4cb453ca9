//! Repository collaborators.
//!
//! The control core never builds git command lines itself. It talks to a
//! [`RepoSource`] for panel data, previews and remote operations, and to a
//! [`CommandRunner`] for user-authored shell commands. [`GitCli`] is the
//! production `RepoSource`, shelling out to the `git` binary.

mod cli;
mod parse;

pub use cli::GitCli;

use crate::panels::{PanelData, PanelRequest};
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::process::Output;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Command exited non-zero. Carries trimmed stderr (or stdout if stderr was empty).
    #[error("{0}")]
    Failed(String),

    /// The remote refused a non-forced push because histories diverged.
    #[error("Updates were rejected: the remote contains work you do not have locally")]
    PushRejected,

    #[error("unexpected git output: {0}")]
    Parse(String),

    #[error("invalid pull mode '{0}' (expected merge, rebase or ff-only)")]
    InvalidPullMode(String),
}

// ============================================================================
// Operation Types
// ============================================================================

/// How `pull` integrates upstream changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PullMode {
    #[default]
    Merge,
    Rebase,
    FastForwardOnly,
}

impl PullMode {
    pub fn parse(mode: &str) -> Result<Self, GitError> {
        match mode {
            "merge" => Ok(Self::Merge),
            "rebase" => Ok(Self::Rebase),
            "ff-only" => Ok(Self::FastForwardOnly),
            other => Err(GitError::InvalidPullMode(other.to_string())),
        }
    }

    fn flag(self) -> &'static str {
        match self {
            Self::Merge => "--no-rebase",
            Self::Rebase => "--rebase",
            Self::FastForwardOnly => "--ff-only",
        }
    }
}

/// Remote and branch to push to when the branch has no upstream yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushTarget {
    pub remote: String,
    pub branch: String,
}

impl PushTarget {
    /// Parse `"origin main"` (space separated, as typed into the upstream prompt).
    pub fn parse(input: &str) -> Option<Self> {
        let mut parts = input.split_whitespace();
        let remote = parts.next()?;
        let branch = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            remote: remote.to_string(),
            branch: branch.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PushOptions {
    pub force: bool,
    /// Push to this remote/branch and record it as upstream.
    pub target: Option<PushTarget>,
    /// Push the current branch to a same-named branch and set it as upstream.
    pub set_upstream_current: bool,
}

/// What the main view should preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewTarget {
    File { name: String, tracked: bool, staged_only: bool },
    Branch(String),
    RemoteBranch(String),
    Tag(String),
    Commit(String),
    CommitFile { sha: String, name: String },
    Stash(usize),
}

// ============================================================================
// Collaborator Traits
// ============================================================================

/// Data and operations the core needs from a repository.
#[async_trait]
pub trait RepoSource: Send + Sync {
    /// Fetch a fresh collection for one panel.
    async fn load(&self, request: &PanelRequest) -> Result<PanelData, GitError>;

    /// Render text for the main view.
    async fn preview(&self, target: &PreviewTarget) -> Result<String, GitError>;

    async fn fetch(&self) -> Result<(), GitError>;
    async fn pull(&self, mode: PullMode) -> Result<(), GitError>;

    /// Returns [`GitError::PushRejected`] when a non-forced push is refused.
    async fn push(&self, options: &PushOptions) -> Result<(), GitError>;

    /// Point the checked-out branch at `upstream` (`"origin/main"`).
    async fn set_upstream(&self, upstream: &str) -> Result<(), GitError>;

    async fn stage(&self, path: &str) -> Result<(), GitError>;
    async fn unstage(&self, path: &str) -> Result<(), GitError>;
    async fn stage_all(&self) -> Result<(), GitError>;
    async fn unstage_all(&self) -> Result<(), GitError>;
    async fn checkout(&self, branch: &str) -> Result<(), GitError>;
}

/// Runs processes in capture mode. Terminal hand-off is done by the event loop.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> io::Result<Output>;

    /// Run a shell command line and return its captured stdout.
    async fn run_shell(&self, command: &str) -> Result<String, GitError> {
        let (shell, flag) = shell();
        let args = vec![flag.to_string(), command.to_string()];
        let output = self
            .run(shell, &args)
            .await
            .map_err(|source| GitError::Spawn {
                program: shell.to_string(),
                source,
            })?;
        into_stdout(output)
    }
}

/// Production runner backed by `tokio::process`.
#[derive(Debug, Clone)]
pub struct ProcessCommandRunner {
    cwd: PathBuf,
}

impl ProcessCommandRunner {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }
}

#[async_trait]
impl CommandRunner for ProcessCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> io::Result<Output> {
        tokio::process::Command::new(program)
            .args(args)
            .current_dir(&self.cwd)
            .env("GIT_OPTIONAL_LOCKS", "0")
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
    }
}

/// Shell program and its "run this string" flag for the current platform.
pub fn shell() -> (&'static str, &'static str) {
    if cfg!(windows) {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    }
}

pub(crate) fn into_stdout(output: Output) -> Result<String, GitError> {
    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
    }
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let message = if stderr.is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    } else {
        stderr
    };
    Err(GitError::Failed(message))
}

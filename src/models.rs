//! Domain records shown in the side panels.
//!
//! These are plain data. Identity across refreshes comes from each record's
//! natural key (see `panels::PanelItem`), never from its list position.
use std::fmt;

/// A changed path in the working tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct File {
    pub name: String,
    /// Two-letter porcelain status, e.g. `"M "`, `"??"`, `"UU"`.
    pub short_status: String,
    pub has_staged_changes: bool,
    pub has_unstaged_changes: bool,
    pub tracked: bool,
    pub added: bool,
    pub deleted: bool,
    pub has_merge_conflicts: bool,
    pub has_inline_merge_conflicts: bool,
}

impl File {
    pub fn display_string(&self) -> String {
        format!("{} {}", self.short_status, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Commit {
    pub sha: String,
    pub name: String,
    pub author: String,
    pub unix_timestamp: i64,
    pub tags: Vec<String>,
}

impl Commit {
    pub fn short_sha(&self) -> &str {
        self.sha.get(..8).unwrap_or(&self.sha)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Branch {
    pub name: String,
    pub recency: String,
    /// Commits ahead of upstream, `"?"` when there is no upstream.
    pub pushables: String,
    /// Commits behind upstream, `"?"` when there is no upstream.
    pub pullables: String,
    pub upstream_name: Option<String>,
    pub head: bool,
}

impl Branch {
    pub fn has_upstream(&self) -> bool {
        self.pullables != "?"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteBranch {
    pub name: String,
    pub remote_name: String,
}

impl RemoteBranch {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.remote_name, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Remote {
    pub name: String,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tag {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StashEntry {
    pub index: usize,
    pub name: String,
}

impl StashEntry {
    pub fn ref_name(&self) -> String {
        format!("stash@{{{}}}", self.index)
    }
}

/// A path touched by a specific commit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommitFile {
    pub sha: String,
    pub name: String,
    /// Single-letter change status from `git show --name-status`.
    pub change_status: String,
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sha)
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for RemoteBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

impl fmt::Display for Remote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for StashEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ref_name())
    }
}

impl fmt::Display for CommitFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

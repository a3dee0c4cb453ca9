//! Panel state store with selection-stable refresh.
//!
//! Every side panel is an ordered list plus an optional selection. A refresh
//! replaces the list with freshly fetched items and then re-anchors the cursor
//! on the item that was selected before, found by natural key, so that a file
//! moving from row 1 to row 2 keeps the cursor on that file.
//!
//! The store itself is synchronous: the event loop calls [`PanelStore::begin_refresh`]
//! before spawning a fetch and [`PanelStore::finish_refresh`] when the fetch result
//! comes back. Between the two calls the panel is marked in flight and further
//! refresh requests for it are dropped.
use crate::context::{ContextKey, ViewName};
use crate::git::GitError;
use crate::models::{Branch, Commit, CommitFile, File, Remote, RemoteBranch, StashEntry, Tag};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

// ============================================================================
// Panel Items
// ============================================================================

/// A record with a stable identity inside one panel.
pub trait PanelItem: Clone + Send + Sync + 'static {
    fn natural_key(&self) -> &str;
}

impl PanelItem for File {
    fn natural_key(&self) -> &str {
        &self.name
    }
}

impl PanelItem for Commit {
    fn natural_key(&self) -> &str {
        &self.sha
    }
}

impl PanelItem for Branch {
    fn natural_key(&self) -> &str {
        &self.name
    }
}

impl PanelItem for RemoteBranch {
    fn natural_key(&self) -> &str {
        &self.name
    }
}

impl PanelItem for Remote {
    fn natural_key(&self) -> &str {
        &self.name
    }
}

impl PanelItem for Tag {
    fn natural_key(&self) -> &str {
        &self.name
    }
}

impl PanelItem for StashEntry {
    fn natural_key(&self) -> &str {
        &self.name
    }
}

impl PanelItem for CommitFile {
    fn natural_key(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Merge Rules
// ============================================================================

/// Combines the previous list with a fresh fetch. Receives the previously
/// selected item so rules can favor it.
pub type MergeRule<T> = fn(previous: &[T], selected: Option<&T>, fresh: Vec<T>) -> Vec<T>;

/// Take the fresh fetch as-is.
pub fn replace_all<T>(_previous: &[T], _selected: Option<&T>, fresh: Vec<T>) -> Vec<T> {
    fresh
}

/// Keep items that were already on screen in their old order and append items
/// that appeared since, in fetch order. Fields always come from the fresh fetch.
pub fn retain_positions<T: PanelItem>(
    previous: &[T],
    _selected: Option<&T>,
    fresh: Vec<T>,
) -> Vec<T> {
    if previous.is_empty() {
        return fresh;
    }

    let mut remaining: Vec<Option<T>> = fresh.into_iter().map(Some).collect();
    let mut result = Vec::with_capacity(remaining.len());

    for old in previous {
        let found = remaining.iter_mut().find(|slot| {
            slot.as_ref()
                .is_some_and(|item| item.natural_key() == old.natural_key())
        });
        if let Some(item) = found.and_then(Option::take) {
            result.push(item);
        }
    }

    result.extend(remaining.into_iter().flatten());
    result
}

// ============================================================================
// Panel State
// ============================================================================

/// What a refresh did to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// The selected natural key is the same as before the refresh.
    pub same_item_selected: bool,
    /// The selection index differs from before the refresh.
    pub index_changed: bool,
}

/// Ordered items plus selection.
///
/// Invariant: `selected` is `None` exactly when `items` is empty, and otherwise
/// indexes into `items`.
#[derive(Debug, Clone)]
pub struct PanelState<T> {
    items: Arc<Vec<T>>,
    selected: Option<usize>,
}

impl<T> Default for PanelState<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            selected: None,
        }
    }
}

impl<T: PanelItem> PanelState<T> {
    pub fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self {
            items: Arc::new(items),
            selected,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&T> {
        self.selected.and_then(|idx| self.items.get(idx))
    }

    /// Select `idx`, clamped to the list bounds.
    pub fn select(&mut self, idx: usize) {
        self.selected = match self.items.len() {
            0 => None,
            len => Some(idx.min(len - 1)),
        };
    }

    /// Move the cursor by `delta` rows, saturating at both ends.
    pub fn move_selection(&mut self, delta: isize) {
        if let Some(current) = self.selected {
            self.select(current.saturating_add_signed(delta));
        }
    }

    pub fn select_last(&mut self) {
        self.select(usize::MAX);
    }

    /// Replace the items with `fresh` merged by `merge`, then re-anchor the
    /// selection on the previously selected natural key.
    ///
    /// If that key is gone, the old index is kept and clamped into range; an
    /// empty list always ends with no selection.
    pub fn apply_refresh(&mut self, fresh: Vec<T>, merge: MergeRule<T>) -> RefreshOutcome {
        let previous_index = self.selected;
        let previous_key = self.selected().map(|item| item.natural_key().to_owned());

        let merged = merge(&self.items, self.selected(), fresh);
        self.items = Arc::new(merged);

        let anchored = previous_key.as_deref().and_then(|key| {
            self.items
                .iter()
                .position(|item| item.natural_key() == key)
        });

        self.selected = match (anchored, previous_index) {
            (Some(idx), _) => Some(idx),
            _ if self.items.is_empty() => None,
            (None, None) => Some(0),
            (None, Some(idx)) => Some(idx.min(self.items.len() - 1)),
        };

        RefreshOutcome {
            same_item_selected: anchored.is_some(),
            index_changed: self.selected != previous_index,
        }
    }
}

// ============================================================================
// Panel Kinds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    Files,
    Branches,
    Remotes,
    RemoteBranches,
    Tags,
    Commits,
    ReflogCommits,
    SubCommits,
    CommitFiles,
    Stash,
}

impl PanelKind {
    /// Panels refreshed after any repository mutation. Drill-down panels
    /// (remote branches, sub-commits, commit files) refresh on entry instead.
    pub const SIDE: [PanelKind; 7] = [
        PanelKind::Files,
        PanelKind::Branches,
        PanelKind::Remotes,
        PanelKind::Tags,
        PanelKind::Commits,
        PanelKind::ReflogCommits,
        PanelKind::Stash,
    ];

    pub fn for_context(ctx: ContextKey) -> Option<Self> {
        match ctx {
            ContextKey::Files => Some(Self::Files),
            ContextKey::LocalBranches => Some(Self::Branches),
            ContextKey::Remotes => Some(Self::Remotes),
            ContextKey::RemoteBranches => Some(Self::RemoteBranches),
            ContextKey::Tags => Some(Self::Tags),
            ContextKey::BranchCommits => Some(Self::Commits),
            ContextKey::ReflogCommits => Some(Self::ReflogCommits),
            ContextKey::SubCommits => Some(Self::SubCommits),
            ContextKey::CommitFiles => Some(Self::CommitFiles),
            ContextKey::Stash => Some(Self::Stash),
            _ => None,
        }
    }

    pub fn context(self) -> ContextKey {
        match self {
            Self::Files => ContextKey::Files,
            Self::Branches => ContextKey::LocalBranches,
            Self::Remotes => ContextKey::Remotes,
            Self::RemoteBranches => ContextKey::RemoteBranches,
            Self::Tags => ContextKey::Tags,
            Self::Commits => ContextKey::BranchCommits,
            Self::ReflogCommits => ContextKey::ReflogCommits,
            Self::SubCommits => ContextKey::SubCommits,
            Self::CommitFiles => ContextKey::CommitFiles,
            Self::Stash => ContextKey::Stash,
        }
    }

    pub fn view(self) -> ViewName {
        self.context().view()
    }

    /// Whether fetching this panel needs a scope (remote name, ref, or sha).
    pub fn needs_scope(self) -> bool {
        matches!(
            self,
            Self::RemoteBranches | Self::SubCommits | Self::CommitFiles
        )
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Files => "Files",
            Self::Branches => "Local Branches",
            Self::Remotes => "Remotes",
            Self::RemoteBranches => "Remote Branches",
            Self::Tags => "Tags",
            Self::Commits => "Commits",
            Self::ReflogCommits => "Reflog",
            Self::SubCommits => "Sub-commits",
            Self::CommitFiles => "Commit Files",
            Self::Stash => "Stash",
        }
    }
}

/// What the data collaborator is asked to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelRequest {
    pub kind: PanelKind,
    /// Remote name, branch ref, or commit sha for drill-down panels.
    pub scope: Option<String>,
}

/// A fresh collection returned by the data collaborator.
#[derive(Debug, Clone)]
pub enum PanelData {
    Files(Vec<File>),
    Branches(Vec<Branch>),
    Remotes(Vec<Remote>),
    RemoteBranches(Vec<RemoteBranch>),
    Tags(Vec<Tag>),
    Commits(Vec<Commit>),
    ReflogCommits(Vec<Commit>),
    SubCommits(Vec<Commit>),
    CommitFiles(Vec<CommitFile>),
    Stash(Vec<StashEntry>),
}

impl PanelData {
    pub fn kind(&self) -> PanelKind {
        match self {
            Self::Files(_) => PanelKind::Files,
            Self::Branches(_) => PanelKind::Branches,
            Self::Remotes(_) => PanelKind::Remotes,
            Self::RemoteBranches(_) => PanelKind::RemoteBranches,
            Self::Tags(_) => PanelKind::Tags,
            Self::Commits(_) => PanelKind::Commits,
            Self::ReflogCommits(_) => PanelKind::ReflogCommits,
            Self::SubCommits(_) => PanelKind::SubCommits,
            Self::CommitFiles(_) => PanelKind::CommitFiles,
            Self::Stash(_) => PanelKind::Stash,
        }
    }
}

/// Read-only view of one panel for the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelSnapshot {
    pub kind: PanelKind,
    pub rows: Vec<String>,
    pub selected: Option<usize>,
}

// ============================================================================
// Panel Store
// ============================================================================

macro_rules! with_panel {
    ($store:expr, $kind:expr, |$p:ident| $body:expr) => {
        match $kind {
            PanelKind::Files => {
                let $p = &$store.files;
                $body
            }
            PanelKind::Branches => {
                let $p = &$store.branches;
                $body
            }
            PanelKind::Remotes => {
                let $p = &$store.remotes;
                $body
            }
            PanelKind::RemoteBranches => {
                let $p = &$store.remote_branches;
                $body
            }
            PanelKind::Tags => {
                let $p = &$store.tags;
                $body
            }
            PanelKind::Commits => {
                let $p = &$store.commits;
                $body
            }
            PanelKind::ReflogCommits => {
                let $p = &$store.reflog_commits;
                $body
            }
            PanelKind::SubCommits => {
                let $p = &$store.sub_commits;
                $body
            }
            PanelKind::CommitFiles => {
                let $p = &$store.commit_files;
                $body
            }
            PanelKind::Stash => {
                let $p = &$store.stash;
                $body
            }
        }
    };
}

macro_rules! with_panel_mut {
    ($store:expr, $kind:expr, |$p:ident| $body:expr) => {
        match $kind {
            PanelKind::Files => {
                let $p = &mut $store.files;
                $body
            }
            PanelKind::Branches => {
                let $p = &mut $store.branches;
                $body
            }
            PanelKind::Remotes => {
                let $p = &mut $store.remotes;
                $body
            }
            PanelKind::RemoteBranches => {
                let $p = &mut $store.remote_branches;
                $body
            }
            PanelKind::Tags => {
                let $p = &mut $store.tags;
                $body
            }
            PanelKind::Commits => {
                let $p = &mut $store.commits;
                $body
            }
            PanelKind::ReflogCommits => {
                let $p = &mut $store.reflog_commits;
                $body
            }
            PanelKind::SubCommits => {
                let $p = &mut $store.sub_commits;
                $body
            }
            PanelKind::CommitFiles => {
                let $p = &mut $store.commit_files;
                $body
            }
            PanelKind::Stash => {
                let $p = &mut $store.stash;
                $body
            }
        }
    };
}

/// All panel states plus the in-flight bookkeeping for their refreshes.
///
/// Only the event loop touches the store. Background fetches receive a
/// [`PanelRequest`] and report back through `finish_refresh`.
#[derive(Debug, Default)]
pub struct PanelStore {
    pub files: PanelState<File>,
    pub branches: PanelState<Branch>,
    pub remotes: PanelState<Remote>,
    pub remote_branches: PanelState<RemoteBranch>,
    pub tags: PanelState<Tag>,
    pub commits: PanelState<Commit>,
    pub reflog_commits: PanelState<Commit>,
    pub sub_commits: PanelState<Commit>,
    pub commit_files: PanelState<CommitFile>,
    pub stash: PanelState<StashEntry>,
    /// Fetches running now, keyed by the scope they were issued for.
    in_flight: HashSet<(PanelKind, Option<String>)>,
    scopes: HashMap<PanelKind, String>,
}

impl PanelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scope a drill-down panel fetches with. Changing the scope
    /// clears the panel so stale rows from another remote or commit never show.
    pub fn set_scope(&mut self, kind: PanelKind, scope: impl Into<String>) {
        let scope = scope.into();
        if self.scopes.get(&kind) != Some(&scope) {
            with_panel_mut!(self, kind, |p| *p = Default::default());
            self.scopes.insert(kind, scope);
        }
    }

    pub fn scope(&self, kind: PanelKind) -> Option<&str> {
        self.scopes.get(&kind).map(String::as_str)
    }

    pub fn is_refreshing(&self, kind: PanelKind) -> bool {
        self.in_flight.iter().any(|(k, _)| *k == kind)
    }

    /// Claim the refresh slot for `kind`.
    ///
    /// Returns `None` when a refresh of the same panel and scope is already in
    /// flight (the request is dropped) or when a drill-down panel has no scope
    /// yet. A fetch for an older scope does not block one for the current
    /// scope, since its result will be discarded.
    pub fn begin_refresh(&mut self, kind: PanelKind) -> Option<PanelRequest> {
        let scope = self.scopes.get(&kind).cloned();
        if kind.needs_scope() && scope.is_none() {
            tracing::debug!(panel = ?kind, "Refresh skipped: no scope");
            return None;
        }
        if !self.in_flight.insert((kind, scope.clone())) {
            tracing::debug!(panel = ?kind, "Refresh dropped: already in flight");
            return None;
        }
        Some(PanelRequest { kind, scope })
    }

    /// Release the refresh slot for `kind` and apply the fetched data.
    ///
    /// The slot is released whatever the result. Data for a different panel
    /// than the one requested, or for a scope that changed while the fetch was
    /// running, is discarded.
    pub fn finish_refresh(
        &mut self,
        request: &PanelRequest,
        result: Result<PanelData, GitError>,
    ) -> Result<Option<RefreshOutcome>, GitError> {
        self.in_flight.remove(&(request.kind, request.scope.clone()));
        let data = result?;

        if data.kind() != request.kind {
            tracing::warn!(
                requested = ?request.kind,
                received = ?data.kind(),
                "Discarding panel data for the wrong panel"
            );
            return Ok(None);
        }
        if request.scope.as_deref() != self.scope(request.kind) {
            tracing::debug!(panel = ?request.kind, "Discarding panel data for a stale scope");
            return Ok(None);
        }

        let outcome = match data {
            PanelData::Files(v) => self.files.apply_refresh(v, retain_positions),
            PanelData::Branches(v) => self.branches.apply_refresh(v, replace_all),
            PanelData::Remotes(v) => self.remotes.apply_refresh(v, replace_all),
            PanelData::RemoteBranches(v) => self.remote_branches.apply_refresh(v, replace_all),
            PanelData::Tags(v) => self.tags.apply_refresh(v, replace_all),
            PanelData::Commits(v) => self.commits.apply_refresh(v, replace_all),
            PanelData::ReflogCommits(v) => self.reflog_commits.apply_refresh(v, replace_all),
            PanelData::SubCommits(v) => self.sub_commits.apply_refresh(v, replace_all),
            PanelData::CommitFiles(v) => self.commit_files.apply_refresh(v, replace_all),
            PanelData::Stash(v) => self.stash.apply_refresh(v, replace_all),
        };
        Ok(Some(outcome))
    }

    pub fn len(&self, kind: PanelKind) -> usize {
        with_panel!(self, kind, |p| p.len())
    }

    pub fn selected_index(&self, kind: PanelKind) -> Option<usize> {
        with_panel!(self, kind, |p| p.selected_index())
    }

    pub fn selected_key(&self, kind: PanelKind) -> Option<String> {
        with_panel!(self, kind, |p| p
            .selected()
            .map(|item| item.natural_key().to_owned()))
    }

    pub fn move_selection(&mut self, kind: PanelKind, delta: isize) {
        with_panel_mut!(self, kind, |p| p.move_selection(delta))
    }

    pub fn select(&mut self, kind: PanelKind, idx: usize) {
        with_panel_mut!(self, kind, |p| p.select(idx))
    }

    pub fn select_last(&mut self, kind: PanelKind) {
        with_panel_mut!(self, kind, |p| p.select_last())
    }

    /// Read-only snapshot for rendering.
    pub fn current(&self, kind: PanelKind) -> PanelSnapshot {
        let rows = match kind {
            PanelKind::Files => self.files.items().iter().map(File::display_string).collect(),
            PanelKind::Branches => self
                .branches
                .items()
                .iter()
                .map(|b| {
                    let head = if b.head { "*" } else { " " };
                    let sync = if b.has_upstream() {
                        format!(" ↑{}↓{}", b.pushables, b.pullables)
                    } else {
                        String::new()
                    };
                    format!("{} {:<4} {}{}", head, b.recency, b.name, sync)
                })
                .collect(),
            PanelKind::Remotes => self.remotes.items().iter().map(|r| r.name.clone()).collect(),
            PanelKind::RemoteBranches => self
                .remote_branches
                .items()
                .iter()
                .map(|b| b.name.clone())
                .collect(),
            PanelKind::Tags => self.tags.items().iter().map(|t| t.name.clone()).collect(),
            PanelKind::Commits | PanelKind::ReflogCommits | PanelKind::SubCommits => {
                let state = match kind {
                    PanelKind::ReflogCommits => &self.reflog_commits,
                    PanelKind::SubCommits => &self.sub_commits,
                    _ => &self.commits,
                };
                state
                    .items()
                    .iter()
                    .map(|c| format!("{} {}", c.short_sha(), c.name))
                    .collect()
            }
            PanelKind::CommitFiles => self
                .commit_files
                .items()
                .iter()
                .map(|f| format!("{} {}", f.change_status, f.name))
                .collect(),
            PanelKind::Stash => self
                .stash
                .items()
                .iter()
                .map(|s| format!("{}: {}", s.index, s.name))
                .collect(),
        };

        PanelSnapshot {
            kind,
            rows,
            selected: self.selected_index(kind),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

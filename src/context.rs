//! Views, contexts, and the per-view context stack.
//!
//! A view is a focusable screen region. A context is a logical mode that lives
//! in exactly one view and decides which bindings are eligible there. Each view
//! owns a stack of contexts whose bottom entry is the view's root context.
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// View Names
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewName {
    Status,
    Files,
    Branches,
    Commits,
    Stash,
    Main,
    Menu,
    Confirmation,
    Prompt,
}

impl ViewName {
    /// Side windows in on-screen order. Numeric jump keys and side-window
    /// cycling follow this order.
    pub const SIDE_WINDOWS: [ViewName; 5] = [
        ViewName::Status,
        ViewName::Files,
        ViewName::Branches,
        ViewName::Commits,
        ViewName::Stash,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Files => "files",
            Self::Branches => "branches",
            Self::Commits => "commits",
            Self::Stash => "stash",
            Self::Main => "main",
            Self::Menu => "menu",
            Self::Confirmation => "confirmation",
            Self::Prompt => "prompt",
        }
    }

    /// The context a view starts in and returns to when its stack unwinds.
    pub fn root_context(self) -> ContextKey {
        match self {
            Self::Status => ContextKey::Status,
            Self::Files => ContextKey::Files,
            Self::Branches => ContextKey::LocalBranches,
            Self::Commits => ContextKey::BranchCommits,
            Self::Stash => ContextKey::Stash,
            Self::Main => ContextKey::MainNormal,
            Self::Menu => ContextKey::Menu,
            Self::Confirmation => ContextKey::Confirmation,
            Self::Prompt => ContextKey::Prompt,
        }
    }

    /// Contexts reachable by tab cycling within this view.
    pub fn tabs(self) -> &'static [ContextKey] {
        match self {
            Self::Branches => &[
                ContextKey::LocalBranches,
                ContextKey::Remotes,
                ContextKey::Tags,
            ],
            Self::Commits => &[ContextKey::BranchCommits, ContextKey::ReflogCommits],
            _ => &[],
        }
    }

    pub fn is_side_window(self) -> bool {
        Self::SIDE_WINDOWS.contains(&self)
    }

    pub fn is_popup(self) -> bool {
        matches!(self, Self::Menu | Self::Confirmation | Self::Prompt)
    }
}

impl fmt::Display for ViewName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Context Keys
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKey {
    Status,
    Files,
    LocalBranches,
    Remotes,
    RemoteBranches,
    Tags,
    SubCommits,
    BranchCommits,
    ReflogCommits,
    CommitFiles,
    Stash,
    MainNormal,
    MainStaging,
    MainMerging,
    MainPatchBuilding,
    Menu,
    Confirmation,
    Prompt,
}

impl ContextKey {
    pub const ALL: [ContextKey; 18] = [
        ContextKey::Status,
        ContextKey::Files,
        ContextKey::LocalBranches,
        ContextKey::Remotes,
        ContextKey::RemoteBranches,
        ContextKey::Tags,
        ContextKey::SubCommits,
        ContextKey::BranchCommits,
        ContextKey::ReflogCommits,
        ContextKey::CommitFiles,
        ContextKey::Stash,
        ContextKey::MainNormal,
        ContextKey::MainStaging,
        ContextKey::MainMerging,
        ContextKey::MainPatchBuilding,
        ContextKey::Menu,
        ContextKey::Confirmation,
        ContextKey::Prompt,
    ];

    /// Name used in config files (`context = "localBranches"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Files => "files",
            Self::LocalBranches => "localBranches",
            Self::Remotes => "remotes",
            Self::RemoteBranches => "remoteBranches",
            Self::Tags => "tags",
            Self::SubCommits => "subCommits",
            Self::BranchCommits => "commits",
            Self::ReflogCommits => "reflogCommits",
            Self::CommitFiles => "commitFiles",
            Self::Stash => "stash",
            Self::MainNormal => "normal",
            Self::MainStaging => "staging",
            Self::MainMerging => "merging",
            Self::MainPatchBuilding => "patchBuilding",
            Self::Menu => "menu",
            Self::Confirmation => "confirmation",
            Self::Prompt => "prompt",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// The single view this context belongs to.
    pub fn view(self) -> ViewName {
        match self {
            Self::Status => ViewName::Status,
            Self::Files => ViewName::Files,
            Self::LocalBranches
            | Self::Remotes
            | Self::RemoteBranches
            | Self::Tags
            | Self::SubCommits => ViewName::Branches,
            Self::BranchCommits | Self::ReflogCommits | Self::CommitFiles => ViewName::Commits,
            Self::Stash => ViewName::Stash,
            Self::MainNormal | Self::MainStaging | Self::MainMerging | Self::MainPatchBuilding => {
                ViewName::Main
            }
            Self::Menu => ViewName::Menu,
            Self::Confirmation => ViewName::Confirmation,
            Self::Prompt => ViewName::Prompt,
        }
    }

    /// Comma-separated list of every context name, for config error messages.
    pub fn permitted_names() -> String {
        Self::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Context Stack
// ============================================================================

/// One stack of contexts per view. An empty stack means the view is at its
/// root context; the root itself is never stored and can never be popped.
#[derive(Debug, Default)]
pub struct ContextStack {
    stacks: HashMap<ViewName, Vec<ContextKey>>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active context of `view`.
    pub fn current(&self, view: ViewName) -> ContextKey {
        self.stacks
            .get(&view)
            .and_then(|s| s.last().copied())
            .unwrap_or_else(|| view.root_context())
    }

    /// Drill into `ctx` on its own view.
    pub fn push(&mut self, ctx: ContextKey) {
        let view = ctx.view();
        if self.current(view) == ctx {
            return;
        }
        tracing::debug!(view = %view, context = %ctx, "Pushed context");
        self.stacks.entry(view).or_default().push(ctx);
    }

    /// Return to the previous context of `view`. At the root this does nothing
    /// and returns `None`.
    pub fn pop(&mut self, view: ViewName) -> Option<ContextKey> {
        let popped = self.stacks.get_mut(&view).and_then(Vec::pop);
        if let Some(ctx) = popped {
            tracing::debug!(view = %view, context = %ctx, "Popped context");
        }
        popped
    }

    /// Swap the active context for `ctx` without growing the stack. Used for
    /// tab switches, which are siblings rather than drill-downs.
    pub fn replace_top(&mut self, ctx: ContextKey) {
        let view = ctx.view();
        let stack = self.stacks.entry(view).or_default();
        match stack.last_mut() {
            Some(top) => *top = ctx,
            None if ctx != view.root_context() => stack.push(ctx),
            None => {}
        }
    }

    /// Unwind `view` to its root context.
    pub fn reset(&mut self, view: ViewName) {
        self.stacks.remove(&view);
    }

    /// Number of contexts above the root.
    pub fn depth(&self, view: ViewName) -> usize {
        self.stacks.get(&view).map_or(0, Vec::len)
    }
}

// ============================================================================
// Tests
// ============================================================================

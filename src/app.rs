use crate::config::Config;
use crate::context::{ContextKey, ContextStack, ViewName};
use crate::custom_commands::{ChainRun, TemplateContext};
use crate::git::{CommandRunner, GitError, PreviewTarget, PushOptions, RepoSource};
use crate::keybindings::{Action, BindingTable, KeyConfig};
use crate::models::Branch;
use crate::panels::{PanelData, PanelKind, PanelRequest, PanelStore};
use crate::remote::RemoteGuard;
use ratatui::layout::Rect;
use std::borrow::Cow;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::Instant;

/// Lines the main view scrolls per key press or wheel step.
pub const MAIN_SCROLL_STEP: u16 = 2;

/// Seconds a status message stays visible.
const STATUS_TTL_SECS: u64 = 3;

// ============================================================================
// Popups
// ============================================================================

/// What a text prompt's answer is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptPurpose {
    /// Answer to the current step of the running custom command.
    CustomCommand,
    /// Ad-hoc shell command, run in the foreground.
    ShellCommand,
    /// `"<remote> <branch>"` for a push without upstream.
    PushUpstream,
    /// `"<remote>/<branch>"` for a pull without upstream.
    PullUpstream,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuValue {
    /// A custom-command menu answer.
    Response(String),
    /// A help-menu entry runs its binding's action.
    Action(Action),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    pub description: String,
    pub value: MenuValue,
}

/// What confirming a confirmation popup does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmPurpose {
    /// Push again with these options (force already set).
    ForcePush(PushOptions),
}

/// The modal currently shown over the panels. At most one is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Popup {
    Prompt {
        title: String,
        input: String,
        /// Cursor position in chars.
        cursor: usize,
        purpose: PromptPurpose,
    },
    Menu {
        title: String,
        items: Vec<MenuItem>,
        selected: usize,
    },
    Confirm {
        title: String,
        message: String,
        purpose: ConfirmPurpose,
    },
    Error {
        message: String,
    },
}

impl Popup {
    pub fn prompt(title: impl Into<String>, initial: impl Into<String>, purpose: PromptPurpose) -> Self {
        let input = initial.into();
        Self::Prompt {
            title: title.into(),
            cursor: input.chars().count(),
            input,
            purpose,
        }
    }

    /// The view that receives input while this popup is open.
    pub fn view(&self) -> ViewName {
        match self {
            Self::Prompt { .. } => ViewName::Prompt,
            Self::Menu { .. } => ViewName::Menu,
            Self::Confirm { .. } | Self::Error { .. } => ViewName::Confirmation,
        }
    }
}

// ============================================================================
// Background Events
// ============================================================================

/// Which remote operation finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOp {
    Fetch,
    BackgroundFetch,
    Pull,
}

/// Results that background tasks send back to the event loop.
#[derive(Debug)]
pub enum AppEvent {
    /// A panel fetch finished. Always sent, so the in-flight slot is released.
    PanelLoaded {
        request: PanelRequest,
        result: Result<PanelData, GitError>,
    },
    /// Main-view preview loaded for the given generation.
    PreviewLoaded {
        generation: u64,
        result: Result<String, GitError>,
    },
    RemoteDone {
        op: RemoteOp,
        /// Unset for background fetches, which show no loader.
        loader: Option<LoaderId>,
        result: Result<(), GitError>,
    },
    PushDone {
        options: PushOptions,
        loader: LoaderId,
        result: Result<(), GitError>,
    },
    /// A repository mutation (stage, checkout, custom command) finished.
    MutationDone {
        label: Cow<'static, str>,
        loader: LoaderId,
        refresh: &'static [PanelKind],
        result: Result<(), GitError>,
    },
    /// A background task panicked.
    ///
    /// Fields:
    /// - `task`: Name of the task that panicked (e.g., "push", "preview")
    /// - `error`: The panic message extracted from the panic payload
    TaskPanicked {
        task: &'static str,
        error: String,
    },
}

// ============================================================================
// Layout Cache
// ============================================================================

/// Where each view was drawn last frame, for mouse hit-testing.
#[derive(Debug, Default, Clone)]
pub struct LayoutCache {
    pub views: Vec<(ViewName, Rect)>,
    /// First visible row of each list panel.
    pub offsets: HashMap<PanelKind, usize>,
    /// Inner height of each list panel.
    pub heights: HashMap<PanelKind, usize>,
    pub popup: Option<Rect>,
}

impl LayoutCache {
    pub fn view_at(&self, column: u16, row: u16) -> Option<(ViewName, Rect)> {
        self.views
            .iter()
            .find(|(_, r)| {
                column >= r.x && column < r.x + r.width && row >= r.y && row < r.y + r.height
            })
            .copied()
    }

    pub fn page_size(&self, kind: PanelKind) -> usize {
        self.heights.get(&kind).copied().unwrap_or(10).max(1)
    }
}

// ============================================================================
// Main View
// ============================================================================

#[derive(Debug, Default)]
pub struct Preview {
    pub target: Option<PreviewTarget>,
    /// Bumped for every load; results from older loads are discarded.
    pub generation: u64,
    pub text: String,
    pub scroll: u16,
    pub loading: bool,
}

// ============================================================================
// Loaders
// ============================================================================

/// Handle for one running operation's loader text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderId(u64);

/// Loader texts of the background operations still running, oldest first.
#[derive(Debug, Default)]
pub struct Loaders {
    next_id: u64,
    active: Vec<(LoaderId, Cow<'static, str>)>,
}

impl Loaders {
    pub fn start(&mut self, text: impl Into<Cow<'static, str>>) -> LoaderId {
        let id = LoaderId(self.next_id);
        self.next_id += 1;
        self.active.push((id, text.into()));
        id
    }

    /// Returns false if `id` already finished.
    pub fn finish(&mut self, id: LoaderId) -> bool {
        let before = self.active.len();
        self.active.retain(|(active, _)| *active != id);
        self.active.len() != before
    }

    /// Text of the newest operation still running.
    pub fn current(&self) -> Option<&str> {
        self.active.last().map(|(_, text)| text.as_ref())
    }

    pub fn is_active(&self) -> bool {
        !self.active.is_empty()
    }
}

// ============================================================================
// Application State
// ============================================================================

/// The one state value owned by the event loop.
pub struct App {
    pub config: Config,
    pub config_path: PathBuf,

    pub repo: Arc<dyn RepoSource>,
    pub runner: Arc<dyn CommandRunner>,
    pub remote_guard: RemoteGuard,

    pub keys: KeyConfig,
    pub bindings: BindingTable,

    pub panels: PanelStore,
    pub contexts: ContextStack,
    /// Focused side window or the main view. Popups are tracked separately.
    pub focused: ViewName,
    /// Side window to go back to when leaving the main view.
    pub last_side: ViewName,

    pub popup: Option<Popup>,
    /// Popups from background tasks waiting for the open popup or custom
    /// command to finish.
    pub deferred_popups: VecDeque<Popup>,
    /// Custom command currently collecting prompt answers.
    pub chain: Option<ChainRun>,
    /// Command waiting to take over the terminal.
    pub pending_subprocess: Option<String>,

    pub preview: Preview,

    pub loader: Loaders,
    pub spinner_frame: usize,
    pub status_message: Option<(Cow<'static, str>, Instant)>,

    /// Last mouse position, for click handlers.
    pub mouse: Option<(u16, u16)>,
    pub layout: LayoutCache,
    pub needs_redraw: bool,
}

impl App {
    pub fn new(
        config: Config,
        config_path: PathBuf,
        keys: KeyConfig,
        bindings: BindingTable,
        repo: Arc<dyn RepoSource>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            config,
            config_path,
            repo,
            runner,
            remote_guard: RemoteGuard::new(),
            keys,
            bindings,
            panels: PanelStore::new(),
            contexts: ContextStack::new(),
            focused: ViewName::Files,
            last_side: ViewName::Files,
            popup: None,
            deferred_popups: VecDeque::new(),
            chain: None,
            pending_subprocess: None,
            preview: Preview::default(),
            loader: Loaders::default(),
            spinner_frame: 0,
            status_message: None,
            mouse: None,
            layout: LayoutCache::default(),
            needs_redraw: true,
        }
    }

    /// View that receives input: the popup if one is open, else the focus.
    pub fn input_view(&self) -> ViewName {
        self.popup.as_ref().map_or(self.focused, Popup::view)
    }

    pub fn context_of(&self, view: ViewName) -> ContextKey {
        self.contexts.current(view)
    }

    pub fn current_context(&self) -> ContextKey {
        self.context_of(self.input_view())
    }

    /// Panel shown by `view` right now, if it shows one.
    pub fn panel_of(&self, view: ViewName) -> Option<PanelKind> {
        PanelKind::for_context(self.context_of(view))
    }

    /// Whether `kind` is currently on screen.
    pub fn is_displayed(&self, kind: PanelKind) -> bool {
        self.panel_of(kind.view()) == Some(kind)
    }

    pub fn checked_out_branch(&self) -> Option<&Branch> {
        self.panels.branches.items().iter().find(|b| b.head)
    }

    /// Snapshot of the current selections for template resolution.
    pub fn template_context(&self) -> TemplateContext {
        let p = &self.panels;
        TemplateContext {
            selected_local_commit: p.commits.selected().cloned(),
            selected_reflog_commit: p.reflog_commits.selected().cloned(),
            selected_sub_commit: p.sub_commits.selected().cloned(),
            selected_file: p.files.selected().cloned(),
            selected_local_branch: p.branches.selected().cloned(),
            selected_remote_branch: p.remote_branches.selected().cloned(),
            selected_remote: p.remotes.selected().cloned(),
            selected_tag: p.tags.selected().cloned(),
            selected_stash_entry: p.stash.selected().cloned(),
            selected_commit_file: p.commit_files.selected().cloned(),
            checked_out_branch: self.checked_out_branch().cloned(),
            prompt_responses: Vec::new(),
        }
    }

    /// What the main view should show for the focused panel's selection.
    pub fn preview_target(&self) -> Option<PreviewTarget> {
        let p = &self.panels;
        match self.context_of(self.focused) {
            ContextKey::Files => p.files.selected().map(|f| PreviewTarget::File {
                name: f.name.clone(),
                tracked: f.tracked,
                staged_only: f.has_staged_changes && !f.has_unstaged_changes,
            }),
            ContextKey::LocalBranches => {
                p.branches.selected().map(|b| PreviewTarget::Branch(b.name.clone()))
            }
            ContextKey::RemoteBranches => p
                .remote_branches
                .selected()
                .map(|b| PreviewTarget::RemoteBranch(b.full_name())),
            ContextKey::Tags => p.tags.selected().map(|t| PreviewTarget::Tag(t.name.clone())),
            ContextKey::BranchCommits => {
                p.commits.selected().map(|c| PreviewTarget::Commit(c.sha.clone()))
            }
            ContextKey::ReflogCommits => p
                .reflog_commits
                .selected()
                .map(|c| PreviewTarget::Commit(c.sha.clone())),
            ContextKey::SubCommits => p
                .sub_commits
                .selected()
                .map(|c| PreviewTarget::Commit(c.sha.clone())),
            ContextKey::CommitFiles => p.commit_files.selected().map(|f| PreviewTarget::CommitFile {
                sha: f.sha.clone(),
                name: f.name.clone(),
            }),
            ContextKey::Stash => p.stash.selected().map(|s| PreviewTarget::Stash(s.index)),
            _ => None,
        }
    }

    // ------------------------------------------------------------------------
    // Popups and status
    // ------------------------------------------------------------------------

    pub fn open_popup(&mut self, popup: Popup) {
        tracing::debug!(view = %popup.view(), "Opened popup");
        self.popup = Some(popup);
        self.needs_redraw = true;
    }

    /// Close the popup. A custom command waiting on it is abandoned.
    pub fn close_popup(&mut self) {
        if self.popup.take().is_some() {
            self.needs_redraw = true;
        }
        if self.chain.take().is_some() {
            tracing::debug!("Custom command cancelled");
        }
    }

    /// Open `popup` once nothing else is: no popup is open and no custom
    /// command is collecting answers.
    pub fn queue_popup(&mut self, popup: Popup) {
        self.deferred_popups.push_back(popup);
        self.show_deferred_popup();
    }

    /// Open the oldest deferred popup if the screen is free.
    pub fn show_deferred_popup(&mut self) {
        if self.popup.is_some() || self.chain.is_some() {
            return;
        }
        if let Some(popup) = self.deferred_popups.pop_front() {
            self.open_popup(popup);
        }
    }

    /// Surface an error from a background task without disturbing the popup
    /// or custom command in progress.
    pub fn report_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(error = %message, "Background error");
        self.queue_popup(Popup::Error { message });
    }

    /// Surface an error in the error popup, replacing any open popup.
    pub fn show_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(error = %message, "Surfaced error");
        self.chain = None;
        self.popup = Some(Popup::Error { message });
        self.needs_redraw = true;
    }

    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
        self.needs_redraw = true;
    }

    /// Clear the status message if expired. Returns true if one was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= STATUS_TTL_SECS {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    pub fn set_loader(&mut self, text: impl Into<Cow<'static, str>>) -> LoaderId {
        self.needs_redraw = true;
        self.loader.start(text)
    }

    pub fn clear_loader(&mut self, id: LoaderId) {
        if self.loader.finish(id) {
            self.needs_redraw = true;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::PullMode;
    use crate::models::{Commit, File};
    use async_trait::async_trait;
    use std::io;
    use std::process::Output;

    struct NoRepo;

    #[async_trait]
    impl RepoSource for NoRepo {
        async fn load(&self, _: &PanelRequest) -> Result<PanelData, GitError> {
            Err(GitError::Failed("offline".into()))
        }
        async fn preview(&self, _: &PreviewTarget) -> Result<String, GitError> {
            Ok(String::new())
        }
        async fn fetch(&self) -> Result<(), GitError> {
            Ok(())
        }
        async fn pull(&self, _: PullMode) -> Result<(), GitError> {
            Ok(())
        }
        async fn push(&self, _: &PushOptions) -> Result<(), GitError> {
            Ok(())
        }
        async fn set_upstream(&self, _: &str) -> Result<(), GitError> {
            Ok(())
        }
        async fn stage(&self, _: &str) -> Result<(), GitError> {
            Ok(())
        }
        async fn unstage(&self, _: &str) -> Result<(), GitError> {
            Ok(())
        }
        async fn stage_all(&self) -> Result<(), GitError> {
            Ok(())
        }
        async fn unstage_all(&self) -> Result<(), GitError> {
            Ok(())
        }
        async fn checkout(&self, _: &str) -> Result<(), GitError> {
            Ok(())
        }
    }

    struct NoRunner;

    #[async_trait]
    impl CommandRunner for NoRunner {
        async fn run(&self, _: &str, _: &[String]) -> io::Result<Output> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no runner"))
        }
    }

    fn app() -> App {
        let keys = KeyConfig::default();
        let bindings = BindingTable::build(&keys, &[]).unwrap();
        App::new(
            Config::default(),
            PathBuf::from("/tmp/gitdeck.toml"),
            keys,
            bindings,
            Arc::new(NoRepo),
            Arc::new(NoRunner),
        )
    }

    #[test]
    fn test_input_view_follows_popup() {
        let mut app = app();
        assert_eq!(app.input_view(), ViewName::Files);
        app.open_popup(Popup::Error {
            message: "boom".into(),
        });
        assert_eq!(app.input_view(), ViewName::Confirmation);
        assert_eq!(app.current_context(), ContextKey::Confirmation);
        app.close_popup();
        assert_eq!(app.input_view(), ViewName::Files);
    }

    #[test]
    fn test_prompt_cursor_starts_at_end() {
        let Popup::Prompt { cursor, .. } = Popup::prompt("t", "héllo", PromptPurpose::ShellCommand)
        else {
            panic!("expected prompt");
        };
        assert_eq!(cursor, 5);
    }

    #[test]
    fn test_template_context_snapshots_selection() {
        let mut app = app();
        app.panels.branches = crate::panels::PanelState::with_items(vec![
            Branch {
                name: "main".into(),
                head: true,
                ..Default::default()
            },
            Branch {
                name: "topic".into(),
                ..Default::default()
            },
        ]);
        app.panels.branches.select(1);
        app.panels.commits = crate::panels::PanelState::with_items(vec![Commit {
            sha: "abc".into(),
            ..Default::default()
        }]);

        let ctx = app.template_context();
        assert_eq!(ctx.selected_local_branch.unwrap().name, "topic");
        assert_eq!(ctx.checked_out_branch.unwrap().name, "main");
        assert_eq!(ctx.selected_local_commit.unwrap().sha, "abc");
        assert!(ctx.selected_file.is_none());
        assert!(ctx.prompt_responses.is_empty());
    }

    #[test]
    fn test_preview_target_for_files() {
        let mut app = app();
        app.panels.files = crate::panels::PanelState::with_items(vec![File {
            name: "a.rs".into(),
            tracked: true,
            has_staged_changes: true,
            ..Default::default()
        }]);
        assert_eq!(
            app.preview_target(),
            Some(PreviewTarget::File {
                name: "a.rs".into(),
                tracked: true,
                staged_only: true
            })
        );
    }

    #[test]
    fn test_show_error_abandons_chain_popup() {
        let mut app = app();
        app.open_popup(Popup::prompt("x", "", PromptPurpose::CustomCommand));
        app.show_error("bad template");
        assert!(matches!(app.popup, Some(Popup::Error { .. })));
        assert!(app.chain.is_none());
    }

    #[test]
    fn test_background_error_waits_for_chain() {
        let mut app = app();
        let chain = crate::custom_commands::compile_chain(&crate::custom_commands::CustomCommand {
            command: "git tag {{index .PromptResponses 0}}".into(),
            prompts: vec![crate::custom_commands::PromptSpec {
                kind: "input".into(),
                ..Default::default()
            }],
            ..Default::default()
        })
        .unwrap();
        app.chain = Some(Arc::new(chain).start());
        app.open_popup(Popup::prompt("x", "", PromptPurpose::CustomCommand));

        app.report_error("push failed");
        assert!(matches!(app.popup, Some(Popup::Prompt { .. })));
        assert!(app.chain.is_some());

        app.close_popup();
        app.show_deferred_popup();
        assert_eq!(
            app.popup,
            Some(Popup::Error {
                message: "push failed".into()
            })
        );
    }

    #[test]
    fn test_deferred_popups_open_in_order() {
        let mut app = app();
        app.open_popup(Popup::Error {
            message: "first".into(),
        });
        app.report_error("second");
        app.report_error("third");

        app.close_popup();
        app.show_deferred_popup();
        assert_eq!(app.popup, Some(Popup::Error { message: "second".into() }));
        // Still busy, nothing more opens
        app.show_deferred_popup();
        assert_eq!(app.deferred_popups.len(), 1);
    }

    #[test]
    fn test_loader_outlives_first_finisher() {
        let mut app = app();
        let push = app.set_loader("Pushing...");
        let stage = app.set_loader("Staging...");
        assert_eq!(app.loader.current(), Some("Staging..."));

        app.clear_loader(push);
        assert_eq!(app.loader.current(), Some("Staging..."));
        app.clear_loader(push);
        assert!(app.loader.is_active());

        app.clear_loader(stage);
        assert!(!app.loader.is_active());
    }

    #[test]
    fn test_layout_hit_test() {
        let mut layout = LayoutCache::default();
        layout.views.push((ViewName::Files, Rect::new(0, 3, 30, 10)));
        layout.views.push((ViewName::Main, Rect::new(30, 0, 50, 30)));
        assert_eq!(layout.view_at(5, 5).map(|(v, _)| v), Some(ViewName::Files));
        assert_eq!(layout.view_at(30, 0).map(|(v, _)| v), Some(ViewName::Main));
        assert_eq!(layout.view_at(5, 1), None);
    }
}

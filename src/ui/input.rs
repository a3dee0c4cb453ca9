//! Input dispatch and action handlers.
//!
//! Every key and mouse event goes through [`dispatch`]: the binding table
//! picks the action for the view and context under the event, and the
//! action's handler runs against the application state. Handlers return
//! `Result<_, ActionError>`; errors end up in the error popup and the loop
//! carries on.

use crate::app::{
    App, AppEvent, ConfirmPurpose, MenuItem, MenuValue, Popup, PromptPurpose, MAIN_SCROLL_STEP,
};
use crate::context::{ContextKey, ViewName};
use crate::custom_commands::{ChainStep, ResolvedCommand};
use crate::error::ActionError;
use crate::git::{PushOptions, PushTarget};
use crate::keybindings::Action;
use crate::keys::{self, Key, Modifier, SpecialKey};
use crate::panels::PanelKind;
use crate::remote::{
    pull_preflight, push_preflight, PullPreflight, PushPreflight, FORCE_PUSH_DISABLED,
    FORCE_PUSH_PROMPT,
};
use crossterm::event::{KeyEvent, KeyEventKind, MouseEvent};
use std::borrow::Cow;
use tokio::sync::mpsc;

use super::helpers::{
    refresh_panel, refresh_panels, request_preview, spawn_fetch, spawn_mutation, spawn_pull,
    spawn_push,
};

const FILES_ONLY: &[PanelKind] = &[PanelKind::Files];

/// Whether the event loop keeps going after an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Quit,
}

// ============================================================================
// Entry Points
// ============================================================================

/// Handle a terminal key event.
pub fn handle_key_event(app: &mut App, event: &KeyEvent, tx: &mpsc::Sender<AppEvent>) -> LoopControl {
    if event.kind == KeyEventKind::Release {
        return LoopControl::Continue;
    }
    match keys::from_key_event(event) {
        Some((key, modifier)) => handle_key(app, key, modifier, tx),
        None => LoopControl::Continue,
    }
}

/// Handle a key already translated into the codec's key space.
///
/// An open text prompt captures editing keys before the binding table sees
/// them, so typing `q` into a prompt never quits.
pub fn handle_key(
    app: &mut App,
    key: Key,
    modifier: Modifier,
    tx: &mpsc::Sender<AppEvent>,
) -> LoopControl {
    if modifier == Modifier::None && edit_prompt(app, key) {
        return LoopControl::Continue;
    }
    let view = app.input_view();
    dispatch(app, view, key, modifier, tx)
}

/// Handle a terminal mouse event. The event goes to the view under the
/// pointer; while a popup is open, events outside it are absorbed.
pub fn handle_mouse_event(
    app: &mut App,
    event: &MouseEvent,
    tx: &mpsc::Sender<AppEvent>,
) -> LoopControl {
    if !app.config.mouse {
        return LoopControl::Continue;
    }
    let Some((key, modifier)) = keys::from_mouse_event(event) else {
        return LoopControl::Continue;
    };
    app.mouse = Some((event.column, event.row));

    let view = if let Some(popup) = &app.popup {
        let inside = app.layout.popup.is_some_and(|r| {
            event.column >= r.x
                && event.column < r.x + r.width
                && event.row >= r.y
                && event.row < r.y + r.height
        });
        if !inside {
            return LoopControl::Continue;
        }
        popup.view()
    } else {
        match app.layout.view_at(event.column, event.row) {
            Some((view, _)) => view,
            None => return LoopControl::Continue,
        }
    };

    dispatch(app, view, key, modifier, tx)
}

/// Resolve and run the first binding for `view`'s current context.
pub fn dispatch(
    app: &mut App,
    view: ViewName,
    key: Key,
    modifier: Modifier,
    tx: &mpsc::Sender<AppEvent>,
) -> LoopControl {
    let ctx = app.context_of(view);
    let Some(binding) = app.bindings.resolve(view, ctx, key, modifier) else {
        return LoopControl::Continue;
    };
    let action = binding.action;

    // Global bindings are inert under a popup unless they make sense there
    if app.popup.is_some() && binding.view.is_none() && !action.runs_over_popups() {
        tracing::trace!(?action, "Global binding absorbed by popup");
        return LoopControl::Continue;
    }

    tracing::trace!(view = %view, context = %ctx, ?action, "Dispatching");
    let control = match execute(app, action, view, tx) {
        Ok(control) => control,
        Err(e) => {
            app.show_error(e.to_string());
            LoopControl::Continue
        }
    };
    app.show_deferred_popup();
    control
}

// ============================================================================
// Action Execution
// ============================================================================

fn execute(
    app: &mut App,
    action: Action,
    view: ViewName,
    tx: &mpsc::Sender<AppEvent>,
) -> Result<LoopControl, ActionError> {
    app.needs_redraw = true;
    match action {
        Action::Quit => return Ok(LoopControl::Quit),
        Action::Return => on_return(app, tx),
        Action::Confirm => on_confirm(app, tx)?,
        Action::PrevItem => move_selection(app, view, -1, tx),
        Action::NextItem => move_selection(app, view, 1, tx),
        Action::PrevPage => {
            let page = page_size(app, view);
            move_selection(app, view, -page, tx)
        }
        Action::NextPage => {
            let page = page_size(app, view);
            move_selection(app, view, page, tx)
        }
        Action::GotoTop => move_selection(app, view, isize::MIN, tx),
        Action::GotoBottom => move_selection(app, view, isize::MAX, tx),
        Action::ClickItem => click(app, view, tx),
        Action::PrevBlock => cycle_side_window(app, -1, tx),
        Action::NextBlock => cycle_side_window(app, 1, tx),
        Action::JumpToBlock(target) => focus(app, target, tx),
        Action::PrevTab => switch_tab(app, view, -1, tx),
        Action::NextTab => switch_tab(app, view, 1, tx),
        Action::ScrollUpMain => {
            app.preview.scroll = app.preview.scroll.saturating_sub(MAIN_SCROLL_STEP);
        }
        Action::ScrollDownMain => {
            app.preview.scroll = app.preview.scroll.saturating_add(MAIN_SCROLL_STEP);
        }
        Action::Push => push(app, tx)?,
        Action::Pull => pull(app, tx)?,
        Action::Fetch => spawn_fetch(app, false, tx),
        Action::Refresh => refresh_all(app, tx),
        Action::RefreshFiles => {
            refresh_panel(app, PanelKind::Files, tx);
        }
        Action::OptionMenu => open_help_menu(app, view),
        Action::ExecuteShellCommand => app.open_popup(Popup::prompt(
            "Shell command:",
            "",
            PromptPurpose::ShellCommand,
        )),
        Action::GoInto => go_into(app, view, tx),
        Action::ToggleStaged => toggle_staged(app, tx),
        Action::ToggleStagedAll => toggle_staged_all(app, tx),
        Action::Checkout => checkout(app, view, tx),
        Action::OpenFile => open_file(app, view)?,
        Action::OpenConfig => {
            let path = app.config_path.clone();
            open::that(&path).map_err(|source| ActionError::Open {
                target: path.display().to_string(),
                source,
            })?;
        }
        Action::CustomCommand(index) => start_custom_command(app, index, tx)?,
    }
    Ok(LoopControl::Continue)
}

/// Refresh every side panel plus whichever drill-down panels are on screen.
pub(super) fn refresh_all(app: &mut App, tx: &mpsc::Sender<AppEvent>) {
    refresh_panels(app, &PanelKind::SIDE, tx);
    for kind in [
        PanelKind::RemoteBranches,
        PanelKind::SubCommits,
        PanelKind::CommitFiles,
    ] {
        if app.is_displayed(kind) {
            refresh_panel(app, kind, tx);
        }
    }
}

// ============================================================================
// Popups
// ============================================================================

/// Cancel the popup, leave the main view, or pop the focused view's context.
/// A return at a view's root does nothing.
fn on_return(app: &mut App, tx: &mpsc::Sender<AppEvent>) {
    if app.popup.is_some() {
        app.close_popup();
        return;
    }

    if app.focused == ViewName::Main {
        app.contexts.reset(ViewName::Main);
        let side = app.last_side;
        focus(app, side, tx);
        return;
    }

    let view = app.focused;
    if app.contexts.pop(view).is_some() {
        if let Some(kind) = app.panel_of(view) {
            refresh_panel(app, kind, tx);
        }
        request_preview(app, tx);
    }
}

fn on_confirm(app: &mut App, tx: &mpsc::Sender<AppEvent>) -> Result<(), ActionError> {
    let Some(popup) = app.popup.take() else {
        return Ok(());
    };
    app.needs_redraw = true;

    match popup {
        Popup::Prompt { input, purpose, .. } => submit_prompt(app, input, purpose, tx),
        Popup::Menu {
            items, selected, ..
        } => match items.into_iter().nth(selected).map(|item| item.value) {
            Some(MenuValue::Response(value)) => {
                if let Some(run) = app.chain.as_mut() {
                    run.answer(value);
                }
                advance_chain(app, tx)
            }
            Some(MenuValue::Action(action)) => {
                let view = app.focused;
                execute(app, action, view, tx).map(|_| ())
            }
            None => {
                app.chain = None;
                Ok(())
            }
        },
        Popup::Confirm {
            purpose: ConfirmPurpose::ForcePush(options),
            ..
        } => {
            spawn_push(app, options, tx);
            Ok(())
        }
        Popup::Error { .. } => Ok(()),
    }
}

fn submit_prompt(
    app: &mut App,
    input: String,
    purpose: PromptPurpose,
    tx: &mpsc::Sender<AppEvent>,
) -> Result<(), ActionError> {
    match purpose {
        PromptPurpose::CustomCommand => {
            if let Some(run) = app.chain.as_mut() {
                run.answer(input);
            }
            advance_chain(app, tx)
        }
        PromptPurpose::ShellCommand => {
            let command = input.trim();
            if !command.is_empty() {
                tracing::info!(command, "Running shell command");
                app.pending_subprocess = Some(command.to_string());
            }
            Ok(())
        }
        PromptPurpose::PushUpstream => {
            let target = PushTarget::parse(&input).ok_or_else(|| {
                ActionError::InvalidInput(format!(
                    "Invalid upstream '{}': expected '<remote> <branch>'",
                    input.trim()
                ))
            })?;
            spawn_push(
                app,
                PushOptions {
                    target: Some(target),
                    ..Default::default()
                },
                tx,
            );
            Ok(())
        }
        PromptPurpose::PullUpstream => {
            let upstream = input.trim();
            if upstream.is_empty() {
                return Err(ActionError::InvalidInput(
                    "Upstream must not be empty".to_string(),
                ));
            }
            let mode = app.config.git.pull_mode()?;
            spawn_pull(app, mode, Some(upstream.to_string()), tx);
            Ok(())
        }
    }
}

/// Apply an editing key to the open text prompt. Returns whether the key was
/// consumed.
fn edit_prompt(app: &mut App, key: Key) -> bool {
    let Some(Popup::Prompt { input, cursor, .. }) = app.popup.as_mut() else {
        return false;
    };

    let len = input.chars().count();
    match key {
        Key::Rune(_) | Key::Special(SpecialKey::Space) => {
            let c = match key {
                Key::Rune(c) => c,
                _ => ' ',
            };
            let at = byte_index(input, *cursor);
            input.insert(at, c);
            *cursor += 1;
        }
        Key::Special(SpecialKey::Backspace) => {
            if *cursor > 0 {
                *cursor -= 1;
                let at = byte_index(input, *cursor);
                input.remove(at);
            }
        }
        Key::Special(SpecialKey::Delete) => {
            if *cursor < len {
                let at = byte_index(input, *cursor);
                input.remove(at);
            }
        }
        Key::Special(SpecialKey::Left) => *cursor = cursor.saturating_sub(1),
        Key::Special(SpecialKey::Right) => *cursor = (*cursor + 1).min(len),
        Key::Special(SpecialKey::Home) => *cursor = 0,
        Key::Special(SpecialKey::End) => *cursor = len,
        _ => return false,
    }
    app.needs_redraw = true;
    true
}

fn byte_index(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map_or(s.len(), |(idx, _)| idx)
}

fn open_help_menu(app: &mut App, view: ViewName) {
    let ctx = app.context_of(view);
    let items = app
        .bindings
        .eligible(view, ctx)
        .into_iter()
        .map(|b| {
            let mut label = keys::decode(b.key);
            if let Some(alt) = b.alternative {
                label = format!("{} ({})", label, alt);
            }
            MenuItem {
                label,
                description: b.description.clone(),
                value: MenuValue::Action(b.action),
            }
        })
        .collect();

    app.open_popup(Popup::Menu {
        title: "Keybindings".to_string(),
        items,
        selected: 0,
    });
}

// ============================================================================
// Navigation
// ============================================================================

fn page_size(app: &App, view: ViewName) -> isize {
    let rows = match app.panel_of(view) {
        Some(kind) => app.layout.page_size(kind),
        None => app.layout.popup.map_or(10, |r| r.height.saturating_sub(2) as usize),
    };
    isize::try_from(rows).unwrap_or(isize::MAX)
}

/// Move the cursor of the list shown in `view`.
fn move_selection(app: &mut App, view: ViewName, delta: isize, tx: &mpsc::Sender<AppEvent>) {
    if view == ViewName::Menu {
        if let Some(Popup::Menu {
            items, selected, ..
        }) = app.popup.as_mut()
        {
            let last = items.len().saturating_sub(1);
            *selected = selected.saturating_add_signed(delta).min(last);
        }
        return;
    }

    let Some(kind) = app.panel_of(view) else {
        return;
    };
    app.panels.move_selection(kind, delta);
    if view == app.focused {
        request_preview(app, tx);
    }
}

fn click(app: &mut App, view: ViewName, tx: &mpsc::Sender<AppEvent>) {
    let Some((_, row)) = app.mouse else {
        return;
    };

    if view == ViewName::Menu {
        let Some(rect) = app.layout.popup else {
            return;
        };
        if let Some(Popup::Menu {
            items, selected, ..
        }) = app.popup.as_mut()
        {
            let idx = row.saturating_sub(rect.y + 1) as usize;
            if idx < items.len() {
                *selected = idx;
            }
        }
        return;
    }
    if view.is_popup() {
        return;
    }

    if view != app.focused {
        focus(app, view, tx);
    }

    let Some(kind) = app.panel_of(view) else {
        return;
    };
    let Some((_, rect)) = app.layout.views.iter().find(|(v, _)| *v == view).copied() else {
        return;
    };
    // Skip the border rows
    if row <= rect.y || row + 1 >= rect.y + rect.height {
        return;
    }
    let offset = app.layout.offsets.get(&kind).copied().unwrap_or(0);
    let idx = offset + (row - rect.y - 1) as usize;
    if idx < app.panels.len(kind) {
        app.panels.select(kind, idx);
        request_preview(app, tx);
    }
}

fn focus(app: &mut App, view: ViewName, tx: &mpsc::Sender<AppEvent>) {
    if view.is_side_window() {
        app.last_side = view;
    }
    if app.focused != view {
        tracing::debug!(view = %view, "Focus changed");
    }
    app.focused = view;
    if view != ViewName::Main {
        request_preview(app, tx);
    }
}

fn cycle_side_window(app: &mut App, delta: isize, tx: &mpsc::Sender<AppEvent>) {
    let windows = ViewName::SIDE_WINDOWS;
    let current = if app.focused.is_side_window() {
        app.focused
    } else {
        app.last_side
    };
    let idx = windows.iter().position(|v| *v == current).unwrap_or(0);
    let len = windows.len() as isize;
    let next = (idx as isize + delta).rem_euclid(len) as usize;
    focus(app, windows[next], tx);
}

/// Cycle the tabs of `view`. A tab switch replaces the top of the stack, and
/// from a drill-down the view first unwinds to its tabs.
fn switch_tab(app: &mut App, view: ViewName, delta: isize, tx: &mpsc::Sender<AppEvent>) {
    let tabs = view.tabs();
    if tabs.is_empty() {
        return;
    }

    let current = app.context_of(view);
    let idx = match tabs.iter().position(|t| *t == current) {
        Some(idx) => idx,
        None => {
            app.contexts.reset(view);
            0
        }
    };
    let len = tabs.len() as isize;
    let next = tabs[(idx as isize + delta).rem_euclid(len) as usize];

    if next == view.root_context() {
        app.contexts.reset(view);
    } else {
        app.contexts.replace_top(next);
    }

    if let Some(kind) = PanelKind::for_context(next) {
        refresh_panel(app, kind, tx);
    }
    if view == app.focused {
        request_preview(app, tx);
    }
}

/// Drill into the selected item.
fn go_into(app: &mut App, view: ViewName, tx: &mpsc::Sender<AppEvent>) {
    let ctx = app.context_of(view);
    let (kind, scope) = match ctx {
        ContextKey::Files => {
            let Some(file) = app.panels.files.selected() else {
                return;
            };
            let main_ctx = if file.has_merge_conflicts {
                ContextKey::MainMerging
            } else {
                ContextKey::MainStaging
            };
            app.contexts.reset(ViewName::Main);
            app.contexts.push(main_ctx);
            focus(app, ViewName::Main, tx);
            return;
        }
        ContextKey::Remotes => match app.panels.remotes.selected() {
            Some(remote) => (PanelKind::RemoteBranches, remote.name.clone()),
            None => return,
        },
        ContextKey::LocalBranches => match app.panels.branches.selected() {
            Some(branch) => (PanelKind::SubCommits, branch.name.clone()),
            None => return,
        },
        ContextKey::RemoteBranches => match app.panels.remote_branches.selected() {
            Some(branch) => (PanelKind::SubCommits, branch.full_name()),
            None => return,
        },
        ContextKey::BranchCommits => match app.panels.commits.selected() {
            Some(commit) => (PanelKind::CommitFiles, commit.sha.clone()),
            None => return,
        },
        ContextKey::ReflogCommits => match app.panels.reflog_commits.selected() {
            Some(commit) => (PanelKind::CommitFiles, commit.sha.clone()),
            None => return,
        },
        ContextKey::SubCommits => match app.panels.sub_commits.selected() {
            Some(commit) => (PanelKind::CommitFiles, commit.sha.clone()),
            None => return,
        },
        _ => return,
    };

    tracing::debug!(panel = ?kind, scope = %scope, "Drilling in");
    app.panels.set_scope(kind, scope);
    app.contexts.push(kind.context());
    refresh_panel(app, kind, tx);

    let target_view = kind.view();
    if target_view != app.focused {
        focus(app, target_view, tx);
    } else {
        request_preview(app, tx);
    }
}

// ============================================================================
// Repository Actions
// ============================================================================

fn toggle_staged(app: &mut App, tx: &mpsc::Sender<AppEvent>) {
    let Some(file) = app.panels.files.selected().cloned() else {
        return;
    };
    let repo = app.repo.clone();
    if file.has_unstaged_changes {
        spawn_mutation(app, "Staging...", FILES_ONLY, async move { repo.stage(&file.name).await }, tx);
    } else {
        spawn_mutation(
            app,
            "Unstaging...",
            FILES_ONLY,
            async move { repo.unstage(&file.name).await },
            tx,
        );
    }
}

fn toggle_staged_all(app: &mut App, tx: &mpsc::Sender<AppEvent>) {
    let any_unstaged = app
        .panels
        .files
        .items()
        .iter()
        .any(|f| f.has_unstaged_changes);
    let repo = app.repo.clone();
    if any_unstaged {
        spawn_mutation(app, "Staging all...", FILES_ONLY, async move { repo.stage_all().await }, tx);
    } else {
        spawn_mutation(
            app,
            "Unstaging all...",
            FILES_ONLY,
            async move { repo.unstage_all().await },
            tx,
        );
    }
}

fn checkout(app: &mut App, view: ViewName, tx: &mpsc::Sender<AppEvent>) {
    let p = &app.panels;
    let target = match app.context_of(view) {
        ContextKey::LocalBranches => p.branches.selected().map(|b| b.name.clone()),
        ContextKey::RemoteBranches => p.remote_branches.selected().map(|b| b.full_name()),
        ContextKey::Tags => p.tags.selected().map(|t| t.name.clone()),
        ContextKey::BranchCommits => p.commits.selected().map(|c| c.sha.clone()),
        ContextKey::ReflogCommits => p.reflog_commits.selected().map(|c| c.sha.clone()),
        _ => None,
    };
    let Some(target) = target else {
        return;
    };

    let repo = app.repo.clone();
    spawn_mutation(
        app,
        format!("Checking out {}...", target),
        &PanelKind::SIDE,
        async move { repo.checkout(&target).await },
        tx,
    );
}

fn open_file(app: &mut App, view: ViewName) -> Result<(), ActionError> {
    let name = match app.context_of(view) {
        ContextKey::Files => app.panels.files.selected().map(|f| f.name.clone()),
        ContextKey::CommitFiles => app.panels.commit_files.selected().map(|f| f.name.clone()),
        _ => None,
    };
    let Some(name) = name else {
        return Ok(());
    };
    open::that(&name).map_err(|source| ActionError::Open {
        target: name,
        source,
    })
}

fn push(app: &mut App, tx: &mpsc::Sender<AppEvent>) -> Result<(), ActionError> {
    match push_preflight(app.checked_out_branch(), &app.config.git) {
        PushPreflight::Push(options) => spawn_push(app, options, tx),
        PushPreflight::AskUpstream { suggestion } => app.open_popup(Popup::prompt(
            "Enter upstream as '<remote> <branchname>'",
            suggestion,
            PromptPurpose::PushUpstream,
        )),
        PushPreflight::ConfirmForce => app.open_popup(Popup::Confirm {
            title: "Force push".to_string(),
            message: FORCE_PUSH_PROMPT.to_string(),
            purpose: ConfirmPurpose::ForcePush(PushOptions {
                force: true,
                ..Default::default()
            }),
        }),
        PushPreflight::ForceDisabled => return Err(ActionError::Denied(FORCE_PUSH_DISABLED)),
    }
    Ok(())
}

fn pull(app: &mut App, tx: &mpsc::Sender<AppEvent>) -> Result<(), ActionError> {
    let mode = app.config.git.pull_mode()?;
    match pull_preflight(app.checked_out_branch()) {
        PullPreflight::Pull => spawn_pull(app, mode, None, tx),
        PullPreflight::AskUpstream { suggestion } => app.open_popup(Popup::prompt(
            "Enter upstream as '<remote>/<branchname>'",
            suggestion,
            PromptPurpose::PullUpstream,
        )),
    }
    Ok(())
}

// ============================================================================
// Custom Commands
// ============================================================================

fn start_custom_command(
    app: &mut App,
    index: usize,
    tx: &mpsc::Sender<AppEvent>,
) -> Result<(), ActionError> {
    let Some(compiled) = app.bindings.custom_command(index) else {
        tracing::warn!(index, "Binding refers to a missing custom command");
        return Ok(());
    };
    tracing::debug!(
        command = %compiled.description,
        prompts = compiled.chain.prompt_count(),
        "Starting custom command"
    );
    app.chain = Some(compiled.chain.start());
    advance_chain(app, tx)
}

/// Show the running chain's next prompt, or run its command once every
/// prompt has an answer. A template error abandons the chain.
fn advance_chain(app: &mut App, tx: &mpsc::Sender<AppEvent>) -> Result<(), ActionError> {
    let Some(run) = app.chain.as_ref() else {
        return Ok(());
    };
    let step = match run.next_step(app.template_context()) {
        Ok(step) => step,
        Err(e) => {
            app.chain = None;
            return Err(e.into());
        }
    };

    match step {
        ChainStep::Input {
            title,
            initial_value,
        } => app.open_popup(Popup::prompt(title, initial_value, PromptPurpose::CustomCommand)),
        ChainStep::Menu { title, options } => {
            let items = options
                .into_iter()
                .map(|o| MenuItem {
                    label: o.name,
                    description: o.description,
                    value: MenuValue::Response(o.value),
                })
                .collect();
            app.open_popup(Popup::Menu {
                title,
                items,
                selected: 0,
            });
        }
        ChainStep::Run(command) => {
            app.chain = None;
            run_custom_command(app, command, tx);
        }
    }
    Ok(())
}

fn run_custom_command(app: &mut App, resolved: ResolvedCommand, tx: &mpsc::Sender<AppEvent>) {
    tracing::info!(
        command = %resolved.command,
        subprocess = resolved.subprocess,
        "Running custom command"
    );
    if resolved.subprocess {
        app.pending_subprocess = Some(resolved.command);
        return;
    }

    let runner = app.runner.clone();
    let command = resolved.command;
    let label: Cow<'static, str> = if resolved.loading_text.is_empty() {
        Cow::Borrowed("Running custom command...")
    } else {
        Cow::Owned(resolved.loading_text)
    };
    spawn_mutation(
        app,
        label,
        &PanelKind::SIDE,
        async move { runner.run_shell(&command).await.map(|_| ()) },
        tx,
    );
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_index_multibyte() {
        assert_eq!(byte_index("héllo", 0), 0);
        assert_eq!(byte_index("héllo", 2), 3);
        assert_eq!(byte_index("héllo", 5), 6);
        assert_eq!(byte_index("", 3), 0);
    }
}

//! Integration tests for user-defined commands: key dispatch, prompt chains
//! and template resolution against the live selection.
//!
//! Commands run through a recording runner, so nothing touches a real shell.

mod common;

use common::{app_with, channel, pump_until, FakeRepo, RecordingRunner};
use gitdeck::app::{AppEvent, Popup};
use gitdeck::context::ViewName;
use gitdeck::git::GitError;
use gitdeck::keys::{Key, Modifier, SpecialKey};
use gitdeck::models::{Branch, Tag};
use gitdeck::panels::PanelState;
use gitdeck::ui::handle_key;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn branch(name: &str, head: bool) -> Branch {
    Branch {
        name: name.to_string(),
        pushables: "0".to_string(),
        pullables: "0".to_string(),
        head,
        ..Default::default()
    }
}

fn is_mutation_done(event: &AppEvent) -> bool {
    matches!(event, AppEvent::MutationDone { .. })
}

fn press(app: &mut gitdeck::app::App, key: Key, tx: &tokio::sync::mpsc::Sender<AppEvent>) {
    handle_key(app, key, Modifier::None, tx);
}

fn type_text(app: &mut gitdeck::app::App, text: &str, tx: &tokio::sync::mpsc::Sender<AppEvent>) {
    for c in text.chars() {
        press(app, Key::Rune(c), tx);
    }
}

const ENTER: Key = Key::Special(SpecialKey::Enter);
const ESC: Key = Key::Special(SpecialKey::Esc);

// ============================================================================
// Running
// ============================================================================

#[tokio::test]
async fn test_command_resolves_selected_branch() {
    let repo = Arc::new(FakeRepo::new());
    let runner = Arc::new(RecordingRunner::default());
    let mut app = app_with(
        r#"
[[custom_commands]]
key = "X"
context = "localBranches"
command = "echo {{.SelectedLocalBranch.Name}}"
"#,
        repo.clone(),
        runner.clone(),
    );
    let (tx, mut rx) = channel();

    app.panels.branches = PanelState::with_items(vec![branch("main", true), branch("dev", false)]);
    app.focused = ViewName::Branches;

    press(&mut app, Key::Rune('X'), &tx);
    assert_eq!(app.loader.current(), Some("Running custom command..."));
    pump_until(&mut app, &tx, &mut rx, is_mutation_done).await;

    assert_eq!(runner.commands(), vec!["echo main".to_string()]);
    assert!(!app.loader.is_active());
    assert!(app.popup.is_none());
}

#[tokio::test]
async fn test_command_on_builtin_key_runs_instead_of_builtin() {
    let repo = Arc::new(FakeRepo::new());
    let runner = Arc::new(RecordingRunner::default());
    // "P" is the default push key
    let mut app = app_with(
        r#"
[[custom_commands]]
key = "P"
context = "localBranches"
command = "git push origin {{.SelectedLocalBranch.Name}}"
"#,
        repo.clone(),
        runner.clone(),
    );
    let (tx, mut rx) = channel();

    app.panels.branches = PanelState::with_items(vec![branch("main", true)]);
    app.focused = ViewName::Branches;

    press(&mut app, Key::Rune('P'), &tx);
    pump_until(&mut app, &tx, &mut rx, is_mutation_done).await;

    assert_eq!(runner.commands(), vec!["git push origin main".to_string()]);
    assert!(repo.pushes().is_empty());
}

#[tokio::test]
async fn test_command_outside_its_context_is_inert() {
    let repo = Arc::new(FakeRepo::new());
    let runner = Arc::new(RecordingRunner::default());
    let mut app = app_with(
        r#"
[[custom_commands]]
key = "X"
context = "localBranches"
command = "echo {{.SelectedLocalBranch.Name}}"
"#,
        repo,
        runner.clone(),
    );
    let (tx, _rx) = channel();

    app.focused = ViewName::Files;
    press(&mut app, Key::Rune('X'), &tx);

    assert!(!app.loader.is_active());
    assert!(runner.commands().is_empty());
}

#[tokio::test]
async fn test_subprocess_command_hands_over_terminal() {
    let repo = Arc::new(FakeRepo::new());
    let runner = Arc::new(RecordingRunner::default());
    let mut app = app_with(
        r#"
[[custom_commands]]
key = "V"
context = "global"
command = "vim"
subprocess = true
"#,
        repo,
        runner.clone(),
    );
    let (tx, _rx) = channel();

    press(&mut app, Key::Rune('V'), &tx);

    assert_eq!(app.pending_subprocess.as_deref(), Some("vim"));
    assert!(runner.commands().is_empty());
}

#[tokio::test]
async fn test_nil_selection_reports_error() {
    let repo = Arc::new(FakeRepo::new());
    let runner = Arc::new(RecordingRunner::default());
    let mut app = app_with(
        r#"
[[custom_commands]]
key = "T"
context = "global"
command = "git tag -d {{.SelectedTag.Name}}"
"#,
        repo,
        runner.clone(),
    );
    let (tx, _rx) = channel();

    press(&mut app, Key::Rune('T'), &tx);

    assert!(matches!(app.popup, Some(Popup::Error { .. })));
    assert!(app.chain.is_none());
    assert!(runner.commands().is_empty());

    // With a tag selected the same command resolves
    app.popup = None;
    app.panels.tags = PanelState::with_items(vec![Tag {
        name: "v1.0".to_string(),
    }]);
    press(&mut app, Key::Rune('T'), &tx);
    assert!(app.popup.is_none());
    assert!(app.loader.is_active());
}

// ============================================================================
// Prompt Chains
// ============================================================================

#[tokio::test]
async fn test_menu_option_without_name_shows_value() {
    let repo = Arc::new(FakeRepo::new());
    let runner = Arc::new(RecordingRunner::default());
    let mut app = app_with(
        r#"
[[custom_commands]]
key = "F"
context = "global"
command = "git fetch {{index .PromptResponses 0}}"
[[custom_commands.prompts]]
type = "menu"
title = "Remote"
options = [{ value = "origin" }, { name = "Upstream", value = "upstream" }]
"#,
        repo,
        runner.clone(),
    );
    let (tx, mut rx) = channel();

    press(&mut app, Key::Rune('F'), &tx);
    let Some(Popup::Menu { title, items, .. }) = &app.popup else {
        panic!("expected a menu, got {:?}", app.popup);
    };
    assert_eq!(title, "Remote");
    let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, vec!["origin", "Upstream"]);

    press(&mut app, ENTER, &tx);
    pump_until(&mut app, &tx, &mut rx, is_mutation_done).await;

    assert_eq!(runner.commands(), vec!["git fetch origin".to_string()]);
}

#[tokio::test]
async fn test_menu_selection_moves_with_list_keys() {
    let repo = Arc::new(FakeRepo::new());
    let runner = Arc::new(RecordingRunner::default());
    let mut app = app_with(
        r#"
[[custom_commands]]
key = "F"
context = "global"
command = "git fetch {{index .PromptResponses 0}}"
[[custom_commands.prompts]]
type = "menu"
title = "Remote"
options = [{ value = "origin" }, { name = "Upstream", value = "upstream" }]
"#,
        repo,
        runner.clone(),
    );
    let (tx, mut rx) = channel();

    press(&mut app, Key::Rune('F'), &tx);
    press(&mut app, Key::Rune('j'), &tx);
    press(&mut app, ENTER, &tx);
    pump_until(&mut app, &tx, &mut rx, is_mutation_done).await;

    assert_eq!(runner.commands(), vec!["git fetch upstream".to_string()]);
}

#[tokio::test]
async fn test_later_prompt_sees_earlier_answer() {
    let repo = Arc::new(FakeRepo::new());
    let runner = Arc::new(RecordingRunner::default());
    let mut app = app_with(
        r#"
[[custom_commands]]
key = "N"
context = "global"
command = "git checkout -b {{index .PromptResponses 1}}"
loading_text = "Creating branch"

[[custom_commands.prompts]]
type = "input"
title = "Topic"

[[custom_commands.prompts]]
type = "input"
title = "Branch for {{index .PromptResponses 0}}"
initial_value = "{{index .PromptResponses 0}}-fix"
"#,
        repo,
        runner.clone(),
    );
    let (tx, mut rx) = channel();

    press(&mut app, Key::Rune('N'), &tx);
    // Letters bound elsewhere go into the prompt
    type_text(&mut app, "quick", &tx);
    press(&mut app, ENTER, &tx);

    let Some(Popup::Prompt { title, input, .. }) = &app.popup else {
        panic!("expected a second prompt, got {:?}", app.popup);
    };
    assert_eq!(title, "Branch for quick");
    assert_eq!(input, "quick-fix");

    press(&mut app, ENTER, &tx);
    assert_eq!(app.loader.current(), Some("Creating branch"));
    pump_until(&mut app, &tx, &mut rx, is_mutation_done).await;

    assert_eq!(runner.commands(), vec!["git checkout -b quick-fix".to_string()]);
}

#[tokio::test]
async fn test_background_failure_keeps_earlier_answers() {
    let repo = Arc::new(FakeRepo::new());
    let runner = Arc::new(RecordingRunner::default());
    let mut app = app_with(
        r#"
[[custom_commands]]
key = "N"
context = "global"
command = "git checkout -b {{index .PromptResponses 1}}"

[[custom_commands.prompts]]
type = "input"
title = "Topic"

[[custom_commands.prompts]]
type = "input"
title = "Branch"
initial_value = "{{index .PromptResponses 0}}-fix"
"#,
        repo.clone(),
        runner.clone(),
    );
    let (tx, mut rx) = channel();

    app.panels.branches = PanelState::with_items(vec![branch("main", true)]);
    repo.script_push(Err(GitError::Failed("network unreachable".to_string())));

    press(&mut app, Key::Rune('P'), &tx);
    press(&mut app, Key::Rune('N'), &tx);
    type_text(&mut app, "quick", &tx);
    press(&mut app, ENTER, &tx);
    pump_until(&mut app, &tx, &mut rx, |e| matches!(e, AppEvent::PushDone { .. })).await;

    let Some(Popup::Prompt { input, .. }) = &app.popup else {
        panic!("expected the second prompt, got {:?}", app.popup);
    };
    assert_eq!(input, "quick-fix");
    assert_eq!(app.chain.as_ref().map(|run| run.responses().len()), Some(1));

    // The push error shows once the command is on its way
    press(&mut app, ENTER, &tx);
    let Some(Popup::Error { message }) = &app.popup else {
        panic!("expected the push error, got {:?}", app.popup);
    };
    assert!(message.contains("network unreachable"));

    pump_until(&mut app, &tx, &mut rx, is_mutation_done).await;
    assert_eq!(runner.commands(), vec!["git checkout -b quick-fix".to_string()]);
}

#[tokio::test]
async fn test_escape_abandons_chain() {
    let repo = Arc::new(FakeRepo::new());
    let runner = Arc::new(RecordingRunner::default());
    let mut app = app_with(
        r#"
[[custom_commands]]
key = "N"
context = "global"
command = "git checkout -b {{index .PromptResponses 0}}"
[[custom_commands.prompts]]
type = "input"
title = "Branch"
"#,
        repo,
        runner.clone(),
    );
    let (tx, _rx) = channel();

    press(&mut app, Key::Rune('N'), &tx);
    type_text(&mut app, "wip", &tx);
    press(&mut app, ESC, &tx);

    assert!(app.popup.is_none());
    assert!(app.chain.is_none());
    assert!(!app.loader.is_active());
    assert!(runner.commands().is_empty());
}

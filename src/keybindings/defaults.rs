//! Default key names and the built-in binding list.
use super::{Action, Binding, KeyConfig};
use crate::context::{ContextKey, ViewName};
use crate::error::StartupError;
use crate::keys::{Key, Modifier, SpecialKey};

/// Logical key name → default key string.
pub const DEFAULT_KEYS: &[(&str, &str)] = &[
    ("universal.quit", "q"),
    ("universal.quit-alt1", "<c-c>"),
    ("universal.return", "<esc>"),
    ("universal.confirm", "<enter>"),
    ("universal.prevItem", "<up>"),
    ("universal.nextItem", "<down>"),
    ("universal.prevItem-alt", "k"),
    ("universal.nextItem-alt", "j"),
    ("universal.prevPage", ","),
    ("universal.nextPage", "."),
    ("universal.gotoTop", "<"),
    ("universal.gotoBottom", ">"),
    ("universal.prevBlock", "<left>"),
    ("universal.nextBlock", "<right>"),
    ("universal.prevBlock-alt", "h"),
    ("universal.nextBlock-alt", "l"),
    ("universal.jumpToBlock.1", "1"),
    ("universal.jumpToBlock.2", "2"),
    ("universal.jumpToBlock.3", "3"),
    ("universal.jumpToBlock.4", "4"),
    ("universal.jumpToBlock.5", "5"),
    ("universal.prevTab", "["),
    ("universal.nextTab", "]"),
    ("universal.scrollUpMain", "<pgup>"),
    ("universal.scrollDownMain", "<pgdown>"),
    ("universal.scrollUpMain-alt1", "K"),
    ("universal.scrollDownMain-alt1", "J"),
    ("universal.pushFiles", "P"),
    ("universal.pullFiles", "p"),
    ("universal.refresh", "R"),
    ("universal.optionMenu", "x"),
    ("universal.optionMenu-alt1", "?"),
    ("universal.executeShellCommand", ":"),
    ("universal.select", "<space>"),
    ("universal.goInto", "<enter>"),
    ("universal.openFile", "o"),
    ("status.openConfig", "o"),
    ("files.refreshFiles", "r"),
    ("files.toggleStagedAll", "a"),
    ("files.fetch", "f"),
    ("branches.fetchRemote", "f"),
];

/// Panels reached by the numeric jump keys, in key order.
const JUMP_TARGETS: [ViewName; 5] = ViewName::SIDE_WINDOWS;

/// Contexts whose view shows a selectable list.
const LIST_CONTEXTS: [ContextKey; 11] = [
    ContextKey::Files,
    ContextKey::LocalBranches,
    ContextKey::Remotes,
    ContextKey::RemoteBranches,
    ContextKey::Tags,
    ContextKey::BranchCommits,
    ContextKey::ReflogCommits,
    ContextKey::SubCommits,
    ContextKey::CommitFiles,
    ContextKey::Stash,
    ContextKey::Menu,
];

/// Contexts a return from the main view goes back from.
const MAIN_CONTEXTS: [ContextKey; 4] = [
    ContextKey::MainNormal,
    ContextKey::MainStaging,
    ContextKey::MainMerging,
    ContextKey::MainPatchBuilding,
];

fn bind(
    keys: &KeyConfig,
    view: Option<ViewName>,
    contexts: &[ContextKey],
    name: &str,
    action: Action,
) -> Result<Binding, StartupError> {
    Ok(Binding {
        view,
        contexts: contexts.to_vec(),
        key: keys.startup_key(name)?,
        modifier: Modifier::None,
        action,
        description: action.describe().to_string(),
        alternative: None,
    })
}

/// Same as [`bind`] but hidden from the help menu.
fn bind_hidden(
    keys: &KeyConfig,
    view: Option<ViewName>,
    contexts: &[ContextKey],
    name: &str,
    action: Action,
) -> Result<Binding, StartupError> {
    let mut binding = bind(keys, view, contexts, name, action)?;
    binding.description.clear();
    Ok(binding)
}

// ============================================================================
// Built-ins
// ============================================================================

/// The fixed built-in list. Popup views come first so that `<enter>` in a
/// menu confirms instead of drilling into the panel behind it.
pub(super) fn builtin(keys: &KeyConfig) -> Result<Vec<Binding>, StartupError> {
    use Action::*;
    let menu = Some(ViewName::Menu);
    let confirmation = Some(ViewName::Confirmation);
    let prompt = Some(ViewName::Prompt);
    let files = Some(ViewName::Files);
    let branches = Some(ViewName::Branches);
    let commits = Some(ViewName::Commits);
    let status = Some(ViewName::Status);
    let main = Some(ViewName::Main);

    let mut out = vec![
        // Popups
        bind(keys, menu, &[], "universal.confirm", Confirm)?,
        bind(keys, menu, &[], "universal.return", Return)?,
        bind(keys, confirmation, &[], "universal.confirm", Confirm)?,
        bind(keys, confirmation, &[], "universal.return", Return)?,
        bind(keys, prompt, &[], "universal.confirm", Confirm)?,
        bind(keys, prompt, &[], "universal.return", Return)?,
        // Global
        bind(keys, None, &[], "universal.quit", Quit)?,
        bind_hidden(keys, None, &[], "universal.quit-alt1", Quit)?,
        bind(keys, None, &[], "universal.return", Return)?,
        bind(keys, None, &[], "universal.pushFiles", Push)?,
        bind(keys, None, &[], "universal.pullFiles", Pull)?,
        bind(keys, None, &[], "universal.refresh", Refresh)?,
        bind(keys, None, &[], "universal.optionMenu", OptionMenu)?,
        bind_hidden(keys, None, &[], "universal.optionMenu-alt1", OptionMenu)?,
        bind(keys, None, &[], "universal.executeShellCommand", ExecuteShellCommand)?,
        bind(keys, None, &[], "universal.scrollUpMain", ScrollUpMain)?,
        bind(keys, None, &[], "universal.scrollDownMain", ScrollDownMain)?,
        bind_hidden(keys, None, &[], "universal.scrollUpMain-alt1", ScrollUpMain)?,
        bind_hidden(keys, None, &[], "universal.scrollDownMain-alt1", ScrollDownMain)?,
        // Status
        bind(keys, status, &[ContextKey::Status], "status.openConfig", OpenConfig)?,
        // Files
        bind(keys, files, &[ContextKey::Files], "universal.select", ToggleStaged)?,
        bind(keys, files, &[ContextKey::Files], "files.toggleStagedAll", ToggleStagedAll)?,
        bind(keys, files, &[ContextKey::Files], "files.refreshFiles", RefreshFiles)?,
        bind(keys, files, &[ContextKey::Files], "files.fetch", Fetch)?,
        bind(keys, files, &[ContextKey::Files], "universal.openFile", OpenFile)?,
        bind(keys, files, &[ContextKey::Files], "universal.goInto", GoInto)?,
        // Branches
        bind(keys, branches, &[ContextKey::LocalBranches], "universal.select", Checkout)?,
        bind(
            keys,
            branches,
            &[ContextKey::LocalBranches, ContextKey::Remotes],
            "branches.fetchRemote",
            Fetch,
        )?,
        bind(
            keys,
            branches,
            &[ContextKey::LocalBranches, ContextKey::Remotes, ContextKey::RemoteBranches],
            "universal.goInto",
            GoInto,
        )?,
        bind(keys, branches, &[ContextKey::Tags], "universal.select", Checkout)?,
        bind(keys, branches, &[ContextKey::RemoteBranches], "universal.select", Checkout)?,
        // Commits
        bind(
            keys,
            commits,
            &[ContextKey::BranchCommits, ContextKey::ReflogCommits],
            "universal.select",
            Checkout,
        )?,
        bind(
            keys,
            commits,
            &[ContextKey::BranchCommits, ContextKey::ReflogCommits],
            "universal.goInto",
            GoInto,
        )?,
        bind(keys, commits, &[ContextKey::CommitFiles], "universal.openFile", OpenFile)?,
        bind(keys, branches, &[ContextKey::SubCommits], "universal.goInto", GoInto)?,
        // Main
        bind(keys, main, &MAIN_CONTEXTS, "universal.prevItem", ScrollUpMain)?,
        bind(keys, main, &MAIN_CONTEXTS, "universal.nextItem", ScrollDownMain)?,
        bind_hidden(keys, main, &MAIN_CONTEXTS, "universal.prevItem-alt", ScrollUpMain)?,
        bind_hidden(keys, main, &MAIN_CONTEXTS, "universal.nextItem-alt", ScrollDownMain)?,
    ];

    for view in [branches, commits] {
        out.push(bind(keys, view, &[], "universal.nextTab", NextTab)?);
        out.push(bind(keys, view, &[], "universal.prevTab", PrevTab)?);
    }

    Ok(out)
}

// ============================================================================
// Generated Navigation
// ============================================================================

/// Side-window cycling, numeric jumps and per-context list navigation.
pub(super) fn navigation(keys: &KeyConfig) -> Result<Vec<Binding>, StartupError> {
    use Action::*;
    let mut out = Vec::new();

    for view in ViewName::SIDE_WINDOWS {
        let v = Some(view);
        out.push(bind(keys, v, &[], "universal.prevBlock", PrevBlock)?);
        out.push(bind(keys, v, &[], "universal.nextBlock", NextBlock)?);
        out.push(bind_hidden(keys, v, &[], "universal.prevBlock-alt", PrevBlock)?);
        out.push(bind_hidden(keys, v, &[], "universal.nextBlock-alt", NextBlock)?);
    }

    for (i, target) in JUMP_TARGETS.into_iter().enumerate() {
        let name = format!("universal.jumpToBlock.{}", i + 1);
        let mut binding = bind(keys, None, &[], &name, JumpToBlock(target))?;
        binding.alternative = Some(target.as_str());
        // Popups capture digits, so jumps only apply from side windows
        for view in ViewName::SIDE_WINDOWS {
            let mut scoped = binding.clone();
            scoped.view = Some(view);
            out.push(scoped);
        }
    }

    for ctx in LIST_CONTEXTS {
        let v = Some(ctx.view());
        let c = [ctx];
        out.push(bind(keys, v, &c, "universal.prevItem", PrevItem)?);
        out.push(bind(keys, v, &c, "universal.nextItem", NextItem)?);
        out.push(bind_hidden(keys, v, &c, "universal.prevItem-alt", PrevItem)?);
        out.push(bind_hidden(keys, v, &c, "universal.nextItem-alt", NextItem)?);
        out.push(bind(keys, v, &c, "universal.prevPage", PrevPage)?);
        out.push(bind(keys, v, &c, "universal.nextPage", NextPage)?);
        out.push(bind(keys, v, &c, "universal.gotoTop", GotoTop)?);
        out.push(bind(keys, v, &c, "universal.gotoBottom", GotoBottom)?);

        let mut click = bind(keys, v, &c, "universal.prevItem", ClickItem)?;
        click.key = Key::Special(SpecialKey::MouseLeft);
        click.description.clear();

        let mut wheel_up = click.clone();
        wheel_up.key = Key::Special(SpecialKey::MouseWheelUp);
        wheel_up.action = PrevItem;

        let mut wheel_down = click.clone();
        wheel_down.key = Key::Special(SpecialKey::MouseWheelDown);
        wheel_down.action = NextItem;

        out.push(click);
        out.push(wheel_up);
        out.push(wheel_down);
    }

    // Main view scrolls with the wheel; clicking it focuses it
    let main = Some(ViewName::Main);
    for (key, action) in [
        (SpecialKey::MouseWheelUp, ScrollUpMain),
        (SpecialKey::MouseWheelDown, ScrollDownMain),
        (SpecialKey::MouseLeft, ClickItem),
    ] {
        out.push(Binding {
            view: main,
            contexts: Vec::new(),
            key: Key::Special(key),
            modifier: Modifier::None,
            action,
            description: String::new(),
            alternative: None,
        });
    }

    // Clicks on panels with no list (status) still focus them
    out.push(Binding {
        view: None,
        contexts: Vec::new(),
        key: Key::Special(SpecialKey::MouseLeft),
        modifier: Modifier::None,
        action: ClickItem,
        description: String::new(),
        alternative: None,
    });

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names_unique() {
        let mut names: Vec<&str> = DEFAULT_KEYS.iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len());
    }

    #[test]
    fn test_navigation_covers_every_list_context() {
        let nav = navigation(&KeyConfig::default()).unwrap();
        for ctx in LIST_CONTEXTS {
            assert!(nav
                .iter()
                .any(|b| b.contexts == [ctx] && b.action == Action::GotoBottom));
        }
    }

    #[test]
    fn test_side_windows_get_block_cycling() {
        let nav = navigation(&KeyConfig::default()).unwrap();
        for view in ViewName::SIDE_WINDOWS {
            let count = nav
                .iter()
                .filter(|b| b.view == Some(view) && b.action == Action::NextBlock)
                .count();
            assert_eq!(count, 2, "{}", view);
        }
    }

    #[test]
    fn test_list_contexts_get_mouse_bindings() {
        let mouse_keys = [
            Key::Special(SpecialKey::MouseLeft),
            Key::Special(SpecialKey::MouseWheelUp),
            Key::Special(SpecialKey::MouseWheelDown),
        ];
        let nav = navigation(&KeyConfig::default()).unwrap();
        for ctx in LIST_CONTEXTS {
            let mouse: Vec<(Key, Action)> = nav
                .iter()
                .filter(|b| b.contexts == [ctx] && mouse_keys.contains(&b.key))
                .map(|b| (b.key, b.action))
                .collect();
            assert_eq!(
                mouse,
                vec![
                    (Key::Special(SpecialKey::MouseLeft), Action::ClickItem),
                    (Key::Special(SpecialKey::MouseWheelUp), Action::PrevItem),
                    (Key::Special(SpecialKey::MouseWheelDown), Action::NextItem),
                ],
                "{}",
                ctx
            );
        }
    }
}

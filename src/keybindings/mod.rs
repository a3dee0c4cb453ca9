//! Binding table and dispatcher.
//!
//! The table is an ordered list of bindings built once at startup: custom
//! commands first, then the built-in list, then the generated navigation
//! bindings. Dispatch scans it in order and returns the first binding whose
//! view, context and key all match, so an earlier binding can never be
//! shadowed by a later one.
//!
//! Keys are referred to by logical names (`universal.pushFiles`) which map to
//! key strings through [`KeyConfig`]. Every logical name has a default that
//! config can override.

mod defaults;

use crate::context::{ContextKey, ViewName};
use crate::custom_commands::{
    self, CommandScope, CustomCommand, CustomCommandError, PromptChain,
};
use crate::error::StartupError;
use crate::keys::{self, Key, KeyError, Modifier};
use std::collections::BTreeMap;
use std::sync::Arc;

pub use defaults::DEFAULT_KEYS;

// ============================================================================
// Actions
// ============================================================================

/// Everything a binding can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    /// Close the popup, pop the context stack, or leave the main view.
    Return,
    /// Accept the open popup (menu item, confirmation, prompt text).
    Confirm,
    PrevItem,
    NextItem,
    PrevPage,
    NextPage,
    GotoTop,
    GotoBottom,
    /// Focus the row under the mouse.
    ClickItem,
    PrevBlock,
    NextBlock,
    JumpToBlock(ViewName),
    PrevTab,
    NextTab,
    ScrollUpMain,
    ScrollDownMain,
    Push,
    Pull,
    Fetch,
    Refresh,
    RefreshFiles,
    OptionMenu,
    ExecuteShellCommand,
    GoInto,
    ToggleStaged,
    ToggleStagedAll,
    Checkout,
    OpenFile,
    OpenConfig,
    CustomCommand(usize),
}

impl Action {
    /// Human-readable description for the help menu.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit",
            Self::Return => "Cancel / go back",
            Self::Confirm => "Confirm",
            Self::PrevItem => "Previous item",
            Self::NextItem => "Next item",
            Self::PrevPage => "Previous page",
            Self::NextPage => "Next page",
            Self::GotoTop => "Scroll to top",
            Self::GotoBottom => "Scroll to bottom",
            Self::ClickItem => "Select item",
            Self::PrevBlock => "Previous panel",
            Self::NextBlock => "Next panel",
            Self::JumpToBlock(_) => "Jump to panel",
            Self::PrevTab => "Previous tab",
            Self::NextTab => "Next tab",
            Self::ScrollUpMain => "Scroll up main panel",
            Self::ScrollDownMain => "Scroll down main panel",
            Self::Push => "Push",
            Self::Pull => "Pull",
            Self::Fetch => "Fetch",
            Self::Refresh => "Refresh",
            Self::RefreshFiles => "Refresh files",
            Self::OptionMenu => "Open keybindings menu",
            Self::ExecuteShellCommand => "Execute shell command",
            Self::GoInto => "Go into",
            Self::ToggleStaged => "Toggle staged",
            Self::ToggleStagedAll => "Stage/unstage all",
            Self::Checkout => "Checkout",
            Self::OpenFile => "Open file",
            Self::OpenConfig => "Open config file",
            Self::CustomCommand(_) => "Custom command",
        }
    }

    /// Whether a global binding for this action still fires while a popup is
    /// open. Everything else is absorbed so that, for example, `P` in a menu
    /// does not start a push.
    pub fn runs_over_popups(self) -> bool {
        matches!(
            self,
            Self::Return | Self::Confirm | Self::ScrollUpMain | Self::ScrollDownMain
        )
    }
}

// ============================================================================
// Bindings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// `None` binds in every view.
    pub view: Option<ViewName>,
    /// Empty binds in every context of the view.
    pub contexts: Vec<ContextKey>,
    pub key: Key,
    pub modifier: Modifier,
    pub action: Action,
    /// Empty descriptions are left out of the help menu.
    pub description: String,
    /// Extra key hint shown next to the key in the help menu.
    pub alternative: Option<&'static str>,
}

impl Binding {
    pub fn matches(&self, view: ViewName, ctx: ContextKey, key: Key, modifier: Modifier) -> bool {
        self.key == key
            && self.modifier == modifier
            && self.view.map_or(true, |v| v == view)
            && (self.contexts.is_empty() || self.contexts.contains(&ctx))
    }

    fn applies_to(&self, view: ViewName, ctx: ContextKey) -> bool {
        self.view.map_or(true, |v| v == view)
            && (self.contexts.is_empty() || self.contexts.contains(&ctx))
    }
}

// ============================================================================
// Key Config
// ============================================================================

/// Logical key names resolved against defaults and user overrides.
#[derive(Debug, Clone)]
pub struct KeyConfig {
    names: BTreeMap<String, String>,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            names: DEFAULT_KEYS
                .iter()
                .map(|(name, key)| (name.to_string(), key.to_string()))
                .collect(),
        }
    }
}

impl KeyConfig {
    /// Merge `overrides` over the defaults. Overrides for names with no
    /// default are kept (custom commands may refer to them) and reported as
    /// warnings.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> (Self, Vec<String>) {
        let mut config = Self::default();
        let mut warnings = Vec::new();
        for (name, key) in overrides {
            if !config.names.contains_key(name) {
                warnings.push(format!("Unknown keybinding '{}'", name));
            }
            config.names.insert(name.clone(), key.clone());
        }
        (config, warnings)
    }

    /// Key for a logical name. A name with no entry is taken as a literal key
    /// string, so custom commands can write `key = "C"`.
    pub fn key(&self, name: &str) -> Result<Key, KeyError> {
        let raw = self.names.get(name).map_or(name, String::as_str);
        keys::encode(raw)
    }

    pub(crate) fn startup_key(&self, name: &str) -> Result<Key, StartupError> {
        self.key(name).map_err(|source| StartupError::Key {
            name: name.to_string(),
            source,
        })
    }

    /// Display label for a logical name, for hints in popups.
    pub fn label(&self, name: &str) -> String {
        self.key(name).map(keys::decode).unwrap_or_default()
    }
}

// ============================================================================
// Binding Table
// ============================================================================

/// A custom command ready to run.
#[derive(Debug)]
pub struct CompiledCustomCommand {
    pub chain: Arc<PromptChain>,
    pub description: String,
}

#[derive(Debug, Default)]
pub struct BindingTable {
    bindings: Vec<Binding>,
    custom_commands: Vec<CompiledCustomCommand>,
}

impl BindingTable {
    /// Build the table. Any bad key name or malformed custom command is fatal.
    pub fn build(keys: &KeyConfig, commands: &[CustomCommand]) -> Result<Self, StartupError> {
        let mut table = Self::default();

        for (index, cmd) in commands.iter().enumerate() {
            let (view, contexts) = match custom_commands::parse_scope(cmd)? {
                CommandScope::Global => (None, Vec::new()),
                CommandScope::Context(ctx) => (Some(ctx.view()), vec![ctx]),
            };
            let key = keys
                .key(&cmd.key)
                .map_err(|source| CustomCommandError::InvalidKey {
                    command: cmd.command.clone(),
                    key: cmd.key.clone(),
                    source,
                })?;
            let chain = custom_commands::compile_chain(cmd)?;
            let description = cmd.display_description().to_string();

            table.bindings.push(Binding {
                view,
                contexts,
                key,
                modifier: Modifier::None,
                action: Action::CustomCommand(index),
                description: description.clone(),
                alternative: None,
            });
            table.custom_commands.push(CompiledCustomCommand {
                chain: Arc::new(chain),
                description,
            });
        }

        table.bindings.extend(defaults::builtin(keys)?);
        table.bindings.extend(defaults::navigation(keys)?);

        tracing::info!(
            bindings = table.bindings.len(),
            custom_commands = table.custom_commands.len(),
            "Built binding table"
        );
        Ok(table)
    }

    /// First binding matching the focused view, its current context and the key.
    pub fn resolve(
        &self,
        view: ViewName,
        ctx: ContextKey,
        key: Key,
        modifier: Modifier,
    ) -> Option<&Binding> {
        self.bindings
            .iter()
            .find(|b| b.matches(view, ctx, key, modifier))
    }

    /// Bindings shown in the help menu for this view and context: those with
    /// a description that would actually be reached by dispatch.
    pub fn eligible(&self, view: ViewName, ctx: ContextKey) -> Vec<&Binding> {
        self.bindings
            .iter()
            .filter(|b| !b.description.is_empty() && b.applies_to(view, ctx))
            .filter(|b| {
                self.resolve(view, ctx, b.key, b.modifier)
                    .is_some_and(|winner| std::ptr::eq(winner, *b))
            })
            .collect()
    }

    pub fn custom_command(&self, index: usize) -> Option<&CompiledCustomCommand> {
        self.custom_commands.get(index)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }
}

// ============================================================================
// Tests
// ============================================================================

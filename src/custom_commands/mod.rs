//! User-defined commands.
//!
//! A custom command binds a key in one context (or globally) to a shell
//! command template, optionally preceded by a series of prompts whose answers
//! the template can reference. Commands are validated and compiled into
//! [`PromptChain`]s once at startup; any malformed entry aborts startup.

mod chain;
pub mod template;

pub use chain::{
    ChainRun, ChainStep, PromptChain, PromptStep, ResolvedCommand, ResolvedOption,
    DEFAULT_LOADING_TEXT,
};
pub use template::{TemplateContext, TemplateError};

use crate::context::ContextKey;
use crate::keys::KeyError;
use serde::Deserialize;
use thiserror::Error;

/// The context name that makes a custom command global.
pub const GLOBAL_CONTEXT: &str = "global";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustomCommandError {
    #[error("custom command '{command}' has no context (use context: 'global' to bind it everywhere)")]
    MissingContext { command: String },

    #[error("custom command '{command}' has unknown context '{context}'; permitted contexts: global, {permitted}")]
    UnknownContext {
        command: String,
        context: String,
        permitted: String,
    },

    #[error("custom command '{command}' prompt {index} has type '{kind}'; a prompt must have a type of 'input' or 'menu'")]
    InvalidPromptType {
        command: String,
        index: usize,
        kind: String,
    },

    #[error("custom command '{command}' has invalid key '{key}': {source}")]
    InvalidKey {
        command: String,
        key: String,
        #[source]
        source: KeyError,
    },
}

// ============================================================================
// Config Shapes
// ============================================================================

/// A custom command as written in config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CustomCommand {
    pub key: String,
    pub context: String,
    pub command: String,
    pub subprocess: bool,
    pub prompts: Vec<PromptSpec>,
    #[serde(alias = "loadingText")]
    pub loading_text: String,
    pub description: String,
}

impl CustomCommand {
    /// Help-menu text. Falls back to the command itself.
    pub fn display_description(&self) -> &str {
        if self.description.is_empty() {
            &self.command
        } else {
            &self.description
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PromptSpec {
    /// `"input"` or `"menu"`. Kept as a string so a bad value can be reported
    /// with the command it belongs to.
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(alias = "initialValue")]
    pub initial_value: String,
    pub options: Vec<MenuOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MenuOption {
    pub name: String,
    pub description: String,
    pub value: String,
}

// ============================================================================
// Validation
// ============================================================================

/// Where a custom command's binding applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandScope {
    Global,
    Context(ContextKey),
}

/// Validate the command's context name.
pub fn parse_scope(cmd: &CustomCommand) -> Result<CommandScope, CustomCommandError> {
    match cmd.context.as_str() {
        "" => Err(CustomCommandError::MissingContext {
            command: cmd.command.clone(),
        }),
        GLOBAL_CONTEXT => Ok(CommandScope::Global),
        name => ContextKey::from_name(name)
            .map(CommandScope::Context)
            .ok_or_else(|| CustomCommandError::UnknownContext {
                command: cmd.command.clone(),
                context: name.to_string(),
                permitted: ContextKey::permitted_names(),
            }),
    }
}

/// Validate prompt types and link the prompts into a chain.
pub fn compile_chain(cmd: &CustomCommand) -> Result<PromptChain, CustomCommandError> {
    let steps = cmd
        .prompts
        .iter()
        .enumerate()
        .map(|(index, prompt)| match prompt.kind.as_str() {
            "input" => Ok(PromptStep::Input {
                title: prompt.title.clone(),
                initial_value: prompt.initial_value.clone(),
            }),
            "menu" => Ok(PromptStep::Menu {
                title: prompt.title.clone(),
                options: prompt.options.clone(),
            }),
            other => Err(CustomCommandError::InvalidPromptType {
                command: cmd.command.clone(),
                index,
                kind: other.to_string(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PromptChain::link(
        steps,
        cmd.command.clone(),
        cmd.subprocess,
        cmd.loading_text.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(context: &str) -> CustomCommand {
        CustomCommand {
            key: "X".into(),
            context: context.into(),
            command: "echo hi".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_scope_global() {
        assert_eq!(parse_scope(&command("global")), Ok(CommandScope::Global));
    }

    #[test]
    fn test_scope_named_context() {
        assert_eq!(
            parse_scope(&command("localBranches")),
            Ok(CommandScope::Context(ContextKey::LocalBranches))
        );
    }

    #[test]
    fn test_scope_missing_is_error() {
        let err = parse_scope(&command("")).unwrap_err();
        assert!(matches!(err, CustomCommandError::MissingContext { .. }));
        assert!(err.to_string().contains("global"));
    }

    #[test]
    fn test_scope_unknown_lists_permitted() {
        let err = parse_scope(&command("branchez")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("branchez"));
        assert!(msg.contains("localBranches"));
        assert!(msg.contains("echo hi"));
    }

    #[test]
    fn test_invalid_prompt_type() {
        let mut cmd = command("files");
        cmd.prompts = vec![
            PromptSpec {
                kind: "input".into(),
                ..Default::default()
            },
            PromptSpec {
                kind: "checkbox".into(),
                ..Default::default()
            },
        ];
        assert_eq!(
            compile_chain(&cmd).unwrap_err(),
            CustomCommandError::InvalidPromptType {
                command: "echo hi".into(),
                index: 1,
                kind: "checkbox".into()
            }
        );
    }

    #[test]
    fn test_description_defaults_to_command() {
        let mut cmd = command("files");
        assert_eq!(cmd.display_description(), "echo hi");
        cmd.description = "Say hi".into();
        assert_eq!(cmd.display_description(), "Say hi");
    }

    #[test]
    fn test_deserialize_from_toml() {
        let cmd: CustomCommand = toml::from_str(
            r#"
            key = "C"
            context = "files"
            command = "git commit -m '{{index .PromptResponses 0}}'"
            loadingText = "Committing"

            [[prompts]]
            type = "input"
            title = "Message"
            initialValue = "wip"
            "#,
        )
        .unwrap();
        assert_eq!(cmd.loading_text, "Committing");
        assert_eq!(cmd.prompts[0].kind, "input");
        assert_eq!(cmd.prompts[0].initial_value, "wip");
        assert!(!cmd.subprocess);
    }
}

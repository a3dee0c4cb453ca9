//! Top-level error kinds.
//!
//! [`StartupError`] aborts the program before the terminal UI starts.
//! [`ActionError`] is what every key handler returns; the input layer shows it
//! in the error popup and the loop keeps running.
use crate::config::ConfigError;
use crate::custom_commands::{CustomCommandError, TemplateError};
use crate::git::GitError;
use crate::keys::KeyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid key for keybinding '{name}': {source}")]
    Key {
        name: String,
        #[source]
        source: KeyError,
    },

    #[error(transparent)]
    CustomCommand(#[from] CustomCommandError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The user typed something that cannot be used.
    #[error("{0}")]
    InvalidInput(String),

    /// Configuration forbids the operation.
    #[error("{0}")]
    Denied(&'static str),

    #[error("Failed to open {target}: {source}")]
    Open {
        target: String,
        #[source]
        source: std::io::Error,
    },
}

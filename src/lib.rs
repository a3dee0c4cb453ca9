//! gitdeck: a keyboard-driven terminal client for git.
//!
//! The library holds everything but process startup so integration tests can
//! drive the dispatcher, the panel store and custom commands against fake
//! repositories.

pub mod app;
pub mod config;
pub mod context;
pub mod custom_commands;
pub mod error;
pub mod git;
pub mod keybindings;
pub mod keys;
pub mod models;
pub mod panels;
pub mod remote;
pub mod ui;

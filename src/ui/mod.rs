//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Key and mouse dispatch through the binding table
//! - `events` - Background task event processing
//! - `render` - Side windows, main view, popups and status bar
//! - `helpers` - Background task spawning

mod events;
mod helpers;
mod input;
mod loop_runner;
mod render;

// Re-export the public API
pub use events::handle_app_event;
pub use helpers::refresh_panel;
pub use input::{dispatch, handle_key, handle_key_event, handle_mouse_event, LoopControl};
pub use loop_runner::run;

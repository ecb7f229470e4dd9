//! TUI pane rendering modules
//!
//! Each pane is a stateless render function; any scroll state it needs is
//! owned by [`crate::ui::App`] and passed in by mutable reference.
//!
//! # Pane Modules
//!
//! - [`toolbar`]: Save and Run actions plus the serial port selector
//! - [`editor`]: Script text with line-number gutter, current line highlight
//!   and Python syntax highlighting
//! - [`console`]: Output captured from the upload tool
//! - [`status`]: File state, cursor position, messages and the "Save as" prompt

pub mod console;
pub mod editor;
pub mod status;
pub mod toolbar;

// Re-export render functions for convenience
pub use console::render_console_pane;
pub use editor::{render_editor_pane, EditorScrollState};
pub use status::{render_save_prompt, render_status_bar, StatusRenderData};
pub use toolbar::render_toolbar;

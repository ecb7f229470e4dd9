//! # Introduction
//!
//! mpEdit is a small terminal editor for MicroPython scripts. It edits one
//! script, saves it, and hands it to an external upload tool (by default
//! [`ampy`](https://github.com/scientifichackers/ampy)) that runs it on a
//! board attached over a serial port.
//!
//! ## Pieces
//!
//! ```text
//! keys → App → TextBuffer ──save──→ ScriptFile → disk
//!               │                      │
//!               └──run── port ─→ UploadTool (subprocess, deadline) → Console
//! ```
//!
//! 1. [`buffer`]: the line-based text buffer and cursor.
//! 2. [`gutter`] and [`syntax`]: line-number gutter geometry and the Python
//!    highlighter used by the editor pane.
//! 3. [`script`]: where the buffer is saved, with the enforced extension.
//! 4. [`ports`]: serial port discovery per host platform.
//! 5. [`runner`]: the upload tool invocation with its timeout.
//! 6. [`console`]: output log of runs and errors.
//! 7. [`config`] and [`error`]: settings file and error type.
//! 8. [`ui`]: ratatui-based TUI; not part of the stable library API.
//!
//! The editor does not speak any serial protocol itself; everything that
//! reaches the board goes through the upload tool.

pub mod buffer;
pub mod config;
pub mod console;
pub mod error;
pub mod gutter;
pub mod logging;
pub mod ports;
pub mod runner;
pub mod script;
pub mod syntax;
pub mod ui;

//! Error types for the editor
//!
//! [`EditorError`] covers everything that can go wrong outside the text
//! buffer itself: file I/O, serial port discovery, the upload tool and the
//! configuration file. Only [`EditorError::UnsupportedPlatform`] is fatal;
//! the UI reports every other variant and keeps the session alive.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EditorError>;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Port enumeration has no naming convention for this OS
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("no file path set")]
    NoFilePath,

    #[error("no serial port selected")]
    NoPortSelected,

    /// The upload tool could not be started at all
    #[error("failed to start '{program}': {source}")]
    ToolSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },
}

//! The script file behind the editor buffer
//!
//! A [`ScriptFile`] remembers where the buffer is saved. The path is chosen
//! once (from the command line or the "Save as" prompt), gets the script
//! extension appended if it lacks one, and is then reused by every later
//! save.

use crate::error::{EditorError, Result};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Shown when the editor starts without a file
pub const STARTER_SCRIPT: &str = "\
from machine import Pin
import time

led = Pin(2, Pin.OUT)

while True:
    led.value(not led.value())
    time.sleep(0.5)
";

/// Append `.ext` to `path` unless it already ends with it
pub fn ensure_extension(path: &Path, ext: &str) -> PathBuf {
    let ext = ext.trim_start_matches('.');
    let suffix = format!(".{}", ext);
    if path.to_string_lossy().ends_with(&suffix) {
        return path.to_path_buf();
    }
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(&suffix);
    PathBuf::from(raw)
}

#[derive(Debug, Clone)]
pub struct ScriptFile {
    path: Option<PathBuf>,
    extension: String,
}

impl ScriptFile {
    pub fn new(extension: &str) -> Self {
        ScriptFile {
            path: None,
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Open `path`, returning its contents.
    ///
    /// A path that does not exist yet is remembered and yields empty text;
    /// the file is created on the first save.
    pub fn load(path: &Path, extension: &str) -> Result<(Self, String)> {
        let mut script = ScriptFile::new(extension);
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        script.path = Some(path.to_path_buf());
        Ok((script, text))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// File name for titles and the status bar
    pub fn display_name(&self) -> String {
        match &self.path {
            Some(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            None => "[untitled]".to_string(),
        }
    }

    /// Write `text` to the stored path.
    ///
    /// Fails with [`EditorError::NoFilePath`] before a path has been chosen.
    pub fn save(&mut self, text: &str) -> Result<PathBuf> {
        let path = self.path.as_ref().ok_or(EditorError::NoFilePath)?;
        let path = ensure_extension(path, &self.extension);
        fs::write(&path, text)?;
        info!(path = %path.display(), bytes = text.len(), "saved script");
        self.path = Some(path.clone());
        Ok(path)
    }

    /// Set the path (extension enforced) and write `text` to it
    pub fn save_as(&mut self, path: &Path, text: &str) -> Result<PathBuf> {
        self.path = Some(ensure_extension(path, &self.extension));
        self.save(text)
    }
}

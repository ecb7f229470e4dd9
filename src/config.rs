//! User configuration
//!
//! Settings are read from `<config_dir>/mpedit/config.json`. Every field has a
//! default, so a missing file (or a file with only some keys) is fine. A file
//! that exists but does not parse is reported as [`EditorError::Config`].

use crate::error::{EditorError, Result};
use crate::runner::UploadTool;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "mpedit";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upload tool executable
    pub tool: String,
    /// Argument template, `{port}` and `{script}` are substituted
    pub tool_args: Vec<String>,
    /// Deadline for one run of the upload tool
    pub timeout_ms: u64,
    /// Extension enforced on saved scripts, without the dot
    pub extension: String,
    /// Port to preselect when it shows up in the scan
    pub default_port: Option<String>,
    /// Spaces inserted for one indent level
    pub tab_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tool: "ampy".to_string(),
            tool_args: ["-p", "{port}", "run", "{script}"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeout_ms: 2000,
            extension: "py".to_string(),
            default_port: None,
            tab_width: 4,
        }
    }
}

impl Config {
    /// Default location of the config file, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from `path`, falling back to defaults when the file is absent
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| EditorError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load from the default location
    pub fn load_default() -> Result<Self> {
        match Config::default_path() {
            Some(path) => Config::load(&path),
            None => Ok(Config::default()),
        }
    }

    pub fn upload_tool(&self) -> UploadTool {
        UploadTool::new(
            self.tool.clone(),
            self.tool_args.clone(),
            Duration::from_millis(self.timeout_ms),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.timeout_ms, 2000);
        assert_eq!(config.tool, "ampy");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "timeout_ms": 5000, "default_port": "/dev/ttyUSB0" }"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.timeout_ms, 5000);
        assert_eq!(config.default_port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(config.extension, "py");
        assert_eq!(config.tab_width, 4);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        match Config::load(&path) {
            Err(EditorError::Config { path: p, .. }) => assert_eq!(p, path),
            other => panic!("Expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_upload_tool_uses_timeout() {
        let config = Config {
            timeout_ms: 750,
            ..Config::default()
        };
        assert_eq!(config.upload_tool().timeout(), Duration::from_millis(750));
    }
}

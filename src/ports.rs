//! Serial port discovery
//!
//! Candidates come from the host's device naming convention (`COMn` on
//! Windows, `/dev/tty*` globs on Linux and macOS). Each candidate is then
//! probed by opening and immediately closing it; anything that fails the probe
//! is dropped from the list without an error.

use crate::error::{EditorError, Result};
use std::time::Duration;
use tracing::debug;

/// Highest `COMn` index tried on Windows
const WINDOWS_COM_PORTS: usize = 256;
const LINUX_PATTERN: &str = "/dev/tty[A-Za-z]*";
const MACOS_PATTERN: &str = "/dev/tty.*";
const PROBE_BAUD: u32 = 115_200;
const PROBE_TIMEOUT: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
    MacOs,
}

impl Platform {
    /// Map an OS name as reported by `std::env::consts::OS`
    pub fn from_os(os: &str) -> Result<Self> {
        match os {
            "windows" => Ok(Platform::Windows),
            "linux" => Ok(Platform::Linux),
            "macos" => Ok(Platform::MacOs),
            other => Err(EditorError::UnsupportedPlatform(other.to_string())),
        }
    }

    pub fn current() -> Result<Self> {
        Platform::from_os(std::env::consts::OS)
    }
}

/// Decides whether a candidate port is usable right now
pub trait PortProbe {
    fn probe(&self, path: &str) -> bool;
}

/// Probe that opens the device with `serialport` and closes it again
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialProbe;

impl PortProbe for SerialProbe {
    fn probe(&self, path: &str) -> bool {
        match serialport::new(path, PROBE_BAUD).timeout(PROBE_TIMEOUT).open() {
            // Dropping the handle closes the port
            Ok(_port) => true,
            Err(e) => {
                debug!(port = path, error = %e, "port failed probe");
                false
            }
        }
    }
}

/// Device paths that may be serial ports on `platform`
pub fn candidates(platform: Platform) -> Vec<String> {
    match platform {
        Platform::Windows => (1..=WINDOWS_COM_PORTS)
            .map(|i| format!("COM{}", i))
            .collect(),
        Platform::Linux => glob_paths(LINUX_PATTERN),
        Platform::MacOs => glob_paths(MACOS_PATTERN),
    }
}

fn glob_paths(pattern: &str) -> Vec<String> {
    match glob::glob(pattern) {
        Ok(paths) => paths
            .filter_map(|entry| entry.ok())
            .map(|path| path.to_string_lossy().into_owned())
            .collect(),
        Err(e) => {
            debug!(pattern, error = %e, "bad port glob");
            Vec::new()
        }
    }
}

/// Keep only the candidates that pass `probe`, preserving order
pub fn filter_openable<P: PortProbe + ?Sized>(candidates: Vec<String>, probe: &P) -> Vec<String> {
    candidates
        .into_iter()
        .filter(|path| probe.probe(path))
        .collect()
}

pub fn available_ports<P: PortProbe + ?Sized>(platform: Platform, probe: &P) -> Vec<String> {
    filter_openable(candidates(platform), probe)
}

/// Scan the host for openable serial ports
pub fn scan() -> Result<Vec<String>> {
    let platform = Platform::current()?;
    let ports = available_ports(platform, &SerialProbe);
    debug!(count = ports.len(), "port scan finished");
    Ok(ports)
}

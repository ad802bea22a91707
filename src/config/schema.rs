//! Configuration schema definitions.

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the accept loop is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServeMode {
    /// Accept loop runs on a spawned task; the main flow waits for shutdown.
    #[default]
    Background,
    /// Accept loop runs on the calling task.
    Blocking,
}

impl ServeMode {
    /// Port tried first when none is given.
    pub fn default_port(self) -> u16 {
        match self {
            ServeMode::Background => 8000,
            ServeMode::Blocking => 8080,
        }
    }
}

/// Root configuration for the preview server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// First port to probe. Falls back to the mode's default port.
    pub requested_port: Option<u16>,

    /// Number of consecutive ports to probe.
    pub max_port_attempts: u16,

    /// Directory whose files are served.
    pub serving_root: PathBuf,

    /// Interface to listen on.
    pub bind_host: IpAddr,

    /// Upper bound on how long in-flight responses may drain at shutdown.
    pub drain_timeout_secs: u64,

    pub mode: ServeMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            requested_port: None,
            max_port_attempts: 10,
            serving_root: executable_dir(),
            bind_host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            drain_timeout_secs: 5,
            mode: ServeMode::default(),
        }
    }
}

impl ServerConfig {
    /// The port probing starts from.
    pub fn requested_port(&self) -> u16 {
        self.requested_port
            .unwrap_or_else(|| self.mode.default_port())
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

/// Directory containing the running executable, or `.` if it cannot be determined.
pub fn executable_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

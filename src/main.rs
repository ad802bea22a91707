//! `static-preview`: serve a directory over HTTP for local previewing.

use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;

use static_preview::config::loader::{load_config, ConfigError};
use static_preview::config::{ServeMode, ServerConfig};
use static_preview::lifecycle::startup;
use static_preview::observability::logging;
use static_preview::StartupError;

#[derive(Parser)]
#[command(name = "static-preview", version)]
#[command(about = "Serve a directory over HTTP, picking a free port automatically", long_about = None)]
struct Cli {
    /// Port to try first (default 8000, or 8080 with --blocking)
    port: Option<u16>,

    /// Directory to serve (default: the directory containing this binary)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// How many consecutive ports to probe
    #[arg(long)]
    max_attempts: Option<u16>,

    /// Interface to listen on
    #[arg(long)]
    host: Option<IpAddr>,

    /// Run the accept loop on the main task instead of a background task
    #[arg(long)]
    blocking: bool,

    /// Seconds in-flight responses may take to finish after a shutdown request
    #[arg(long)]
    drain_timeout: Option<u64>,

    /// TOML file with defaults; command-line flags take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<ServerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ServerConfig::default(),
        };

        if self.port.is_some() {
            config.requested_port = self.port;
        }
        if let Some(root) = self.root {
            config.serving_root = root;
        }
        if let Some(attempts) = self.max_attempts {
            config.max_port_attempts = attempts;
        }
        if let Some(host) = self.host {
            config.bind_host = host;
        }
        if self.blocking {
            config.mode = ServeMode::Blocking;
        }
        if let Some(secs) = self.drain_timeout {
            config.drain_timeout_secs = secs;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    let result = match cli.into_config() {
        Ok(config) => startup::run(config).await,
        Err(e) => Err(StartupError::from(e)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            eprintln!("Error: {e}");
            if let Some(hint) = e.hint() {
                eprintln!("{hint}");
            }
            ExitCode::FAILURE
        }
    }
}

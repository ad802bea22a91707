//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration and move into the serving root
//! - Install signal handling before anything is bound
//! - Pick a port, bind, print the banner, then serve in the configured mode
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and surfaces to `main`
//! - No automatic retries; the user decides on another port

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::validation::validate_config;
use crate::config::{ServeMode, ServerConfig};
use crate::error::{LifecycleError, StartupError};
use crate::http::static_files;
use crate::lifecycle::server::ServerLifecycle;
use crate::lifecycle::signals::SignalCoordinator;
use crate::net::find_free_port;

/// Run the preview server until it is shut down.
pub async fn run(config: ServerConfig) -> Result<(), StartupError> {
    validate_config(&config).map_err(StartupError::Validation)?;

    let root = enter_root(&config.serving_root)?;
    tracing::info!(
        root = %root.display(),
        requested_port = config.requested_port(),
        max_port_attempts = config.max_port_attempts,
        mode = ?config.mode,
        "Configuration loaded"
    );

    let lifecycle = Arc::new(ServerLifecycle::new(
        static_files::router(&root),
        config.drain_timeout(),
    ));
    SignalCoordinator::new(Arc::clone(&lifecycle))
        .install()
        .map_err(StartupError::Signals)?;

    let port = select_port(&config)?;
    let addr = lifecycle.bind(SocketAddr::new(config.bind_host, port))?;
    print_banner(addr.port(), &root);

    serve(&lifecycle, config.mode).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Probe for a free port, announcing when the requested one was skipped.
pub fn select_port(config: &ServerConfig) -> Result<u16, StartupError> {
    let requested = config.requested_port();
    let port = find_free_port(config.bind_host, requested, config.max_port_attempts).ok_or(
        StartupError::PortExhausted {
            start: requested,
            attempts: config.max_port_attempts,
        },
    )?;

    if port != requested {
        tracing::warn!(requested, port, "Requested port busy");
        println!("Port {requested} is busy, using port {port} instead");
    }
    Ok(port)
}

/// Serve a bound lifecycle until it reaches `Closed`.
pub async fn serve(lifecycle: &Arc<ServerLifecycle>, mode: ServeMode) -> Result<(), LifecycleError> {
    match mode {
        ServeMode::Blocking => lifecycle.serve_blocking().await,
        ServeMode::Background => {
            lifecycle.start()?;
            lifecycle.wait_closed().await;
            Ok(())
        }
    }
}

fn enter_root(root: &Path) -> Result<PathBuf, StartupError> {
    let change_dir = |source| StartupError::ChangeDir {
        path: root.to_path_buf(),
        source,
    };
    let root = root.canonicalize().map_err(change_dir)?;
    std::env::set_current_dir(&root).map_err(change_dir)?;
    Ok(root)
}

fn print_banner(port: u16, root: &Path) {
    println!("Server running at http://localhost:{port}/");
    println!("Serving files from: {}", root.display());
    println!("Server will automatically find free ports if busy");
    println!("Press Ctrl+C to stop the server");
    println!("{}", "-".repeat(50));
}

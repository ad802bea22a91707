//! OS signal handling.
//!
//! # Responsibilities
//! - Register SIGINT and SIGTERM handlers up front, before the server binds
//! - On the first signal, shut the server down once and exit with status 0
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - The handler only calls the idempotent `ServerLifecycle::shutdown`, so a
//!   signal racing another shutdown path, or arriving before bind, is harmless

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::lifecycle::server::{LifecycleState, ServerLifecycle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Interrupt => f.write_str("SIGINT"),
            Signal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Turns the first termination signal into a server shutdown and process exit.
pub struct SignalCoordinator {
    lifecycle: Arc<ServerLifecycle>,
    handled: AtomicBool,
}

impl SignalCoordinator {
    pub fn new(lifecycle: Arc<ServerLifecycle>) -> Self {
        Self {
            lifecycle,
            handled: AtomicBool::new(false),
        }
    }

    /// Register the handlers now and spawn the task that waits on them.
    ///
    /// The spawned task exits the process with status 0 after shutdown.
    pub fn install(self) -> io::Result<JoinHandle<()>> {
        let mut signals = Signals::register()?;
        Ok(tokio::spawn(async move {
            let signal = signals.recv().await;
            self.handle(signal).await;
            std::process::exit(0);
        }))
    }

    /// Shut the server down in response to `signal`.
    ///
    /// Only the first call does anything; it returns `true`.
    pub async fn handle(&self, signal: Signal) -> bool {
        if self.handled.swap(true, Ordering::SeqCst) {
            tracing::debug!(signal = %signal, "Signal already handled");
            return false;
        }

        tracing::info!(signal = %signal, "Signal received");
        println!("\nReceived {signal}");
        if matches!(
            self.lifecycle.state(),
            LifecycleState::Bound | LifecycleState::Serving
        ) {
            println!("Shutting down server gracefully...");
        }

        self.lifecycle.shutdown().await;
        println!("Server stopped cleanly");
        true
    }
}

#[cfg(unix)]
struct Signals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    fn register() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    async fn recv(&mut self) -> Signal {
        tokio::select! {
            _ = self.interrupt.recv() => Signal::Interrupt,
            _ = self.terminate.recv() => Signal::Terminate,
        }
    }
}

#[cfg(not(unix))]
struct Signals;

#[cfg(not(unix))]
impl Signals {
    fn register() -> io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> Signal {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl+C handler failed");
            std::future::pending::<()>().await;
        }
        Signal::Interrupt
    }
}

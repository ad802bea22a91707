//! Error types shared across the server.
//!
//! Startup failures (port discovery, bind, configuration) are fatal and
//! surface in `main` as a message plus exit code 1. Teardown failures are
//! only ever logged.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::config::validation::ValidationError;
use crate::lifecycle::LifecycleState;

/// Failure to bind the real listening socket.
#[derive(Debug, Error)]
pub enum BindError {
    /// The OS refused the bind because the address is held by someone else.
    #[error("port {} is still in use", .addr.port())]
    AddressInUse { addr: SocketAddr },

    /// Any other OS-level failure (permissions, unavailable address, ...).
    #[error("failed to bind {addr}: {source}")]
    Os {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

impl BindError {
    /// Classify a raw bind failure.
    pub fn from_io(addr: SocketAddr, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::AddrInUse {
            BindError::AddressInUse { addr }
        } else {
            BindError::Os { addr, source: err }
        }
    }

    /// The address the bind was attempted on.
    pub fn addr(&self) -> SocketAddr {
        match self {
            BindError::AddressInUse { addr } | BindError::Os { addr, .. } => *addr,
        }
    }
}

/// Errors raised by [`ServerLifecycle`](crate::lifecycle::ServerLifecycle).
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Operation not permitted in the current lifecycle state.
    #[error("cannot {operation} while the server is {state}")]
    InvalidState {
        operation: &'static str,
        state: LifecycleState,
    },

    /// Binding the listener failed.
    #[error(transparent)]
    Bind(#[from] BindError),

    /// Releasing the listening socket failed.
    #[error("failed to release listening socket: {0}")]
    Teardown(#[source] io::Error),
}

/// Fatal errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("could not find a free port starting from {start} ({attempts} attempts)")]
    PortExhausted { start: u16, attempts: u16 },

    #[error(transparent)]
    Bind(BindError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid configuration: {}", join_validation(.0))]
    Validation(Vec<ValidationError>),

    #[error("cannot use serving root {}: {source}", .path.display())]
    ChangeDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] io::Error),

    #[error(transparent)]
    Lifecycle(LifecycleError),
}

impl From<BindError> for StartupError {
    fn from(err: BindError) -> Self {
        StartupError::Bind(err)
    }
}

impl From<LifecycleError> for StartupError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Bind(bind) => StartupError::Bind(bind),
            other => StartupError::Lifecycle(other),
        }
    }
}

impl StartupError {
    /// Remediation shown under the error message, if there is one.
    pub fn hint(&self) -> Option<String> {
        match self {
            StartupError::PortExhausted { .. } => {
                Some("Try specifying a different port: static-preview 3000".to_string())
            }
            StartupError::Bind(BindError::AddressInUse { addr }) => Some(format!(
                "Try killing the process with:\n   lsof -ti:{port} | xargs kill -9\n   Or use a different port: static-preview 3000",
                port = addr.port()
            )),
            _ => None,
        }
    }
}

fn join_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

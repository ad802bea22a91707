//! Static file preview server.
//!
//! # Architecture Overview
//!
//! ```text
//!   requested port ──▶ net::port ──▶ net::listener ──▶ lifecycle::server ──▶ http::static_files
//!                      (probe N)     (SO_REUSEADDR)    (accept loop)         (ServeDir)
//!                                                           ▲
//!   SIGINT / SIGTERM ──▶ lifecycle::signals ────────────────┘ shutdown() once, exit 0
//! ```
//!
//! Meant for previewing a site locally, not for production traffic.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::ServerConfig;
pub use error::{BindError, LifecycleError, StartupError};
pub use lifecycle::{LifecycleState, ServerLifecycle, SignalCoordinator};

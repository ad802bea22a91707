//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate config → chdir to root → Find port → Install signals → Bind → Serve
//!
//! Server (server.rs):
//!     Created → Bound → Serving → ShuttingDown → Closed
//!
//! Shutdown (server.rs):
//!     Stop requested → Accept loop exits → Release socket → Drain (bounded) → Closed
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → shutdown() once → exit(0)
//! ```
//!
//! # Design Decisions
//! - One idempotent `shutdown()` is the only path that closes the socket
//! - The lifecycle is passed explicitly to the signal coordinator, no globals
//! - Drain has a deadline so a slow download cannot hold the process open

pub mod server;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use server::{LifecycleState, ServerLifecycle};
pub use shutdown::ShutdownSignal;
pub use signals::{Signal, SignalCoordinator};

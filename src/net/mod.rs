//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! requested port
//!     → port.rs (probe start..start+N, first bindable wins)
//!     → listener.rs (real bind with address/port reuse)
//!     → lifecycle::ServerLifecycle (accept loop)
//!     → connection.rs (per-connection id + live count)
//! ```
//!
//! # Design Decisions
//! - Probing is check-then-bind and therefore racy; the real bind reports
//!   `AddressInUse` instead of retrying
//! - SO_REUSEPORT is best-effort, SO_REUSEADDR is mandatory

pub mod connection;
pub mod listener;
pub mod port;

pub use listener::ReusableListener;
pub use port::find_free_port;

//! Observability subsystem.
//!
//! Structured logs via `tracing` go to stderr. The human-facing banner and
//! status lines are plain stdout prints and are not part of this.

pub mod logging;

//! HTTP handlers.
//!
//! The lifecycle accepts any `axum::Router`; this module provides the one the
//! binary uses: static files from the serving root.

pub mod static_files;

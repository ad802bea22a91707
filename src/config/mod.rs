//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file
//!     → loader.rs (parse & deserialize)
//!     → CLI overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once validated
//! - All fields have defaults, so running with no arguments works
//! - Only `RUST_LOG` is read from the environment, and only for log filtering

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::ServeMode;
pub use schema::ServerConfig;

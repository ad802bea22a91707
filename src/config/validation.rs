//! Configuration validation.
//!
//! Serde handles the syntactic side; this checks value ranges and the serving
//! root. All problems are reported at once, not just the first.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::schema::ServerConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("requested port must be between 1 and 65535")]
    ZeroPort,

    #[error("max_port_attempts must be at least 1")]
    NoPortAttempts,

    #[error("drain_timeout_secs must be at least 1")]
    ZeroDrainTimeout,

    #[error("serving root {} does not exist", .0.display())]
    MissingRoot(PathBuf),

    #[error("serving root {} is not a directory", .0.display())]
    RootNotDirectory(PathBuf),
}

pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.requested_port() == 0 {
        errors.push(ValidationError::ZeroPort);
    }
    if config.max_port_attempts == 0 {
        errors.push(ValidationError::NoPortAttempts);
    }
    if config.drain_timeout_secs == 0 {
        errors.push(ValidationError::ZeroDrainTimeout);
    }

    let root = &config.serving_root;
    if !root.exists() {
        errors.push(ValidationError::MissingRoot(root.clone()));
    } else if !root.is_dir() {
        errors.push(ValidationError::RootNotDirectory(root.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &tempfile::TempDir) -> ServerConfig {
        ServerConfig {
            serving_root: dir.path().to_path_buf(),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn defaults_are_valid() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(validate_config(&config_in(&dir)), Ok(()));
    }

    #[test]
    fn collects_every_problem() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(&dir);
        config.requested_port = Some(0);
        config.max_port_attempts = 0;
        config.drain_timeout_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::ZeroPort,
                ValidationError::NoPortAttempts,
                ValidationError::ZeroDrainTimeout,
            ]
        );
    }

    #[test]
    fn root_must_be_an_existing_directory() {
        let dir = tempfile::tempdir().unwrap();

        let mut config = config_in(&dir);
        config.serving_root = dir.path().join("missing");
        assert!(matches!(
            validate_config(&config).unwrap_err().as_slice(),
            [ValidationError::MissingRoot(_)]
        ));

        let file = dir.path().join("index.html");
        std::fs::write(&file, "<h1>hi</h1>").unwrap();
        config.serving_root = file;
        assert!(matches!(
            validate_config(&config).unwrap_err().as_slice(),
            [ValidationError::RootNotDirectory(_)]
        ));
    }
}

//! Configuration error types.

use std::path::PathBuf;

/// Configuration error type.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for this schema.
    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        /// File that was being parsed
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: serde_yaml::Error,
    },

    /// An environment variable held an unusable value.
    #[error("Invalid value for {name}: {reason}")]
    InvalidEnv {
        /// Variable name
        name: String,
        /// What was wrong with it
        reason: String,
    },

    /// The merged configuration failed validation.
    #[error("Invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

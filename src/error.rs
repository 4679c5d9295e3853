//! Error types for nxos-igmp.
//!
//! Module-level failures are [`ModuleError`]s. This type wraps them together
//! with configuration and IO failures, and maps each to a process exit status.

use crate::modules::ModuleError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for crate-level operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for nxos-igmp.
#[derive(Error, Debug)]
pub enum Error {
    /// Module execution failed.
    #[error(transparent)]
    Module(#[from] ModuleError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error loading a configuration file.
    #[error("Failed to load config file '{path}': {message}")]
    ConfigLoad {
        /// Path to the file
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    /// Creates a new config load error.
    pub fn config_load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Module(ModuleError::DeviceConfig(_)) => 2,
            Error::Module(ModuleError::Connection(_))
            | Error::Module(ModuleError::HostResolution { .. }) => 3,
            Error::Module(ModuleError::InvalidParameter(_))
            | Error::Module(ModuleError::MissingParameter(_)) => 4,
            Error::Module(ModuleError::MissingDependency(_)) => 5,
            _ => 1,
        }
    }
}

//! Configuration module for nxos-igmp
//!
//! Handles loading configuration from:
//! - Default values
//! - The first config file found (`$NXOS_IGMP_CONFIG`, `~/.nxos-igmp.toml`,
//!   `./nxos-igmp.toml`) or an explicit path
//! - Environment variables

use crate::error::{Error, Result};
use crate::modules::network::{
    IgmpReconciler, NetAuthFile, NxApiConnector, NxApiOptions, NxosIgmpModule,
    NXAPI_DEFAULT_HTTPS_PORT, NXAPI_DEFAULT_HTTP_PORT,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// NX-API transport settings
    pub nxapi: NxApiConfig,

    /// Fallback credential settings
    pub credentials: CredentialsConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// NX-API transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NxApiConfig {
    /// Request timeout in seconds
    pub timeout: u64,

    /// Validate HTTPS certificates
    pub validate_certs: bool,

    /// Port used with `protocol: http`
    pub http_port: u16,

    /// Port used with `protocol: https`
    pub https_port: u16,
}

impl Default for NxApiConfig {
    fn default() -> Self {
        let options = NxApiOptions::default();
        Self {
            timeout: options.timeout.as_secs(),
            validate_certs: options.validate_certs,
            http_port: NXAPI_DEFAULT_HTTP_PORT,
            https_port: NXAPI_DEFAULT_HTTPS_PORT,
        }
    }
}

/// Fallback credential settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Path to the `.netauth` file; `~/.netauth` when unset
    pub netauth_path: Option<PathBuf>,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when no `-v` flag is given
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = match Self::config_paths(config_path)
            .into_iter()
            .find(|path| path.exists())
        {
            Some(path) => Self::from_file(&path)?,
            None => match config_path {
                Some(path) => {
                    return Err(Error::config_load(path, "file does not exist"));
                }
                None => Config::default(),
            },
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Get the list of configuration file paths to check, in priority order
    fn config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        if let Some(path) = explicit_path {
            return vec![path.clone()];
        }

        let mut paths = Vec::new();

        if let Ok(env_config) = std::env::var("NXOS_IGMP_CONFIG") {
            paths.push(PathBuf::from(env_config));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".nxos-igmp.toml"));
        }

        paths.push(PathBuf::from("nxos-igmp.toml"));
        paths
    }

    /// Load from a specific file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config_load(path, e.to_string()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config: Config = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            _ => toml::from_str(&content)?,
        };

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        // NXOS_IGMP_TIMEOUT
        if let Ok(timeout) = std::env::var("NXOS_IGMP_TIMEOUT") {
            if let Ok(n) = timeout.parse() {
                self.nxapi.timeout = n;
            }
        }

        // NXOS_IGMP_VALIDATE_CERTS
        if let Ok(value) = std::env::var("NXOS_IGMP_VALIDATE_CERTS") {
            match value.to_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => self.nxapi.validate_certs = true,
                "false" | "no" | "0" | "off" => self.nxapi.validate_certs = false,
                _ => {}
            }
        }

        // NXOS_IGMP_NETAUTH
        if let Ok(path) = std::env::var("NXOS_IGMP_NETAUTH") {
            self.credentials.netauth_path = Some(PathBuf::from(path));
        }

        // NXOS_IGMP_LOG_LEVEL
        if let Ok(level) = std::env::var("NXOS_IGMP_LOG_LEVEL") {
            self.logging.log_level = level;
        }
    }

    /// NX-API transport options derived from this config
    pub fn nxapi_options(&self) -> NxApiOptions {
        NxApiOptions {
            timeout: Duration::from_secs(self.nxapi.timeout),
            validate_certs: self.nxapi.validate_certs,
        }
    }

    /// Fallback credential store
    pub fn credential_provider(&self) -> NetAuthFile {
        match &self.credentials.netauth_path {
            Some(path) => NetAuthFile::new(path),
            None => NetAuthFile::default(),
        }
    }

    /// The `nxos_igmp` module wired to this configuration
    pub fn build_module(&self) -> NxosIgmpModule {
        let reconciler = IgmpReconciler::new(
            Arc::new(self.credential_provider()),
            Arc::new(NxApiConnector::new(self.nxapi_options())),
        )
        .with_ports(self.nxapi.http_port, self.nxapi.https_port);

        NxosIgmpModule::new(reconciler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::network::Protocol;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.nxapi.timeout, 30);
        assert!(config.nxapi.validate_certs);
        assert_eq!(config.nxapi.http_port, 80);
        assert_eq!(config.nxapi.https_port, 443);
        assert_eq!(config.logging.log_level, "warn");
        assert!(config.credentials.netauth_path.is_none());
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[nxapi]\ntimeout = 5\nvalidate_certs = false\n\n[credentials]\nnetauth_path = \"/etc/netauth\""
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.nxapi.timeout, 5);
        assert!(!config.nxapi.validate_certs);
        assert_eq!(config.nxapi.https_port, 443);
        assert_eq!(
            config.credential_provider().path(),
            Path::new("/etc/netauth")
        );
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "nxapi:\n  http_port: 8080\nlogging:\n  log_level: debug").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.nxapi.http_port, 8080);
        assert_eq!(config.logging.log_level, "debug");
        assert_eq!(config.nxapi.https_port, 443);
        let module = config.build_module();
        assert_eq!(module.reconciler().default_port(Protocol::Http), 8080);
        assert_eq!(module.reconciler().default_port(Protocol::Https), 443);
    }

    #[test]
    fn test_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[nxapi\ntimeout = ").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(Error::TomlParse(_))
        ));
    }

    #[test]
    #[serial]
    fn test_explicit_missing_file_is_error() {
        let path = PathBuf::from("/nonexistent/nxos-igmp.toml");
        assert!(matches!(
            Config::load(Some(&path)),
            Err(Error::ConfigLoad { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_env_override() {
        std::env::set_var("NXOS_IGMP_TIMEOUT", "7");
        std::env::set_var("NXOS_IGMP_VALIDATE_CERTS", "no");
        std::env::set_var("NXOS_IGMP_NETAUTH", "/tmp/netauth");
        let mut config = Config::default();
        config.apply_env_overrides();
        std::env::remove_var("NXOS_IGMP_TIMEOUT");
        std::env::remove_var("NXOS_IGMP_VALIDATE_CERTS");
        std::env::remove_var("NXOS_IGMP_NETAUTH");

        assert_eq!(config.nxapi.timeout, 7);
        assert!(!config.nxapi.validate_certs);
        assert_eq!(
            config.credentials.netauth_path,
            Some(PathBuf::from("/tmp/netauth"))
        );
        assert_eq!(config.nxapi_options().timeout, Duration::from_secs(7));
    }
}

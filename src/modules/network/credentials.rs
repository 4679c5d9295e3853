//! Login credentials for NX-API sessions
//!
//! Credentials passed explicitly to a module always win. Anything left unset is
//! filled from a [`CredentialProvider`], which the reconciler receives at
//! construction time.
//!
//! The default provider reads a `.netauth` YAML file:
//!
//! ```yaml
//! cisco:
//!   nexus:
//!     username: admin
//!     password: secret
//! ```

use crate::modules::{ModuleError, ModuleResult};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default name of the fallback credential file in the user's home directory
pub const NETAUTH_FILE_NAME: &str = ".netauth";

/// Username and password for a device session
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// Resolves effective credentials from explicit values plus a fallback source
pub trait CredentialProvider: Send + Sync {
    /// Explicit values win field by field; missing ones come from the provider.
    fn resolve(&self, username: Option<&str>, password: Option<&str>)
        -> ModuleResult<Credentials>;
}

/// Fill unset fields from fallback values, failing on whatever is still missing
fn merge(
    username: Option<&str>,
    password: Option<&str>,
    fallback_username: Option<String>,
    fallback_password: Option<String>,
    source: &str,
) -> ModuleResult<Credentials> {
    let username = username
        .map(String::from)
        .or(fallback_username)
        .ok_or_else(|| {
            ModuleError::MissingParameter(format!(
                "username (not supplied and not found in {})",
                source
            ))
        })?;
    let password = password
        .map(String::from)
        .or(fallback_password)
        .ok_or_else(|| {
            ModuleError::MissingParameter(format!(
                "password (not supplied and not found in {})",
                source
            ))
        })?;

    Ok(Credentials { username, password })
}

/// Fixed fallback credentials
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    username: Option<String>,
    password: Option<String>,
}

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// A provider with no fallback at all; only explicit credentials work
    pub fn none() -> Self {
        Self::default()
    }
}

impl CredentialProvider for StaticCredentials {
    fn resolve(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> ModuleResult<Credentials> {
        merge(
            username,
            password,
            self.username.clone(),
            self.password.clone(),
            "static fallback",
        )
    }
}

#[derive(Debug, Default, Deserialize)]
struct NetAuth {
    #[serde(default)]
    cisco: Option<NetAuthVendor>,
}

#[derive(Debug, Default, Deserialize)]
struct NetAuthVendor {
    #[serde(default)]
    nexus: Option<NetAuthEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct NetAuthEntry {
    username: Option<String>,
    password: Option<String>,
}

/// Fallback credentials stored in a `.netauth` YAML file
#[derive(Debug, Clone)]
pub struct NetAuthFile {
    path: PathBuf,
}

impl NetAuthFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.netauth`, or `./.netauth` when no home directory is known
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|home| home.join(NETAUTH_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(NETAUTH_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> ModuleResult<NetAuthEntry> {
        if !self.path.exists() {
            debug!("Credential file {} not found", self.path.display());
            return Ok(NetAuthEntry::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let netauth: NetAuth = serde_yaml::from_str(&content).map_err(|e| {
            ModuleError::ParseError(format!(
                "Failed to parse credential file '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(netauth
            .cisco
            .and_then(|vendor| vendor.nexus)
            .unwrap_or_default())
    }
}

impl Default for NetAuthFile {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

impl CredentialProvider for NetAuthFile {
    fn resolve(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> ModuleResult<Credentials> {
        if let (Some(username), Some(password)) = (username, password) {
            return Ok(Credentials::new(username, password));
        }

        let entry = self.load()?;
        merge(
            username,
            password,
            entry.username,
            entry.password,
            &self.path.display().to_string(),
        )
    }
}

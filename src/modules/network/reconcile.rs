//! Reconciliation of global IGMP settings
//!
//! A run moves through a small state machine:
//!
//! ```text
//! Unchanged --(delta or restart)--> Pending --check mode--> DryRun
//!                                      |
//!                                      +--device accepts--> Applied
//!                                      +--device rejects--> Err(DeviceConfig)
//! ```
//!
//! `Unchanged` is terminal when there is nothing to send.

use super::credentials::CredentialProvider;
use super::igmp::{
    compute_delta, config_commands, parse_running_config, IgmpSettings, RESTART_COMMAND,
    SHOW_COMMAND,
};
use super::nxapi::{
    resolve_host, DeviceConnector, DeviceTarget, NxosDevice, Protocol, COMMAND_SEPARATOR,
    NXAPI_DEFAULT_HTTPS_PORT, NXAPI_DEFAULT_HTTP_PORT,
};
use crate::modules::{ModuleError, ModuleResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Desired overall state of the global IGMP configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IgmpState {
    /// Apply the caller's explicit settings
    #[default]
    Present,
    /// Return every setting to its NX-OS default
    Default,
}

impl IgmpState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IgmpState::Present => "present",
            IgmpState::Default => "default",
        }
    }
}

impl fmt::Display for IgmpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IgmpState {
    type Err = ModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(IgmpState::Present),
            "default" => Ok(IgmpState::Default),
            _ => Err(ModuleError::InvalidParameter(format!(
                "Invalid state '{}'. Valid options: present, default",
                s
            ))),
        }
    }
}

/// Validated inputs for one reconciliation run
#[derive(Debug, Clone, Default)]
pub struct IgmpRequest {
    pub host: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub protocol: Protocol,
    /// Overrides the protocol's configured port
    pub port: Option<u16>,
    pub state: IgmpState,
    pub settings: IgmpSettings,
    pub restart: bool,
}

impl IgmpRequest {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Settings the delta is computed against
    pub fn desired(&self) -> IgmpSettings {
        match self.state {
            IgmpState::Present => self.settings,
            IgmpState::Default => IgmpSettings::defaults(),
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// Nothing to send
    Unchanged,
    /// Commands were assembled but not sent
    DryRun,
    /// Commands were sent and accepted
    Applied,
}

/// Settings reported after a run, annotated with whether a restart was issued
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndState {
    #[serde(flatten)]
    pub settings: IndexMap<String, bool>,
    pub restart: bool,
}

/// Result record of one reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IgmpReport {
    /// Settings the caller asked for explicitly
    pub proposed: IndexMap<String, bool>,
    /// Settings read from the device before any change
    pub existing: IndexMap<String, bool>,
    /// Commands sent (or that would be sent), joined into one string
    pub updates: String,
    pub changed: bool,
    pub end_state: EndState,
    pub state: IgmpState,
    pub outcome: ReconcileOutcome,
    #[serde(skip)]
    pub commands: Vec<String>,
}

/// Drives a device towards the requested global IGMP settings
pub struct IgmpReconciler {
    credentials: Arc<dyn CredentialProvider>,
    connector: Arc<dyn DeviceConnector>,
    http_port: u16,
    https_port: u16,
}

impl IgmpReconciler {
    pub fn new(credentials: Arc<dyn CredentialProvider>, connector: Arc<dyn DeviceConnector>) -> Self {
        Self {
            credentials,
            connector,
            http_port: NXAPI_DEFAULT_HTTP_PORT,
            https_port: NXAPI_DEFAULT_HTTPS_PORT,
        }
    }

    /// Ports used when a request does not carry its own
    pub fn with_ports(mut self, http_port: u16, https_port: u16) -> Self {
        self.http_port = http_port;
        self.https_port = https_port;
        self
    }

    /// Port used for `protocol` when a request does not name one
    pub fn default_port(&self, protocol: Protocol) -> u16 {
        match protocol {
            Protocol::Http => self.http_port,
            Protocol::Https => self.https_port,
        }
    }

    fn port_for(&self, request: &IgmpRequest) -> u16 {
        request
            .port
            .unwrap_or_else(|| self.default_port(request.protocol))
    }

    /// Open a session for `request`: credentials, name resolution, connect
    async fn open(&self, request: &IgmpRequest) -> ModuleResult<Arc<dyn NxosDevice>> {
        let credentials = self
            .credentials
            .resolve(request.username.as_deref(), request.password.as_deref())?;

        let port = self.port_for(request);
        let address = resolve_host(&request.host, port).await?;
        debug!(host = %request.host, %address, port, "Resolved device address");

        let target = DeviceTarget {
            host: request.host.clone(),
            address,
            port,
            protocol: request.protocol,
            credentials,
        };
        self.connector.connect(&target).await
    }

    async fn fetch(device: &dyn NxosDevice) -> ModuleResult<IgmpSettings> {
        let text = device.show_text(SHOW_COMMAND).await?;
        Ok(parse_running_config(&text))
    }

    /// Run one reconciliation. In `check_mode` nothing is sent to the device.
    pub async fn reconcile(&self, request: &IgmpRequest, check_mode: bool) -> ModuleResult<IgmpReport> {
        let device = self.open(request).await?;

        let existing = Self::fetch(device.as_ref()).await?;
        debug!(host = %request.host, ?existing, "Fetched global IGMP settings");

        let desired = request.desired();
        let delta = compute_delta(&desired.pairs(), &existing.pairs());
        debug!(state = %request.state, ?delta, "Computed IGMP delta");

        let mut commands = if delta.is_empty() {
            Vec::new()
        } else {
            config_commands(&delta)
        };
        if request.restart {
            commands.push(RESTART_COMMAND.to_string());
        }

        let updates = commands.join(COMMAND_SEPARATOR);

        let unchanged_end_state = || EndState {
            settings: existing.to_map(),
            restart: false,
        };

        let (outcome, end_state) = if commands.is_empty() {
            (ReconcileOutcome::Unchanged, unchanged_end_state())
        } else if check_mode {
            info!(host = %request.host, commands = %updates, "Check mode: would apply IGMP changes");
            (ReconcileOutcome::DryRun, unchanged_end_state())
        } else {
            if let Err(e) = device.configure(&commands).await {
                warn!(host = %request.host, error = %e, "Device rejected IGMP configuration");
                return Err(e);
            }
            info!(host = %request.host, commands = %updates, "Applied IGMP changes");

            // Restart success is assumed; the device is not asked to confirm it
            let end = Self::fetch(device.as_ref()).await?;
            let end_state = EndState {
                settings: end.to_map(),
                restart: request.restart,
            };
            (ReconcileOutcome::Applied, end_state)
        };

        Ok(IgmpReport {
            proposed: request.settings.to_map(),
            existing: existing.to_map(),
            updates,
            changed: outcome != ReconcileOutcome::Unchanged,
            end_state,
            state: request.state,
            outcome,
            commands,
        })
    }
}

impl fmt::Debug for IgmpReconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IgmpReconciler")
            .field("http_port", &self.http_port)
            .field("https_port", &self.https_port)
            .finish_non_exhaustive()
    }
}

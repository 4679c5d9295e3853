//! CLI module for nxos-igmp
//!
//! Argument parsing for the `nxos-igmp` binary. Arguments are turned back into
//! flat module parameters so the command line goes through the same validation
//! as any other caller of the `nxos_igmp` module.

pub mod output;

use clap::builder::BoolishValueParser;
use clap::{Parser, ValueEnum};
use nxos_igmp::modules::ModuleParams;
use std::path::PathBuf;

/// nxos-igmp - Declarative global IGMP settings for Cisco NX-OS
#[derive(Parser, Debug, Clone)]
#[command(name = "nxos-igmp")]
#[command(author = "Rustible Contributors")]
#[command(version)]
#[command(about = "Reconcile global IGMP settings on a Cisco NX-OS switch", long_about = None)]
pub struct Cli {
    /// Switch host name or address
    #[arg(long, env = "NXOS_HOST")]
    pub host: String,

    /// NX-API username (falls back to the .netauth file)
    #[arg(short = 'u', long, env = "NXOS_USERNAME")]
    pub username: Option<String>,

    /// NX-API password (falls back to the .netauth file)
    #[arg(short = 'p', long, env = "NXOS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Protocol used to reach NX-API
    #[arg(long, value_enum, default_value = "http")]
    pub protocol: ProtocolArg,

    /// NX-API port (defaults to the configured port for the protocol)
    #[arg(long)]
    pub port: Option<u16>,

    /// Desired state of the global IGMP configuration
    #[arg(long, value_enum, default_value = "present")]
    pub state: StateArg,

    /// Flush routes when the IGMP process restarts
    #[arg(long, value_parser = BoolishValueParser::new())]
    pub flush_routes: Option<bool>,

    /// Enforce the router-alert option on IGMP packets
    #[arg(long, value_parser = BoolishValueParser::new())]
    pub enforce_rtr_alert: Option<bool>,

    /// Restart the IGMP process after configuring
    #[arg(long, value_parser = BoolishValueParser::new())]
    pub restart: Option<bool>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Run in check mode (dry-run, don't make changes)
    #[arg(long = "check")]
    pub check_mode: bool,

    /// Show the before/after settings
    #[arg(long = "diff")]
    pub diff_mode: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    pub output: OutputFormat,

    /// Path to configuration file
    #[arg(short = 'c', long, env = "NXOS_IGMP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// NX-API protocol choices
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProtocolArg {
    Http,
    Https,
}

impl ProtocolArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolArg::Http => "http",
            ProtocolArg::Https => "https",
        }
    }
}

/// Desired state choices
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StateArg {
    Present,
    Default,
}

impl StateArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateArg::Present => "present",
            StateArg::Default => "default",
        }
    }
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output for scripting
    Json,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }

    /// Check if JSON output is requested
    pub fn is_json(&self) -> bool {
        matches!(self.output, OutputFormat::Json)
    }

    /// Module parameters for `nxos_igmp`; unset options are left out
    pub fn to_params(&self) -> ModuleParams {
        let mut params = ModuleParams::new();
        params.insert("host".to_string(), serde_json::json!(self.host));
        params.insert("protocol".to_string(), serde_json::json!(self.protocol.as_str()));
        params.insert("state".to_string(), serde_json::json!(self.state.as_str()));

        let optional = [
            ("username", self.username.clone().map(serde_json::Value::from)),
            ("password", self.password.clone().map(serde_json::Value::from)),
            ("port", self.port.map(serde_json::Value::from)),
            ("flush_routes", self.flush_routes.map(serde_json::Value::from)),
            ("enforce_rtr_alert", self.enforce_rtr_alert.map(serde_json::Value::from)),
            ("restart", self.restart.map(serde_json::Value::from)),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                params.insert(key.to_string(), value);
            }
        }

        params
    }
}

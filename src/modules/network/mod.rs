//! Network Device Modules
//!
//! Declarative management of Cisco NX-OS global IGMP settings over NX-API.
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +-------------------+     +-------------------+
//! |   nxos_igmp      |---->|  IgmpReconciler   |---->| CredentialProvider|
//! |   (Module)       |     |  fetch/delta/     |     |  (.netauth, ...)  |
//! +------------------+     |  apply            |     +-------------------+
//!                          +-------------------+
//!                                   |
//!                                   v
//!                          +-------------------+
//!                          |  DeviceConnector  |
//!                          |  -> NxApiClient   |
//!                          +-------------------+
//! ```

pub mod credentials;
pub mod igmp;
pub mod nxapi;
pub mod nxos_igmp;
pub mod reconcile;

// Re-export main types for convenience
pub use credentials::{CredentialProvider, Credentials, NetAuthFile, StaticCredentials};
pub use igmp::{compute_delta, config_commands, parse_running_config, IgmpKey, IgmpSettings};
pub use nxapi::{
    resolve_host, DeviceConnector, DeviceTarget, NxApiClient, NxApiConnector, NxApiOptions,
    NxosDevice, Protocol, NXAPI_DEFAULT_HTTPS_PORT, NXAPI_DEFAULT_HTTP_PORT,
};
pub use nxos_igmp::{request_from_params, NxosIgmpModule};
pub use reconcile::{
    EndState, IgmpReconciler, IgmpReport, IgmpRequest, IgmpState, ReconcileOutcome,
};

use crate::modules::ModuleRegistry;
use std::sync::Arc;

/// Register all network modules with the registry
pub fn register_network_modules(registry: &mut ModuleRegistry) {
    registry.register(Arc::new(NxosIgmpModule::default()));
}

/// Get a list of all available network module names
pub fn network_module_names() -> Vec<&'static str> {
    vec!["nxos_igmp"]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_names() {
        let names = network_module_names();
        assert!(names.contains(&"nxos_igmp"));
    }

    #[test]
    fn test_registered_names_match() {
        let mut registry = ModuleRegistry::new();
        register_network_modules(&mut registry);
        for name in network_module_names() {
            assert!(registry.contains(name));
        }
    }

    #[test]
    fn test_protocol_display() {
        assert_eq!(format!("{}", Protocol::Http), "http");
        assert_eq!(format!("{}", Protocol::Https), "https");
    }

    #[test]
    fn test_state_display() {
        assert_eq!(format!("{}", IgmpState::Present), "present");
        assert_eq!(format!("{}", IgmpState::Default), "default");
    }
}

//! # nxos-igmp - Declarative global IGMP settings for Cisco NX-OS
//!
//! nxos-igmp reads the global IGMP configuration of a Nexus switch over NX-API,
//! compares it with a declared desired state, and sends only the commands
//! needed to close the gap. Every run reports the proposed, existing and final
//! settings along with the commands it issued.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           CLI Interface                              │
//! │                    (clap-based argument parsing)                     │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                 Module Registry  (nxos_igmp module)                  │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │          IgmpReconciler  (credentials, fetch, delta, apply)          │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      NX-API session (reqwest)                        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use nxos_igmp::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let reconciler = IgmpReconciler::new(
//!         Arc::new(NetAuthFile::default()),
//!         Arc::new(NxApiConnector::default()),
//!     );
//!
//!     let mut request = IgmpRequest::new("nexus-01.example.net");
//!     request.settings.flush_routes = Some(true);
//!
//!     let report = reconciler.reconcile(&request, false).await?;
//!     println!("changed: {} ({})", report.changed, report.updates);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// Re-export commonly used items in prelude
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    // Error handling
    pub use crate::error::{Error, Result};

    // Configuration
    pub use crate::config::Config;

    // Module system
    pub use crate::modules::{
        Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleRegistry,
        ModuleResult,
    };

    // NX-OS IGMP
    pub use crate::modules::network::{
        CredentialProvider, Credentials, DeviceConnector, IgmpReconciler, IgmpReport, IgmpRequest,
        IgmpSettings, IgmpState, NetAuthFile, NxApiConnector, NxosDevice, NxosIgmpModule,
        Protocol, StaticCredentials,
    };
}

/// Error types and result aliases.
pub mod error;

/// Configuration loading: files, environment overrides, and module wiring.
pub mod config;

/// Module system: traits, parameters, outputs, and the built-in modules.
pub mod modules;

pub use error::{Error, Result};

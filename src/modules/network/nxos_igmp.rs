//! Cisco NX-OS Global IGMP Module
//!
//! Manages the global IGMP settings of a Nexus switch over NX-API.
//!
//! ## Parameters
//!
//! - `host`: Switch host name or address (required)
//! - `username` / `password`: NX-API login; missing values come from the
//!   fallback credential store (`~/.netauth` by default)
//! - `protocol`: `http` (default) or `https`
//! - `port`: NX-API port, overriding the protocol default
//! - `state`: `present` (default) applies `flush_routes`/`enforce_rtr_alert`;
//!   `default` returns both to their NX-OS defaults
//! - `flush_routes`: Flush routes when the IGMP process restarts
//! - `enforce_rtr_alert`: Enforce the router-alert option on IGMP packets
//! - `restart`: Restart the IGMP process after any configuration change
//!
//! ## Examples
//!
//! ```yaml
//! - name: Enable route flushing
//!   nxos_igmp:
//!     host: "{{ inventory_hostname }}"
//!     flush_routes: true
//!
//! - name: Reset global IGMP settings and restart the process
//!   nxos_igmp:
//!     host: "{{ inventory_hostname }}"
//!     state: default
//!     restart: true
//! ```

use super::credentials::NetAuthFile;
use super::igmp::{IgmpKey, IgmpSettings};
use super::nxapi::{NxApiConnector, Protocol};
use super::reconcile::{IgmpReconciler, IgmpReport, IgmpRequest, IgmpState, ReconcileOutcome};
use crate::modules::{
    Diff, Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleResult, ParamExt,
};
use indexmap::IndexMap;
use std::sync::Arc;
use tokio::runtime::RuntimeFlavor;

/// Parameters accepted by `nxos_igmp`
const SUPPORTED_PARAMS: &[&str] = &[
    "host",
    "username",
    "password",
    "protocol",
    "port",
    "state",
    "flush_routes",
    "enforce_rtr_alert",
    "restart",
];

/// Parse module parameters into a validated request
pub fn request_from_params(params: &ModuleParams) -> ModuleResult<IgmpRequest> {
    let mut unsupported: Vec<&str> = params
        .keys()
        .map(String::as_str)
        .filter(|key| !SUPPORTED_PARAMS.contains(key))
        .collect();
    if !unsupported.is_empty() {
        unsupported.sort_unstable();
        return Err(ModuleError::InvalidParameter(format!(
            "Unsupported parameters: {}",
            unsupported.join(", ")
        )));
    }

    let protocol = match params.get_string("protocol")? {
        Some(p) => p.parse::<Protocol>()?,
        None => Protocol::default(),
    };

    let state = match params.get_string("state")? {
        Some(s) => s.parse::<IgmpState>()?,
        None => IgmpState::default(),
    };

    let port = params
        .get_u32("port")?
        .map(|p| {
            u16::try_from(p)
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| {
                    ModuleError::InvalidParameter(format!("port must be 1-65535, got {}", p))
                })
        })
        .transpose()?;

    let mut settings = IgmpSettings::default();
    for key in IgmpKey::ALL {
        settings.set(key, params.get_bool(key.as_str())?);
    }

    Ok(IgmpRequest {
        host: params.get_string_required("host")?,
        username: params.get_string("username")?,
        password: params.get_string("password")?,
        protocol,
        port,
        state,
        settings,
        restart: params.get_bool("restart")?.unwrap_or(false),
    })
}

fn render_settings(settings: &IndexMap<String, bool>) -> String {
    settings
        .iter()
        .map(|(key, value)| format!("{}: {}\n", key, value))
        .collect()
}

/// Before/after view of the settings touched by a run
fn report_diff(request: &IgmpRequest, report: &IgmpReport) -> Diff {
    let after = match report.outcome {
        ReconcileOutcome::Applied => report.end_state.settings.clone(),
        ReconcileOutcome::DryRun | ReconcileOutcome::Unchanged => {
            let mut predicted = report.existing.clone();
            for (key, value) in request.desired().pairs() {
                predicted.insert(key.as_str().to_string(), value);
            }
            predicted
        }
    };

    let diff = Diff::new(render_settings(&report.existing), render_settings(&after));
    if report.updates.is_empty() {
        diff
    } else {
        diff.with_details(format!("Commands: {}", report.updates))
    }
}

fn report_output(request: &IgmpRequest, report: &IgmpReport, diff_mode: bool) -> ModuleOutput {
    let count = report.commands.len();
    let output = match report.outcome {
        ReconcileOutcome::Unchanged => ModuleOutput::ok("No changes required"),
        ReconcileOutcome::DryRun => {
            ModuleOutput::changed(format!("Would apply {} command(s)", count))
        }
        ReconcileOutcome::Applied => ModuleOutput::changed(format!("Applied {} command(s)", count)),
    };

    let mut output = output
        .with_data("proposed", serde_json::json!(report.proposed))
        .with_data("existing", serde_json::json!(report.existing))
        .with_data("end_state", serde_json::json!(report.end_state))
        .with_data("updates", serde_json::json!(report.updates))
        .with_data("commands", serde_json::json!(report.commands))
        .with_data("state", serde_json::json!(report.state))
        .with_data("outcome", serde_json::json!(report.outcome));

    if diff_mode {
        output = output.with_diff(report_diff(request, report));
    }
    output
}

/// Global IGMP configuration module for NX-OS
pub struct NxosIgmpModule {
    reconciler: Arc<IgmpReconciler>,
}

impl NxosIgmpModule {
    pub fn new(reconciler: IgmpReconciler) -> Self {
        Self {
            reconciler: Arc::new(reconciler),
        }
    }

    pub fn reconciler(&self) -> &IgmpReconciler {
        &self.reconciler
    }

    /// Execute the module
    async fn execute_async(
        &self,
        params: &ModuleParams,
        context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let request = request_from_params(params)?;
        let report = self
            .reconciler
            .reconcile(&request, context.check_mode)
            .await?;
        Ok(report_output(&request, &report, context.diff_mode))
    }
}

impl Default for NxosIgmpModule {
    fn default() -> Self {
        Self::new(IgmpReconciler::new(
            Arc::new(NetAuthFile::default()),
            Arc::new(NxApiConnector::default()),
        ))
    }
}

impl Module for NxosIgmpModule {
    fn name(&self) -> &'static str {
        "nxos_igmp"
    }

    fn description(&self) -> &'static str {
        "Manage global IGMP settings on Cisco NX-OS (Nexus switches)"
    }

    fn required_params(&self) -> &[&'static str] {
        &["host"]
    }

    fn validate_params(&self, params: &ModuleParams) -> ModuleResult<()> {
        request_from_params(params).map(|_| ())
    }

    fn execute(
        &self,
        params: &ModuleParams,
        context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| {
            ModuleError::MissingDependency(
                "nxos_igmp needs a tokio runtime to drive the NX-API session".to_string(),
            )
        })?;

        // A current-thread runtime cannot run IO or timers while its only thread waits here
        if matches!(handle.runtime_flavor(), RuntimeFlavor::CurrentThread) {
            return Err(ModuleError::MissingDependency(
                "nxos_igmp needs a multi-thread tokio runtime; the current-thread runtime \
                 cannot drive the NX-API session while the module blocks"
                    .to_string(),
            ));
        }

        std::thread::scope(|s| {
            s.spawn(|| handle.block_on(self.execute_async(params, context)))
                .join()
                .map_err(|_| ModuleError::ExecutionFailed("nxos_igmp worker panicked".to_string()))?
        })
    }
}

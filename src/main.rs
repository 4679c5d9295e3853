//! nxos-igmp - Declarative global IGMP settings for Cisco NX-OS
//!
//! This is the main entry point for the nxos-igmp CLI.

mod cli;

use cli::output::OutputFormatter;
use cli::Cli;
use nxos_igmp::config::Config;
use nxos_igmp::modules::{ModuleContext, ModuleError, ModuleRegistry};
use nxos_igmp::Error;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Application version information
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    let output = OutputFormatter::new(!cli.no_color, cli.is_json());

    // A broken config file is reported but never fatal
    let (config, config_error) = match Config::load(cli.config.as_ref()) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    init_logging(cli.verbosity(), &config.logging.log_level);

    if let Some(e) = config_error {
        output.warning(&format!("Failed to load config: {}", e));
    }

    if cli.verbosity() >= 2 {
        eprintln!("nxos-igmp v{}", VERSION);
    }

    let exit_code = match run(&cli, config).await {
        Ok(result) => {
            output.print_result(&cli.host, &result);
            0
        }
        Err(e) => {
            tracing::debug!(error = ?e, "run failed");
            output.print_failure(&cli.host, &e);
            e.exit_code()
        }
    };

    std::process::exit(exit_code);
}

/// Run the `nxos_igmp` module once with the parsed arguments
async fn run(cli: &Cli, config: Config) -> Result<nxos_igmp::modules::ModuleOutput, Error> {
    let mut registry = ModuleRegistry::new();
    registry.register(Arc::new(config.build_module()));

    let params = cli.to_params();
    let context = ModuleContext::new()
        .with_check_mode(cli.check_mode)
        .with_diff_mode(cli.diff_mode);

    // Module execution blocks on the runtime, so keep it off the async workers
    let result = tokio::task::spawn_blocking(move || {
        registry.execute("nxos_igmp", &params, &context)
    })
    .await
    .map_err(task_error)?;

    Ok(result?)
}

/// A module task that panicked or was cancelled
fn task_error(e: tokio::task::JoinError) -> Error {
    ModuleError::ExecutionFailed(format!("module task failed: {}", e)).into()
}

/// Initialize logging based on verbosity level
fn init_logging(verbosity: u8, configured: &str) {
    let filter = match verbosity {
        0 => configured,
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity >= 3),
        )
        .with(env_filter)
        .init();
}

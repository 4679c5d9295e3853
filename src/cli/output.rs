//! Output formatting for the CLI
//!
//! Results go to stdout, failures to stderr. JSON mode emits a single object
//! per run so the output can be piped into other tools.

use colored::Colorize;
use nxos_igmp::modules::{Diff, ModuleOutput, ModuleStatus};
use nxos_igmp::Error;

/// Output formatter for CLI
#[derive(Debug, Clone)]
pub struct OutputFormatter {
    /// Whether to output JSON
    json_mode: bool,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, json_mode: bool) -> Self {
        let use_color = use_color && std::env::var_os("NO_COLOR").is_none();
        if !use_color {
            colored::control::set_override(false);
        }
        Self { json_mode }
    }

    /// Print the result of a run against `host`
    pub fn print_result(&self, host: &str, output: &ModuleOutput) {
        if self.json_mode {
            println!("{}", self.result_json(output));
            return;
        }

        let status = match output.status {
            ModuleStatus::Ok => "ok".green(),
            ModuleStatus::Changed => "changed".yellow(),
        };
        println!("{}: [{}] => {}", status, host.bright_white().bold(), output.msg);

        if let Some(diff) = &output.diff {
            self.print_diff(diff);
        }

        if !output.data.is_empty() {
            let data = serde_json::to_string_pretty(&output.data).unwrap_or_default();
            println!("{}", data);
        }
    }

    /// Print a failed run against `host`
    pub fn print_failure(&self, host: &str, error: &Error) {
        if self.json_mode {
            eprintln!("{}", Self::failure_json(error));
            return;
        }

        eprintln!(
            "{}: [{}] => {}",
            "FAILED!".red().bold(),
            host.bright_white().bold(),
            error
        );
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.json_mode {
            eprintln!("{}", serde_json::json!({"warning": message}));
        } else {
            eprintln!("{} {}", "[WARNING]".yellow().bold(), message);
        }
    }

    fn print_diff(&self, diff: &Diff) {
        if diff.before == diff.after {
            return;
        }
        for line in diff.before.lines() {
            println!("{}", format!("- {}", line).red());
        }
        for line in diff.after.lines() {
            println!("{}", format!("+ {}", line).green());
        }
        if let Some(details) = &diff.details {
            println!("{}", details.cyan());
        }
    }

    fn result_json(&self, output: &ModuleOutput) -> serde_json::Value {
        let mut value = serde_json::to_value(output).unwrap_or_default();
        if let Some(object) = value.as_object_mut() {
            object.insert("failed".to_string(), serde_json::Value::Bool(false));
        }
        value
    }

    fn failure_json(error: &Error) -> serde_json::Value {
        serde_json::json!({
            "failed": true,
            "changed": false,
            "msg": error.to_string(),
        })
    }
}

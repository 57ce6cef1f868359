use std::sync::Arc;

use colored::Colorize;

use crate::adapters::backends::{self, process::ProcessRunner};
use crate::cli::Cli;
use crate::cli::output;
use crate::config::app_config::AppConfig;
use crate::core::errors::Result;
use crate::core::models::backend_result::{BackendId, ToolStatus};
use crate::core::models::outcome::FailureKind;

/// Execute `decrypt-pdf --list-backends`.
///
/// Probes each backend's executable in cascade order. Exits 0 when at least
/// one is usable, otherwise with the "no backend" code.
pub fn execute(args: &Cli) -> Result<i32> {
    let config = AppConfig::load(args.config.as_deref())?;
    let order = args
        .backends
        .clone()
        .or_else(|| config.backend_order())
        .unwrap_or_else(|| BackendId::DEFAULT_ORDER.to_vec());

    let runner = Arc::new(ProcessRunner::new()?);
    let mut rows = Vec::with_capacity(order.len());
    for id in order {
        let backend = backends::build(id, &config.tools, Arc::clone(&runner));
        rows.push((id, backend.status()?));
    }

    if args.json {
        let entries: Vec<serde_json::Value> = rows
            .iter()
            .map(|(id, status)| serde_json::json!({ "backend": id, "tool": status }))
            .collect();
        let json = serde_json::to_string_pretty(&entries).map_err(std::io::Error::from)?;
        println!("{json}");
    } else {
        output::header("Backends (in cascade order)");
        for (id, status) in &rows {
            match status {
                ToolStatus::Available { program, version } => println!(
                    "  {} {:<12} {} ({})",
                    "✓".green(),
                    id.as_str(),
                    version,
                    program.display()
                ),
                ToolStatus::Missing { program, reason } => {
                    println!(
                        "  {} {:<12} {} ({})",
                        "✗".red(),
                        id.as_str(),
                        "not available".dimmed(),
                        program.display()
                    );
                    output::detail(reason);
                }
            }
        }
    }

    if rows.iter().any(|(_, status)| status.is_available()) {
        Ok(0)
    } else {
        Ok(FailureKind::NoBackendAvailable.exit_code())
    }
}

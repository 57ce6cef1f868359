use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use indicatif::ProgressBar;

use crate::adapters::backends::{self, process::ProcessRunner};
use crate::cli::Cli;
use crate::cli::output;
use crate::config::app_config::{AppConfig, DEFAULT_TIMEOUT};
use crate::core::errors::{DecryptPdfError, Result};
use crate::core::models::backend_result::{BackendId, BackendResult, Outcome};
use crate::core::models::outcome::{DecryptionOutcome, FailureKind};
use crate::core::models::request::DecryptionRequest;
use crate::core::services::orchestrator::Orchestrator;
use crate::core::traits::observer::CascadeObserver;

/// Execute a decryption run and return the process exit code.
///
/// Argument and I/O problems come back as `Err`; a cascade in which every
/// backend failed is a normal result whose exit code names the failure class.
pub fn execute(args: &Cli) -> Result<i32> {
    let config = AppConfig::load(args.config.as_deref())?;

    let input = args
        .input
        .clone()
        .ok_or_else(|| DecryptPdfError::InvalidArgument {
            detail: "missing INPUT.pdf".into(),
        })?;
    let order = args
        .backends
        .clone()
        .or_else(|| config.backend_order())
        .unwrap_or_else(|| BackendId::DEFAULT_ORDER.to_vec());
    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .or_else(|| config.timeout())
        .unwrap_or(DEFAULT_TIMEOUT);

    let request = DecryptionRequest::new(
        input,
        args.output.clone(),
        args.password.clone(),
        order,
        timeout,
        args.force,
    )?;

    let runner = Arc::new(ProcessRunner::new()?);
    let registry = backends::registry(&config.tools, Arc::clone(&runner));
    let orchestrator = Orchestrator::new(registry).with_interrupt(runner);

    output::header(&format!("Decrypting {}", request.input().display()));
    output::detail(&format!("Output: {}", request.output().display()));
    output::detail(&format!(
        "Backends: {}",
        request
            .backends()
            .iter()
            .map(|b| b.as_str())
            .collect::<Vec<_>>()
            .join(" → ")
    ));
    output::detail(&format!("Timeout: {}s per backend", timeout.as_secs()));
    output::detail(if request.password().is_some() {
        "Password: supplied"
    } else {
        "Password: none"
    });

    if args.json {
        let outcome = orchestrator.decrypt(&request)?;
        let json = serde_json::to_string_pretty(&outcome).map_err(std::io::Error::from)?;
        println!("{json}");
        return Ok(outcome.exit_code());
    }

    let mut progress = Progress::default();
    let outcome = orchestrator.decrypt_observed(&request, &mut progress)?;
    output::detail(&format!("{} backend(s) tried", outcome.attempts().len()));
    report(&request, &outcome);

    Ok(outcome.exit_code())
}

/// Spinner and per-attempt lines while the cascade runs.
#[derive(Default)]
struct Progress {
    spinner: Option<ProgressBar>,
}

impl CascadeObserver for Progress {
    fn attempt_started(&mut self, backend: BackendId) {
        self.spinner = Some(output::spinner(&format!("Trying {backend}...")));
    }

    fn attempt_finished(&mut self, result: &BackendResult) {
        if let Some(sp) = self.spinner.take() {
            output::finish_spinner(sp);
        }

        let took = output::seconds(result.elapsed);
        let diagnostic = result.diagnostic.as_deref().unwrap_or_default();
        match result.outcome {
            Outcome::Success => output::success(&format!("{}: decrypted ({took})", result.backend)),
            Outcome::ToolMissing => {
                output::warning(&format!("{}: not installed, skipping", result.backend));
                output::detail(diagnostic);
            }
            Outcome::ToolError => output::warning(&format!(
                "{}: failed ({took}): {}",
                result.backend,
                output::first_line(diagnostic, 120)
            )),
            Outcome::WrongPassword | Outcome::UnsupportedEncryption => {
                output::warning(&format!("{}: {} ({took})", result.backend, result.outcome));
                output::detail(diagnostic);
            }
        }
    }

    fn passing_through(&mut self) {
        output::detail("No encryption dictionary found, copying input through");
    }
}

fn report(request: &DecryptionRequest, outcome: &DecryptionOutcome) {
    match outcome {
        DecryptionOutcome::Decrypted {
            backend, output, ..
        } => {
            println!(
                "  {} Decrypted with {}: {}",
                "✓".green(),
                backend.as_str().bold(),
                output.display()
            );
        }
        DecryptionOutcome::PassThrough { output } => {
            println!(
                "  {} {} is not encrypted, copied to {} (pass-through)",
                "✓".green(),
                request.input().display(),
                output.display()
            );
        }
        DecryptionOutcome::Failed { kind, attempts } => {
            output::error(&format!("Decryption failed: {}", kind.summary()));
            eprintln!();
            for line in summary_table(attempts) {
                eprintln!("{line}");
            }
            eprintln!();
            eprintln!("  {}", hint(*kind, request.password().is_some()));
        }
    }
}

/// One row per attempted backend, in attempt order.
fn summary_table(attempts: &[BackendResult]) -> Vec<String> {
    let mut lines = vec![format!(
        "    {:<12} {:<24} {:>8}  {}",
        "BACKEND", "OUTCOME", "TIME", "DETAIL"
    )];
    lines.extend(attempts.iter().map(|r| {
        format!(
            "    {:<12} {:<24} {:>8}  {}",
            r.backend.as_str(),
            r.outcome.label(),
            output::seconds(r.elapsed),
            output::first_line(r.diagnostic.as_deref().unwrap_or_default(), 80)
        )
    }));
    lines
}

fn hint(kind: FailureKind, password_given: bool) -> &'static str {
    match kind {
        FailureKind::WrongPassword if password_given => {
            "Check the password and try again: decrypt-pdf --password <PASS> ..."
        }
        FailureKind::WrongPassword => {
            "This PDF needs a password to open: decrypt-pdf --password <PASS> ..."
        }
        FailureKind::UnsupportedEncryption => {
            "The encryption scheme (e.g. certificate-based security) is not supported by the installed tools."
        }
        FailureKind::NoBackendAvailable => {
            "Install at least one of: qpdf, mupdf-tools (mutool), ghostscript (gs)."
        }
        FailureKind::ExhaustedBackends => {
            "Run with --verbose for full diagnostics, or try another backend order with --backends."
        }
    }
}

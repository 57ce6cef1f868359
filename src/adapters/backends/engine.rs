use std::borrow::Cow;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::adapters::backends::process::{ProcessRunner, Termination};
use crate::core::errors::{DecryptPdfError, Result};
use crate::core::models::backend_result::{BackendId, BackendResult, Outcome, ToolStatus};
use crate::core::models::request::DecryptionRequest;
use crate::core::services::pdf_probe;
use crate::core::services::staged_output::StagedOutput;
use crate::core::traits::backend::DecryptBackend;

/// Diagnostics longer than this are cut.
const MAX_DIAGNOSTIC_BYTES: usize = 2000;

/// `--version` probes never need long.
const VERSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Arguments (and optional stdin) for one tool run.
#[derive(Debug, Default)]
pub struct Invocation {
    pub args: Vec<OsString>,
    pub stdin: Option<Vec<u8>>,
}

/// Lower-cased fragments that identify a failure class in a tool's output.
pub struct Signatures {
    pub wrong_password: &'static [&'static str],
    pub unsupported: &'static [&'static str],
}

impl Signatures {
    /// Map tool output onto `WrongPassword` / `UnsupportedEncryption`.
    pub fn classify(&self, text: &str) -> Option<Outcome> {
        let text = text.to_lowercase();
        if self.wrong_password.iter().any(|s| text.contains(s)) {
            Some(Outcome::WrongPassword)
        } else if self.unsupported.iter().any(|s| text.contains(s)) {
            Some(Outcome::UnsupportedEncryption)
        } else {
            None
        }
    }
}

/// Argument conventions and error signatures of one external engine.
pub trait Engine: Send + Sync {
    fn id(&self) -> BackendId;

    /// Executable name looked up on `PATH` when no override is configured.
    fn default_program(&self) -> &'static str;

    fn version_args(&self) -> &'static [&'static str];

    fn invocation(&self, input: &Path, output: &Path, password: Option<&str>) -> Invocation;

    fn signatures(&self) -> &'static Signatures;

    /// Exit codes after which the output is worth verifying.
    fn exit_ok(&self, code: Option<i32>) -> bool {
        code == Some(0)
    }
}

/// A `DecryptBackend` that drives an `Engine` through a `ProcessRunner`.
///
/// The tool always writes to a staged file next to the output; the staged
/// file is renamed into place only once it is verified as a non-empty,
/// unencrypted PDF.
pub struct ToolBackend<E: Engine> {
    engine: E,
    program: PathBuf,
    runner: Arc<ProcessRunner>,
}

impl<E: Engine> ToolBackend<E> {
    pub fn new(engine: E, program: Option<PathBuf>, runner: Arc<ProcessRunner>) -> Self {
        let program = program.unwrap_or_else(|| PathBuf::from(engine.default_program()));
        Self {
            engine,
            program,
            runner,
        }
    }

    fn classify_exit(
        &self,
        code: Option<i32>,
        text: String,
        staged: StagedOutput,
        input: &Path,
    ) -> Result<(Outcome, Option<String>)> {
        let mut rejection = None;
        if self.engine.exit_ok(code) {
            let probe = pdf_probe::probe(staged.path())?;
            if probe.is_decrypted_pdf() {
                staged.copy_permissions_from(input)?;
                staged.commit()?;
                return Ok((Outcome::Success, non_empty(text)));
            }
            rejection = Some(if probe.len == 0 {
                "tool reported success but wrote no output"
            } else if !probe.is_pdf {
                "tool output is not a PDF"
            } else {
                "tool output is still encrypted"
            });
        }

        if let Some(outcome) = self.engine.signatures().classify(&text) {
            return Ok((outcome, non_empty(text)));
        }

        let detail = match (rejection, code) {
            (Some(reason), _) => reason.to_string(),
            (None, Some(code)) => format!("exited with code {code}"),
            (None, None) => "terminated by a signal".to_string(),
        };
        let diagnostic = match non_empty(text) {
            Some(text) => format!("{detail}: {text}"),
            None => detail,
        };
        Ok((Outcome::ToolError, Some(diagnostic)))
    }
}

impl<E: Engine> DecryptBackend for ToolBackend<E> {
    fn id(&self) -> BackendId {
        self.engine.id()
    }

    fn attempt(&self, request: &DecryptionRequest) -> Result<BackendResult> {
        let started = Instant::now();
        let staged = StagedOutput::create(request.output())?;
        let invocation = self.engine.invocation(
            &as_operand(request.input()),
            &as_operand(staged.path()),
            request.password(),
        );

        let termination = self.runner.run(
            &self.program,
            &invocation.args,
            invocation.stdin.as_deref(),
            request.timeout(),
        )?;
        // Ctrl-C can land just as the tool exits; never commit after it.
        if self.runner.is_cancelled() {
            return Err(DecryptPdfError::Cancelled);
        }

        let (outcome, diagnostic) = match termination {
            Termination::NotFound(e) => (
                Outcome::ToolMissing,
                Some(format!("cannot run {}: {e}", self.program.display())),
            ),
            Termination::TimedOut => (
                Outcome::ToolError,
                Some(format!(
                    "timed out after {}s and was killed",
                    request.timeout().as_secs()
                )),
            ),
            Termination::Exited {
                code,
                stdout,
                stderr,
            } => self.classify_exit(
                code,
                diagnostic_text(&stderr, &stdout),
                staged,
                request.input(),
            )?,
        };

        Ok(BackendResult::new(
            self.engine.id(),
            outcome,
            diagnostic,
            started.elapsed(),
        ))
    }

    fn status(&self) -> Result<ToolStatus> {
        let args: Vec<OsString> = self
            .engine
            .version_args()
            .iter()
            .map(OsString::from)
            .collect();

        let status = match self
            .runner
            .run(&self.program, &args, None, VERSION_TIMEOUT)?
        {
            Termination::Exited { stdout, stderr, .. } => ToolStatus::Available {
                program: self.program.clone(),
                version: diagnostic_text(&stdout, &stderr)
                    .lines()
                    .next()
                    .unwrap_or("unknown version")
                    .to_string(),
            },
            Termination::TimedOut => ToolStatus::Missing {
                program: self.program.clone(),
                reason: "did not answer a version query".into(),
            },
            Termination::NotFound(e) => ToolStatus::Missing {
                program: self.program.clone(),
                reason: e.to_string(),
            },
        };
        Ok(status)
    }
}

/// A relative path starting with `-` would be read as an option; anchor it
/// to the current directory instead.
fn as_operand(path: &Path) -> Cow<'_, Path> {
    if path.is_relative() && path.as_os_str().to_string_lossy().starts_with('-') {
        Cow::Owned(Path::new(".").join(path))
    } else {
        Cow::Borrowed(path)
    }
}

/// Prefer `primary`, fall back to `secondary`, trimmed and bounded.
fn diagnostic_text(primary: &str, secondary: &str) -> String {
    let text = match primary.trim() {
        "" => secondary.trim(),
        text => text,
    };
    truncate(text, MAX_DIAGNOSTIC_BYTES)
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}

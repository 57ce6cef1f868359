use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::errors::{DecryptPdfError, Result};
use crate::core::models::backend_result::BackendId;

/// Suffix appended to the input stem when no output path is given.
pub const DECRYPTED_SUFFIX: &str = "-decrypted";

/// Everything needed for one cascade, validated once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct DecryptionRequest {
    input: PathBuf,
    output: PathBuf,
    password: Option<String>,
    backends: Vec<BackendId>,
    timeout: Duration,
}

impl DecryptionRequest {
    /// Build a request, checking that the input is readable, the output
    /// directory exists and the backend list is usable.
    ///
    /// An existing output file is refused unless `overwrite` is set or it is
    /// the input itself (in-place decryption).
    pub fn new(
        input: PathBuf,
        output: Option<PathBuf>,
        password: Option<String>,
        backends: Vec<BackendId>,
        timeout: Duration,
        overwrite: bool,
    ) -> Result<Self> {
        if !input.is_file() {
            return Err(DecryptPdfError::InputNotFound { path: input });
        }
        File::open(&input).map_err(|e| DecryptPdfError::InputUnreadable {
            path: input.clone(),
            reason: e.to_string(),
        })?;

        let output = output.unwrap_or_else(|| default_output_path(&input));
        let parent = output_dir(&output);
        if !parent.is_dir() {
            return Err(DecryptPdfError::OutputDirMissing {
                path: parent.to_path_buf(),
            });
        }
        if output.exists() && !overwrite && !same_file(&input, &output) {
            return Err(DecryptPdfError::OutputExists { path: output });
        }

        if backends.is_empty() {
            return Err(DecryptPdfError::InvalidArgument {
                detail: "at least one backend must be selected".into(),
            });
        }
        let mut seen = HashSet::new();
        if let Some(dup) = backends.iter().find(|b| !seen.insert(**b)) {
            return Err(DecryptPdfError::InvalidArgument {
                detail: format!("backend '{dup}' listed more than once"),
            });
        }

        if timeout.is_zero() {
            return Err(DecryptPdfError::InvalidArgument {
                detail: "timeout must be at least one second".into(),
            });
        }

        Ok(Self {
            input,
            output,
            password: password.filter(|p| !p.is_empty()),
            backends,
            timeout,
        })
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn backends(&self) -> &[BackendId] {
        &self.backends
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// True when the output path refers to the input file.
    pub fn is_in_place(&self) -> bool {
        same_file(&self.input, &self.output)
    }
}

/// `dir/name.pdf` → `dir/name-decrypted.pdf`. Inputs without an extension
/// get `.pdf`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".into());
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pdf".into());
    input.with_file_name(format!("{stem}{DECRYPTED_SUFFIX}.{ext}"))
}

/// Directory that will receive `output`; a bare file name lives in `.`.
pub fn output_dir(output: &Path) -> &Path {
    match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

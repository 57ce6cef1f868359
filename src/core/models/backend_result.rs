use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

/// Identifier of one external decryption engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendId {
    Qpdf,
    Mutool,
    Ghostscript,
}

impl BackendId {
    /// Cascade order used when neither the CLI nor the config overrides it:
    /// fastest and most faithful first, most permissive last.
    pub const DEFAULT_ORDER: [BackendId; 3] =
        [BackendId::Qpdf, BackendId::Mutool, BackendId::Ghostscript];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendId::Qpdf => "qpdf",
            BackendId::Mutool => "mutool",
            BackendId::Ghostscript => "ghostscript",
        }
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qpdf" => Ok(BackendId::Qpdf),
            "mutool" | "mupdf" => Ok(BackendId::Mutool),
            "ghostscript" | "gs" => Ok(BackendId::Ghostscript),
            other => Err(format!(
                "unknown backend '{other}' (expected qpdf, mutool or ghostscript)"
            )),
        }
    }
}

/// How a single backend attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    WrongPassword,
    UnsupportedEncryption,
    ToolMissing,
    ToolError,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::WrongPassword => "wrong password",
            Outcome::UnsupportedEncryption => "unsupported encryption",
            Outcome::ToolMissing => "tool missing",
            Outcome::ToolError => "tool error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of one backend attempt. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendResult {
    pub backend: BackendId,
    pub outcome: Outcome,
    pub diagnostic: Option<String>,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl BackendResult {
    pub fn new(
        backend: BackendId,
        outcome: Outcome,
        diagnostic: Option<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            backend,
            outcome,
            diagnostic,
            elapsed,
        }
    }

    /// Shorthand for an attempt that never got to run its tool.
    pub fn missing(backend: BackendId, diagnostic: impl Into<String>) -> Self {
        Self::new(
            backend,
            Outcome::ToolMissing,
            Some(diagnostic.into()),
            Duration::ZERO,
        )
    }
}

/// Whether an engine's executable can be started on this system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolStatus {
    Available { program: PathBuf, version: String },
    Missing { program: PathBuf, reason: String },
}

impl ToolStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, ToolStatus::Available { .. })
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis().try_into().unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_names_and_aliases() {
        assert_eq!("qpdf".parse::<BackendId>().unwrap(), BackendId::Qpdf);
        assert_eq!("MuPDF".parse::<BackendId>().unwrap(), BackendId::Mutool);
        assert_eq!(" gs ".parse::<BackendId>().unwrap(), BackendId::Ghostscript);
        assert_eq!(
            "ghostscript".parse::<BackendId>().unwrap(),
            BackendId::Ghostscript
        );
    }

    #[test]
    fn rejects_unknown_backend() {
        let err = "pdftk".parse::<BackendId>().unwrap_err();
        assert!(err.contains("unknown backend 'pdftk'"));
    }

    #[test]
    fn default_order_is_qpdf_mutool_ghostscript() {
        let names: Vec<&str> = BackendId::DEFAULT_ORDER.iter().map(|b| b.as_str()).collect();
        assert_eq!(names, ["qpdf", "mutool", "ghostscript"]);
    }

    #[test]
    fn serializes_elapsed_as_millis() {
        let result = BackendResult::new(
            BackendId::Mutool,
            Outcome::WrongPassword,
            None,
            Duration::from_millis(1500),
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["backend"], "mutool");
        assert_eq!(json["outcome"], "wrong_password");
        assert_eq!(json["elapsed_ms"], 1500);
    }
}

use std::ffi::OsString;
use std::path::Path;

use crate::adapters::backends::engine::{Engine, Invocation, Signatures};
use crate::core::models::backend_result::BackendId;

static SIGNATURES: Signatures = Signatures {
    wrong_password: &[
        "password did not work",
        "requires a password",
        "invalid password",
    ],
    unsupported: &[
        "unknown security handler",
        "unsupported encryption",
        "encryption method not supported",
    ],
};

/// Ghostscript re-rendering through the `pdfwrite` device. Slowest and most
/// permissive, so it comes last by default.
pub struct Ghostscript;

impl Engine for Ghostscript {
    fn id(&self) -> BackendId {
        BackendId::Ghostscript
    }

    fn default_program(&self) -> &'static str {
        if cfg!(windows) { "gswin64c" } else { "gs" }
    }

    fn version_args(&self) -> &'static [&'static str] {
        &["--version"]
    }

    fn invocation(&self, input: &Path, output: &Path, password: Option<&str>) -> Invocation {
        let mut args: Vec<OsString> = [
            "-q",
            "-dNOPAUSE",
            "-dBATCH",
            "-dSAFER",
            "-sDEVICE=pdfwrite",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();

        if let Some(p) = password {
            args.push(OsString::from(format!("-sPDFPassword={p}")));
        }

        let mut out = OsString::from("-sOutputFile=");
        // `%` starts a page-number template in gs output names.
        match output.to_str() {
            Some(s) => out.push(s.replace('%', "%%")),
            None => out.push(output.as_os_str()),
        }
        args.push(out);
        args.push(input.as_os_str().to_os_string());

        Invocation { args, stdin: None }
    }

    fn signatures(&self) -> &'static Signatures {
        &SIGNATURES
    }
}

use std::ffi::OsString;
use std::path::Path;

use crate::adapters::backends::engine::{Engine, Invocation, Signatures};
use crate::core::models::backend_result::BackendId;

static SIGNATURES: Signatures = Signatures {
    wrong_password: &["invalid password"],
    unsupported: &["unknown security handler", "unsupported", "not yet supported"],
};

/// qpdf: `qpdf --decrypt [--password-file=-] IN OUT`.
///
/// The password is fed on stdin so it never shows up in the process list.
pub struct Qpdf;

impl Engine for Qpdf {
    fn id(&self) -> BackendId {
        BackendId::Qpdf
    }

    fn default_program(&self) -> &'static str {
        "qpdf"
    }

    fn version_args(&self) -> &'static [&'static str] {
        &["--version"]
    }

    fn invocation(&self, input: &Path, output: &Path, password: Option<&str>) -> Invocation {
        let mut args = vec![OsString::from("--decrypt")];
        let stdin = password.map(|p| {
            args.push(OsString::from("--password-file=-"));
            format!("{p}\n").into_bytes()
        });
        args.push(input.as_os_str().to_os_string());
        args.push(output.as_os_str().to_os_string());
        Invocation { args, stdin }
    }

    fn signatures(&self) -> &'static Signatures {
        &SIGNATURES
    }

    /// qpdf exits 3 when it wrote the file but printed warnings.
    fn exit_ok(&self, code: Option<i32>) -> bool {
        matches!(code, Some(0) | Some(3))
    }
}

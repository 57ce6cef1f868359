use std::ffi::OsString;
use std::path::Path;

use crate::adapters::backends::engine::{Engine, Invocation, Signatures};
use crate::core::models::backend_result::BackendId;

static SIGNATURES: Signatures = Signatures {
    wrong_password: &[
        "cannot authenticate password",
        "needs a password",
        "invalid password",
    ],
    unsupported: &[
        "unknown crypt",
        "unsupported crypt",
        "unknown encryption",
        "unsupported encryption",
    ],
};

/// MuPDF's `mutool clean -D [-p PASS] IN OUT`.
pub struct Mutool;

impl Engine for Mutool {
    fn id(&self) -> BackendId {
        BackendId::Mutool
    }

    fn default_program(&self) -> &'static str {
        "mutool"
    }

    fn version_args(&self) -> &'static [&'static str] {
        &["-v"]
    }

    fn invocation(&self, input: &Path, output: &Path, password: Option<&str>) -> Invocation {
        let mut args = vec![OsString::from("clean"), OsString::from("-D")];
        if let Some(p) = password {
            args.push(OsString::from("-p"));
            args.push(OsString::from(p));
        }
        args.push(input.as_os_str().to_os_string());
        args.push(output.as_os_str().to_os_string());
        Invocation { args, stdin: None }
    }

    fn signatures(&self) -> &'static Signatures {
        &SIGNATURES
    }
}

pub mod commands;
pub mod context;
pub mod output;

use std::path::PathBuf;

use clap::Parser;

use crate::core::models::backend_result::BackendId;

/// Decrypt password-protected PDFs using a cascading strategy (qpdf, mutool, ghostscript).
///
/// Backends are tried one after another until one produces an unencrypted
/// copy. Exit codes: 0 success, 1 error, 2 wrong password, 3 unsupported
/// encryption, 4 no backend tool installed.
#[derive(Parser, Debug)]
#[command(name = "decrypt-pdf", version, about)]
pub struct Cli {
    /// Encrypted PDF to decrypt
    #[arg(value_name = "INPUT.pdf", required_unless_present = "list_backends")]
    pub input: Option<PathBuf>,

    /// Password (user or owner) to open the PDF with
    #[arg(
        short,
        long,
        value_name = "PASS",
        env = "DECRYPT_PDF_PASSWORD",
        hide_env_values = true
    )]
    pub password: Option<String>,

    /// Where to write the decrypted PDF (default: INPUT-decrypted.pdf)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Comma-separated backend order, e.g. "mutool,qpdf" (default: qpdf,mutool,ghostscript)
    #[arg(short, long, value_name = "ORDER", value_delimiter = ',')]
    pub backends: Option<Vec<BackendId>>,

    /// Per-backend timeout in seconds (default: 30)
    #[arg(
        short,
        long,
        value_name = "SECONDS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: Option<u64>,

    /// Overwrite the output file if it already exists
    #[arg(short, long)]
    pub force: bool,

    /// Show which backend tools are installed and exit
    #[arg(long)]
    pub list_backends: bool,

    /// Path to an alternative config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Quiet mode: only show errors and the result
    #[arg(short, long)]
    pub quiet: bool,
}

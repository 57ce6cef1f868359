mod adapters;
mod cli;
mod config;
mod core;

use clap::Parser;

use crate::cli::Cli;
use crate::core::errors::DecryptPdfError;

/// Conventional exit status for a run stopped by Ctrl-C.
const EXIT_INTERRUPTED: i32 = 130;

fn main() {
    // clap exits with 2 on bad arguments, which is reserved for "wrong password".
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    cli::context::init(args.verbose, args.quiet, args.json);

    let result = if args.list_backends {
        cli::commands::list_backends::execute(&args)
    } else {
        cli::commands::decrypt::execute(&args)
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(DecryptPdfError::Cancelled) => {
            cli::output::error(&DecryptPdfError::Cancelled.to_string());
            std::process::exit(EXIT_INTERRUPTED);
        }
        Err(e) => {
            cli::output::error(&format!("Error: {e}"));
            std::process::exit(1);
        }
    }
}

use std::path::PathBuf;

/// All fatal errors for decrypt-pdf.
///
/// Per-backend failures are not errors: they are reported as
/// `BackendResult` values and only surface through the final outcome.
#[derive(Debug, thiserror::Error)]
pub enum DecryptPdfError {
    #[error(
        "Input file not found: {path}\n\n  \
         Check that the path is correct and the file exists."
    )]
    InputNotFound { path: PathBuf },

    #[error("Cannot read input file {path}: {reason}")]
    InputUnreadable { path: PathBuf, reason: String },

    #[error(
        "Not a PDF file: {path}\n\n  \
         The file does not start with a %PDF- header.\n  \
         decrypt-pdf only handles PDF documents."
    )]
    NotAPdf { path: PathBuf },

    #[error(
        "Output directory does not exist: {path}\n\n  \
         Create it first or choose another location with --output."
    )]
    OutputDirMissing { path: PathBuf },

    #[error(
        "Output file already exists: {path}\n\n  \
         Solutions:\n    \
         → Overwrite it: decrypt-pdf --force ...\n    \
         → Choose another location: decrypt-pdf --output <path> ..."
    )]
    OutputExists { path: PathBuf },

    #[error("Invalid argument: {detail}")]
    InvalidArgument { detail: String },

    #[error(
        "Invalid configuration in {path}: {detail}\n\n  \
         Fix or remove that file, or pass another one with --config."
    )]
    InvalidConfig { path: PathBuf, detail: String },

    #[error("Interrupted: decryption cancelled, temporary output removed")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DecryptPdfError>;

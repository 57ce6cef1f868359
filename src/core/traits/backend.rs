use crate::core::errors::Result;
use crate::core::models::backend_result::{BackendId, BackendResult, ToolStatus};
use crate::core::models::request::DecryptionRequest;

/// Port for external decryption engines.
///
/// Implementations live in `adapters::backends` (qpdf, mutool, ghostscript).
/// The orchestrator only depends on this trait, never on a concrete engine.
pub trait DecryptBackend: Send + Sync {
    /// Which engine this is.
    fn id(&self) -> BackendId;

    /// Try to decrypt `request.input()` into `request.output()`.
    ///
    /// Every engine-level failure (missing tool, wrong password, crash,
    /// timeout) is reported in the returned `BackendResult`. `Err` is reserved
    /// for cancellation and I/O failures outside the tool itself.
    fn attempt(&self, request: &DecryptionRequest) -> Result<BackendResult>;

    /// Check whether the engine can run here, without touching any PDF.
    fn status(&self) -> Result<ToolStatus>;
}

pub mod engine;
pub mod ghostscript;
pub mod mutool;
pub mod process;
pub mod qpdf;

use std::sync::Arc;

use crate::config::app_config::ToolsSection;
use crate::core::models::backend_result::BackendId;
use crate::core::traits::backend::DecryptBackend;

use engine::ToolBackend;
use ghostscript::Ghostscript;
use mutool::Mutool;
use process::ProcessRunner;
use qpdf::Qpdf;

/// Build the adapter for `id`, honouring any executable override in `tools`.
pub fn build(
    id: BackendId,
    tools: &ToolsSection,
    runner: Arc<ProcessRunner>,
) -> Box<dyn DecryptBackend> {
    let program = tools.program(id);
    match id {
        BackendId::Qpdf => Box::new(ToolBackend::new(Qpdf, program, runner)),
        BackendId::Mutool => Box::new(ToolBackend::new(Mutool, program, runner)),
        BackendId::Ghostscript => Box::new(ToolBackend::new(Ghostscript, program, runner)),
    }
}

/// Every known engine, in default cascade order.
pub fn registry(
    tools: &ToolsSection,
    runner: Arc<ProcessRunner>,
) -> Vec<Box<dyn DecryptBackend>> {
    BackendId::DEFAULT_ORDER
        .into_iter()
        .map(|id| build(id, tools, Arc::clone(&runner)))
        .collect()
}

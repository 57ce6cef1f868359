pub mod orchestrator;
pub mod pdf_probe;
pub mod staged_output;

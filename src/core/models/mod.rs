pub mod backend_result;
pub mod outcome;
pub mod request;

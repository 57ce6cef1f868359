use crate::core::models::backend_result::{BackendId, BackendResult};

/// Progress hooks for a running cascade.
pub trait CascadeObserver {
    fn attempt_started(&mut self, _backend: BackendId) {}

    fn attempt_finished(&mut self, _result: &BackendResult) {}

    /// The input needed no decryption and is being copied through.
    fn passing_through(&mut self) {}
}

/// Observer that ignores every event.
pub struct Silent;

impl CascadeObserver for Silent {}

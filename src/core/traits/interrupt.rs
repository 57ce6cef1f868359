/// Port through which the user's request to stop (Ctrl-C) reaches the core.
///
/// Checked between steps of a cascade; an in-flight tool run is stopped by
/// the adapter that started it.
pub trait Interrupt: Send + Sync {
    fn is_interrupted(&self) -> bool;
}

/// Source that never interrupts.
pub struct Never;

impl Interrupt for Never {
    fn is_interrupted(&self) -> bool {
        false
    }
}

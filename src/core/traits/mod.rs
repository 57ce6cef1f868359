pub mod backend;
pub mod interrupt;
pub mod observer;

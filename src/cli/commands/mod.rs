pub mod decrypt;
pub mod list_backends;

//! Repository layer for database operations.

pub mod config;
pub mod documents;

pub use config::ConfigRepo;
pub use documents::DocumentRepo;

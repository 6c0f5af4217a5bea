//! Storage backends for sealed credential records
//!
//! This module provides two backends:
//! 1. In-memory (tests, ephemeral servers)
//! 2. JSON file in the platform data directory

mod traits;
mod records;
mod memory;
mod file;

pub use traits::CredentialStore;
pub use memory::MemoryCredentialStore;
pub use file::FileCredentialStore;

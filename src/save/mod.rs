//! Save/load system
//!
//! Local key-value storage used to persist progression state between runs.

pub mod store;
pub mod file_store;

pub use store::{KeyValueStore, MemoryStore, SharedStore, StorageError};
pub use file_store::{FileStore, default_home_dir};

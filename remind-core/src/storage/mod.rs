//! Storage module
//!
//! Provides the key-value storage that note state is persisted to.

pub mod defaults;

pub use defaults::{FileDefaults, KeyValueStore, MemoryDefaults};

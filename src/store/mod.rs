//! Event persistence
//!
//! The sync engine only needs two operations from storage: look an event up
//! by its natural key and save it. [`EventRepository`] captures that
//! contract; [`memory`] and [`json_file`] implement it.

use crate::Event;
use async_trait::async_trait;
use std::sync::Arc;

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileEventRepository;
pub use memory::InMemoryEventRepository;

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(String),

    /// Encoding or decoding the store failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Advisory lock could not be taken
    #[error("lock error: {0}")]
    Lock(String),

    /// Store file was written by an incompatible version
    #[error("schema version mismatch: expected {expected}, found {found}")]
    SchemaVersionMismatch {
        /// Version this build writes
        expected: String,
        /// Version found on disk
        found: String,
    },

    /// Store file exceeds the size cap
    #[error("store file too large: {size} bytes (max: {max} bytes)")]
    TooLarge {
        /// Actual size
        size: u64,
        /// Allowed size
        max: u64,
    },

    /// The record failed validation
    #[error("event rejected: {0}")]
    Rejected(String),
}

/// Result type for repository operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage for synchronized events, keyed by `(event_code, season_year)`
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Stored event with this natural key
    async fn find_by_natural_key(&self, event_code: &str, season_year: i32) -> StoreResult<Option<Event>>;

    /// Insert or replace by natural key, assigning an id on first save.
    /// Returns the stored record.
    async fn save(&self, event: Event) -> StoreResult<Event>;

    /// Number of stored events
    async fn count(&self) -> StoreResult<usize>;

    /// All stored events ordered by season then code
    async fn find_all(&self) -> StoreResult<Vec<Event>>;
}

/// Shared repository handle
pub type SharedRepository = Arc<dyn EventRepository>;

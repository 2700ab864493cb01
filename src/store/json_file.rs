//! JSON file event repository
//!
//! The whole store is one versioned JSON document. Every save rewrites it
//! atomically: write to a temp file in the same directory, flush, fsync,
//! rename over the target, then fsync the directory. An advisory lock on a
//! sibling `.lock` file keeps two processes from interleaving writes.

use async_trait::async_trait;
use fd_lock::RwLock as FileLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{EventRepository, StoreError, StoreResult};
use crate::{Event, EventKey};

/// Store document schema version
const SCHEMA_VERSION: &str = "1.0.0";

/// Maximum store file size (50 MB)
pub const MAX_STORE_FILE_SIZE: u64 = 50 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    schema_version: String,
    next_id: u64,
    events: Vec<Event>,
}

#[derive(Debug, Default)]
struct StoreState {
    events: HashMap<EventKey, Event>,
    next_id: u64,
}

impl StoreState {
    fn to_document(&self) -> StoreDocument {
        let mut events: Vec<Event> = self.events.values().cloned().collect();
        events.sort_by(|a, b| (a.season_year, &a.event_code).cmp(&(b.season_year, &b.event_code)));
        StoreDocument {
            schema_version: SCHEMA_VERSION.to_string(),
            next_id: self.next_id,
            events,
        }
    }
}

/// Repository persisted to a JSON file
#[derive(Debug)]
pub struct JsonFileEventRepository {
    path: PathBuf,
    state: RwLock<StoreState>,
}

impl JsonFileEventRepository {
    /// Open the store at `path`, loading it if the file exists
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let load_path = path.clone();
        let state = tokio::task::spawn_blocking(move || load_state(&load_path))
            .await
            .map_err(|e| StoreError::Io(format!("store load task failed: {e}")))??;

        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    /// Location of the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, state: &StoreState) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(&state.to_document())
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &json))
            .await
            .map_err(|e| StoreError::Io(format!("store write task failed: {e}")))?
    }
}

#[async_trait]
impl EventRepository for JsonFileEventRepository {
    async fn find_by_natural_key(&self, event_code: &str, season_year: i32) -> StoreResult<Option<Event>> {
        let key = EventKey::new(event_code, season_year);
        Ok(self.state.read().await.events.get(&key).cloned())
    }

    async fn save(&self, mut event: Event) -> StoreResult<Event> {
        event.validate().map_err(StoreError::Rejected)?;

        // Held across the write so saves reach the disk in order.
        let mut state = self.state.write().await;
        let key = event.natural_key();
        let previous_next_id = state.next_id;
        if event.id.is_none() {
            event.id = match state.events.get(&key) {
                Some(existing) => existing.id,
                None => {
                    state.next_id += 1;
                    Some(state.next_id)
                }
            };
        }
        let previous = state.events.insert(key.clone(), event.clone());

        if let Err(e) = self.persist(&state).await {
            match previous {
                Some(old) => {
                    state.events.insert(key, old);
                }
                None => {
                    state.events.remove(&key);
                }
            }
            state.next_id = previous_next_id;
            return Err(e);
        }
        Ok(event)
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.state.read().await.events.len())
    }

    async fn find_all(&self) -> StoreResult<Vec<Event>> {
        Ok(self.state.read().await.to_document().events)
    }
}

fn open_lock_file(path: &Path) -> StoreResult<FileLock<std::fs::File>> {
    let lock_path = path.with_extension("lock");
    let lock_file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|e| StoreError::Lock(format!("failed to create lock file: {e}")))?;
    Ok(FileLock::new(lock_file))
}

fn load_state(path: &Path) -> StoreResult<StoreState> {
    if !path.exists() {
        info!(path = %path.display(), "Event store not found, starting empty");
        return Ok(StoreState::default());
    }

    let lock = open_lock_file(path)?;
    let _guard = lock
        .read()
        .map_err(|e| StoreError::Lock(format!("failed to acquire read lock: {e}")))?;

    let metadata = std::fs::metadata(path).map_err(|e| StoreError::Io(e.to_string()))?;
    if metadata.len() > MAX_STORE_FILE_SIZE {
        return Err(StoreError::TooLarge {
            size: metadata.len(),
            max: MAX_STORE_FILE_SIZE,
        });
    }

    let contents = std::fs::read_to_string(path).map_err(|e| StoreError::Io(e.to_string()))?;
    let document: StoreDocument = serde_json::from_str(&contents).map_err(|e| {
        warn!(path = %path.display(), error = %e, "Failed to decode event store");
        StoreError::Serialization(e.to_string())
    })?;

    if document.schema_version != SCHEMA_VERSION {
        warn!(
            found_version = %document.schema_version,
            expected_version = SCHEMA_VERSION,
            "Event store schema version mismatch"
        );
        return Err(StoreError::SchemaVersionMismatch {
            expected: SCHEMA_VERSION.to_string(),
            found: document.schema_version,
        });
    }

    let max_id = document.events.iter().filter_map(|e| e.id).max().unwrap_or(0);
    let state = StoreState {
        next_id: document.next_id.max(max_id),
        events: document
            .events
            .into_iter()
            .map(|event| (event.natural_key(), event))
            .collect(),
    };
    info!(path = %path.display(), events = state.events.len(), "Event store loaded");
    Ok(state)
}

fn write_atomically(path: &Path, json: &str) -> StoreResult<()> {
    if json.len() as u64 > MAX_STORE_FILE_SIZE {
        return Err(StoreError::TooLarge {
            size: json.len() as u64,
            max: MAX_STORE_FILE_SIZE,
        });
    }

    let parent_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent_dir)
        .map_err(|e| StoreError::Io(format!("failed to create store directory: {e}")))?;

    let mut lock = open_lock_file(path)?;
    let _guard = lock
        .write()
        .map_err(|e| StoreError::Lock(format!("failed to acquire write lock: {e}")))?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent_dir)
        .map_err(|e| StoreError::Io(format!("failed to create temp file: {e}")))?;
    temp_file
        .write_all(json.as_bytes())
        .map_err(|e| StoreError::Io(format!("failed to write temp file: {e}")))?;
    temp_file
        .flush()
        .map_err(|e| StoreError::Io(format!("failed to flush temp file: {e}")))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| StoreError::Io(format!("failed to sync temp file: {e}")))?;
    temp_file
        .persist(path)
        .map_err(|e| StoreError::Io(format!("failed to persist temp file: {e}")))?;

    if let Ok(dir) = std::fs::File::open(parent_dir) {
        let _ = dir.sync_all();
    }

    debug!(path = %path.display(), bytes = json.len(), "Event store written");
    Ok(())
}

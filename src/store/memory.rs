//! In-memory event repository

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use super::{EventRepository, StoreError, StoreResult};
use crate::{Event, EventKey};

/// Repository backed by a map in memory. Nothing survives the process.
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    events: RwLock<HashMap<EventKey, Event>>,
    next_id: AtomicU64,
}

impl InMemoryEventRepository {
    /// Empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository seeded with `events`, ids assigned where missing
    pub fn with_events(events: impl IntoIterator<Item = Event>) -> Self {
        let mut repo = Self::new();
        let mut map = HashMap::new();
        for mut event in events {
            if event.id.is_none() {
                event.id = Some(repo.allocate_id());
            }
            map.insert(event.natural_key(), event);
        }
        repo.events = RwLock::new(map);
        repo
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn find_by_natural_key(&self, event_code: &str, season_year: i32) -> StoreResult<Option<Event>> {
        let key = EventKey::new(event_code, season_year);
        Ok(self.events.read().await.get(&key).cloned())
    }

    async fn save(&self, mut event: Event) -> StoreResult<Event> {
        event.validate().map_err(StoreError::Rejected)?;

        let mut events = self.events.write().await;
        let key = event.natural_key();
        if event.id.is_none() {
            event.id = match events.get(&key) {
                Some(existing) => existing.id,
                None => Some(self.allocate_id()),
            };
        }
        events.insert(key, event.clone());
        Ok(event)
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.events.read().await.len())
    }

    async fn find_all(&self) -> StoreResult<Vec<Event>> {
        let mut all: Vec<Event> = self.events.read().await.values().cloned().collect();
        all.sort_by(|a, b| {
            (a.season_year, &a.event_code).cmp(&(b.season_year, &b.event_code))
        });
        Ok(all)
    }
}

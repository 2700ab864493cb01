//! Create-or-update of fetched events by natural key
//!
//! Each fetched event is looked up by `(event_code, season_year)`. A match
//! gets every mutable field overwritten from the fetch; no match is saved as
//! a new record. Both are stamped with the current time. A repository error
//! on one record is logged and counted, and the pass moves on.

use std::collections::HashMap;
use std::fmt;
use tracing::{debug, error, info, warn};

use crate::clock::SharedClock;
use crate::metrics;
use crate::shutdown::SharedShutdown;
use crate::store::SharedRepository;
use crate::{Event, EventKey};

/// Outcome counts of one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// New records saved
    pub created: usize,
    /// Existing records updated
    pub updated: usize,
    /// Records whose lookup or save failed
    pub failed: usize,
    /// The pass stopped early because shutdown was requested
    pub interrupted: bool,
}

impl ReconcileReport {
    /// Records written
    pub fn processed(&self) -> usize {
        self.created + self.updated
    }

    /// Add another report's counts to this one
    pub fn merge(&mut self, other: &ReconcileReport) {
        self.created += other.created;
        self.updated += other.updated;
        self.failed += other.failed;
        self.interrupted |= other.interrupted;
    }
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} failed",
            self.created, self.updated, self.failed
        )?;
        if self.interrupted {
            f.write_str(" (interrupted)")?;
        }
        Ok(())
    }
}

/// Reconciles fetched events into a repository
#[derive(Clone)]
pub struct Reconciler {
    repository: SharedRepository,
    clock: SharedClock,
    shutdown: SharedShutdown,
}

impl Reconciler {
    /// New reconciler over `repository`
    pub fn new(repository: SharedRepository, clock: SharedClock, shutdown: SharedShutdown) -> Self {
        Self {
            repository,
            clock,
            shutdown,
        }
    }

    /// Reconcile `fresh_events` into the repository.
    ///
    /// Duplicate natural keys in the batch collapse to the last occurrence,
    /// so one pass never inserts the same key twice. Shutdown is checked
    /// between records: the current record always finishes.
    pub async fn reconcile(&self, fresh_events: Vec<Event>) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let batch = dedupe_last_wins(fresh_events);

        for fresh in batch {
            if self.shutdown.is_shutdown_requested() {
                info!(
                    remaining_from = %fresh.natural_key(),
                    "Shutdown requested, stopping reconciliation"
                );
                report.interrupted = true;
                break;
            }
            self.reconcile_one(fresh, &mut report).await;
        }

        metrics::record_reconciled("created", report.created as u64);
        metrics::record_reconciled("updated", report.updated as u64);
        metrics::record_reconciled("failed", report.failed as u64);
        report
    }

    async fn reconcile_one(&self, fresh: Event, report: &mut ReconcileReport) {
        let now = self.clock.now();
        let existing = match self
            .repository
            .find_by_natural_key(&fresh.event_code, fresh.season_year)
            .await
        {
            Ok(existing) => existing,
            Err(e) => {
                error!(
                    event_code = %fresh.event_code,
                    season = fresh.season_year,
                    error = %e,
                    "Failed to look up event"
                );
                report.failed += 1;
                return;
            }
        };

        let (record, is_new) = match existing {
            Some(mut stored) => {
                stored.apply_sync(&fresh, now);
                (stored, false)
            }
            None => {
                let mut created = fresh;
                created.id = None;
                created.last_synced = Some(now);
                (created, true)
            }
        };

        let event_code = record.event_code.clone();
        let season = record.season_year;
        match self.repository.save(record).await {
            Ok(_) if is_new => {
                debug!(%event_code, season, "Created event");
                report.created += 1;
            }
            Ok(_) => {
                debug!(%event_code, season, "Updated event");
                report.updated += 1;
            }
            Err(e) => {
                error!(%event_code, season, error = %e, "Failed to save event");
                report.failed += 1;
            }
        }
    }
}

fn dedupe_last_wins(events: Vec<Event>) -> Vec<Event> {
    let mut position: HashMap<EventKey, usize> = HashMap::with_capacity(events.len());
    let mut batch: Vec<Option<Event>> = Vec::with_capacity(events.len());

    for event in events {
        let key = event.natural_key();
        if let Some(&index) = position.get(&key) {
            warn!(event_code = %key.event_code, season = key.season_year, "Duplicate event in batch, keeping last");
            batch[index] = None;
        }
        position.insert(key, batch.len());
        batch.push(Some(event));
    }

    batch.into_iter().flatten().collect()
}

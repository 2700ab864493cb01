//! Background interval scheduler
//!
//! Runs a [`SyncJob`] on a tokio task, first immediately and then once per
//! period. Ticks are sequential, so a slow cycle delays the next tick
//! instead of overlapping it; missed ticks are skipped rather than burst.
//! The period can be changed while running and takes effect from the next
//! tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use super::SyncJob;
use crate::shutdown::SharedShutdown;

/// Shortest accepted period
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Scheduler lifecycle errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// `start` was called on a running scheduler
    #[error("scheduler already started")]
    AlreadyStarted,

    /// `start` was called after `stop`
    #[error("scheduler has been stopped")]
    Stopped,
}

enum WorkerState {
    Idle,
    Running(JoinHandle<()>),
    Stopped,
}

/// Runs a job every period on a background task
pub struct IntervalScheduler {
    job: Arc<dyn SyncJob>,
    interval_tx: watch::Sender<Duration>,
    enabled: Arc<AtomicBool>,
    shutdown: SharedShutdown,
    worker: Mutex<WorkerState>,
}

impl IntervalScheduler {
    /// Scheduler for `job` every `interval`. Nothing runs until
    /// [`Self::start`].
    pub fn new(job: Arc<dyn SyncJob>, interval: Duration, shutdown: SharedShutdown) -> Self {
        let (interval_tx, _) = watch::channel(interval.max(MIN_INTERVAL));
        Self {
            job,
            interval_tx,
            enabled: Arc::new(AtomicBool::new(true)),
            shutdown,
            worker: Mutex::new(WorkerState::Idle),
        }
    }

    /// Current period
    pub fn interval(&self) -> Duration {
        *self.interval_tx.borrow()
    }

    /// Change the period. The running worker picks it up after the current
    /// wait, with the next tick one full new period away.
    pub fn set_interval(&self, interval: Duration) {
        let interval = interval.max(MIN_INTERVAL);
        info!(interval_secs = interval.as_secs_f64(), "Sync interval changed");
        self.interval_tx.send_replace(interval);
    }

    /// Enable or disable ticks without stopping the worker
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Whether ticks run the job
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Whether the worker task is alive
    pub fn is_running(&self) -> bool {
        match &*self.lock_worker() {
            WorkerState::Running(handle) => !handle.is_finished(),
            WorkerState::Idle | WorkerState::Stopped => false,
        }
    }

    /// Spawn the worker. Must be called within a tokio runtime.
    pub fn start(&self) -> Result<(), SchedulerError> {
        let mut worker = self.lock_worker();
        match &*worker {
            WorkerState::Running(_) => return Err(SchedulerError::AlreadyStarted),
            WorkerState::Stopped => return Err(SchedulerError::Stopped),
            WorkerState::Idle => {}
        }

        let job = self.job.clone();
        let enabled = self.enabled.clone();
        let shutdown = self.shutdown.clone();
        let interval_rx = self.interval_tx.subscribe();
        info!(interval_secs = self.interval().as_secs_f64(), "Starting sync scheduler");
        *worker = WorkerState::Running(tokio::spawn(run_worker(job, enabled, shutdown, interval_rx)));
        Ok(())
    }

    /// Request shutdown and wait for the worker to finish its in-flight
    /// cycle. Safe to call more than once.
    pub async fn stop(&self) {
        self.shutdown.request_shutdown();
        let previous = std::mem::replace(&mut *self.lock_worker(), WorkerState::Stopped);
        if let WorkerState::Running(handle) = previous {
            info!("Stopping sync scheduler");
            if let Err(e) = handle.await {
                error!(error = %e, "Sync scheduler task ended abnormally");
            }
            info!("Sync scheduler stopped");
        }
    }

    fn lock_worker(&self) -> std::sync::MutexGuard<'_, WorkerState> {
        self.worker.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

async fn run_worker(
    job: Arc<dyn SyncJob>,
    enabled: Arc<AtomicBool>,
    shutdown: SharedShutdown,
    mut interval_rx: watch::Receiver<Duration>,
) {
    let mut first_tick_at = Instant::now();

    loop {
        let period = *interval_rx.borrow_and_update();
        let mut ticker = tokio::time::interval_at(first_tick_at, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait_for_shutdown() => {
                    debug!("Sync scheduler received shutdown");
                    return;
                }
                changed = interval_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    break;
                }
                _ = ticker.tick() => {
                    if !enabled.load(Ordering::SeqCst) {
                        debug!("Sync scheduler tick skipped, scheduling disabled");
                        continue;
                    }
                    let outcome = job.run().await;
                    debug!(outcome = outcome.label(), "Scheduled sync finished");
                }
            }
        }

        first_tick_at = Instant::now() + *interval_rx.borrow();
    }
}

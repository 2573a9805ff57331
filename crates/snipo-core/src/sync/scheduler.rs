//! Background auto-sync task.
//!
//! One tokio task wakes every `tick` and asks the [`SyncService`] to run a
//! pass if auto-sync is due. `stop` signals the task and waits for it, so a
//! pass that is already running finishes before `stop` returns.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::service::SyncService;
use crate::util::now_ms;

/// Default wake-up period; well below the minimum sync interval
pub const DEFAULT_TICK: Duration = Duration::from_secs(60);

struct Running {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

pub struct SyncScheduler {
    service: SyncService,
    tick: Duration,
    running: Mutex<Option<Running>>,
}

impl SyncScheduler {
    pub fn new(service: SyncService, tick: Duration) -> Self {
        Self {
            service,
            tick,
            running: Mutex::new(None),
        }
    }

    /// Spawn the background task. Returns `false` if it was already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.is_some() {
            return false;
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run_loop(self.service.clone(), self.tick, shutdown_rx));
        *running = Some(Running { shutdown, handle });
        tracing::info!(tick_secs = self.tick.as_secs(), "Sync scheduler started");
        true
    }

    /// Signal the task and wait for it to exit. No-op when not running.
    pub async fn stop(&self) {
        let running = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(Running { shutdown, handle }) = running else {
            return;
        };

        // The receiver is gone if the task already exited.
        let _ = shutdown.send(true);
        if let Err(error) = handle.await {
            tracing::error!("Sync scheduler task failed: {error}");
        }
        tracing::info!("Sync scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

async fn run_loop(service: SyncService, tick: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut interval = time::interval_at(Instant::now() + tick, tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = interval.tick() => run_tick(&service).await,
        }
    }
}

async fn run_tick(service: &SyncService) {
    match service.run_due_pass(now_ms()).await {
        Ok(Some(report)) => tracing::info!(
            processed = report.processed,
            synced = report.synced,
            conflicts = report.conflicts,
            errors = report.errors,
            "Scheduled sync pass finished"
        ),
        Ok(None) => tracing::debug!("Auto-sync not due"),
        Err(error) => tracing::error!("Scheduled sync pass failed: {error}"),
    }
}

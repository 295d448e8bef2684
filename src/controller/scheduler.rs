use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::clock::Clock;
use super::state::ProfileStore;
use crate::config::SchedulerConfig;
use crate::domain::Prediction;
use crate::forecast::{ProfileEngine, ProfileError};
use crate::history::HistoryLoader;

/// Drives the forecasting cycle: once shortly after startup, then every
/// `interval`. A cycle always runs to completion before the next sleep, so
/// cycles never overlap.
#[derive(Debug)]
pub struct ProfileScheduler {
    config: SchedulerConfig,
    loader: HistoryLoader,
    engine: ProfileEngine,
    store: ProfileStore,
    clock: Clock,
}

impl ProfileScheduler {
    pub fn new(
        config: SchedulerConfig,
        loader: HistoryLoader,
        engine: ProfileEngine,
        store: ProfileStore,
    ) -> Self {
        Self {
            config,
            loader,
            engine,
            store,
            clock: Clock::Local,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    /// Runs until `cancel` fires. Cancellation is observed only while
    /// sleeping between cycles.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            interval_minutes = self.config.interval_minutes,
            startup_delay_seconds = self.config.startup_delay_seconds,
            "profile scheduler started"
        );

        if !sleep_or_cancel(self.config.startup_delay(), &cancel).await {
            info!("profile scheduler cancelled before first cycle");
            return;
        }

        loop {
            // Outcome already recorded in the store
            let _ = self.run_cycle().await;

            if !sleep_or_cancel(self.config.interval(), &cancel).await {
                break;
            }
        }
        info!("profile scheduler stopped");
    }

    /// One full cycle, including status bookkeeping. Never panics.
    pub async fn run_cycle(&self) -> Result<u64, ProfileError> {
        let now = self.clock.now();
        self.store.mark_creating(now);

        let outcome = AssertUnwindSafe(self.compute(now))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(ProfileError::Internal(panic_message(panic.as_ref()))));

        match outcome {
            Ok(prediction) => {
                let version = self.store.publish(prediction);
                info!(version, "profiles updated");
                Ok(version)
            }
            Err(e) => {
                if e.is_data_insufficiency() {
                    warn!(reason = %e.reason(), detail = %e, "profile forecast warming up");
                } else {
                    error!(reason = %e.reason(), detail = %e, "profile forecast cycle failed");
                }
                self.store.record_failure(&e);
                Err(e)
            }
        }
    }

    async fn compute(&self, now: chrono::NaiveDateTime) -> Result<Prediction, ProfileError> {
        let loaded = self.loader.load(now).await?;
        self.engine.run(&loaded.samples, now)
    }
}

async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        format!("cycle panicked: {msg}")
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        format!("cycle panicked: {msg}")
    } else {
        "cycle panicked".to_string()
    }
}

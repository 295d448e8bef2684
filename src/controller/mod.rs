pub mod clock;
pub mod scheduler;
pub mod state;

use anyhow::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::forecast::ProfileEngine;
use crate::history::{HistoryLoader, HourlySeriesSource, JsonFileSeriesStore};

pub use clock::Clock;
pub use scheduler::ProfileScheduler;
pub use state::{ProfileSnapshot, ProfileStore};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub store: ProfileStore,
    pub scheduler: Arc<ProfileScheduler>,
}

impl AppState {
    /// Wires the bundled JSON sample store into a scheduler.
    pub fn new(cfg: Config) -> Result<Self> {
        let source: Arc<dyn HourlySeriesSource> =
            Arc::new(JsonFileSeriesStore::new(&cfg.sources.store_path));
        Self::with_source(cfg, source)
    }

    pub fn with_source(cfg: Config, source: Arc<dyn HourlySeriesSource>) -> Result<Self> {
        let clock = Clock::from_timezone(cfg.timezone.as_deref())?;
        let loader = HistoryLoader::new(source, cfg.sources.strategies()).with_tuning(&cfg.profiles);
        let engine = ProfileEngine::new(cfg.profiles.clone());
        let store = ProfileStore::new();

        let scheduler = ProfileScheduler::new(cfg.scheduler.clone(), loader, engine, store.clone())
            .with_clock(clock);

        Ok(Self {
            cfg,
            store,
            scheduler: Arc::new(scheduler),
        })
    }
}

pub fn spawn_profile_tasks(state: &AppState, cancel: CancellationToken) -> JoinHandle<()> {
    let scheduler = state.scheduler.clone();
    let handle = tokio::spawn(async move {
        scheduler.run(cancel).await;
    });

    let mut updates = state.store.subscribe();
    let store = state.store.clone();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let version = *updates.borrow_and_update();
            if let Some(prediction) = store.latest_prediction() {
                info!(
                    version,
                    predicted_total = prediction.predicted_total,
                    similarity = prediction.similarity_score,
                    today = %prediction.labels.today,
                    tomorrow = %prediction.labels.tomorrow,
                    "profiles updated"
                );
            }
        }
    });

    handle
}

use chrono::NaiveDateTime;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;

use crate::domain::{Prediction, ProfileStatus};
use crate::forecast::ProfileError;

/// Point-in-time view of the forecaster for consumers
#[derive(Debug, Clone, Default)]
pub struct ProfileSnapshot {
    /// Bumped on every successful publish
    pub version: u64,
    pub status: ProfileStatus,
    pub reason: Option<String>,
    /// Most recent completed prediction; survives later failed cycles
    pub prediction: Option<Arc<Prediction>>,
    pub last_run: Option<NaiveDateTime>,
    pub last_success: Option<NaiveDateTime>,
    pub run_count: u64,
    pub success_count: u64,
    pub error_count: u64,
}

/// Owns the last prediction and announces replacements.
///
/// Writers swap the whole snapshot under a short lock, so readers observe
/// either the previous or the new prediction, never a mix.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    inner: Arc<RwLock<ProfileSnapshot>>,
    updates: Arc<watch::Sender<u64>>,
}

impl Default for ProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileStore {
    pub fn new() -> Self {
        let (updates, _) = watch::channel(0);
        Self {
            inner: Arc::new(RwLock::new(ProfileSnapshot::default())),
            updates: Arc::new(updates),
        }
    }

    pub fn snapshot(&self) -> ProfileSnapshot {
        self.inner.read().clone()
    }

    pub fn status(&self) -> ProfileStatus {
        self.inner.read().status
    }

    pub fn latest_prediction(&self) -> Option<Arc<Prediction>> {
        self.inner.read().prediction.clone()
    }

    /// "profiles updated" notifications; the value is the published version.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.updates.subscribe()
    }

    pub fn mark_creating(&self, now: NaiveDateTime) {
        let mut state = self.inner.write();
        state.status = ProfileStatus::Creating;
        state.last_run = Some(now);
        state.run_count += 1;
    }

    pub fn publish(&self, prediction: Prediction) -> u64 {
        let version = {
            let mut state = self.inner.write();
            state.version += 1;
            state.status = ProfileStatus::Ok;
            state.reason = None;
            state.last_success = Some(prediction.generated_at);
            state.success_count += 1;
            state.prediction = Some(Arc::new(prediction));
            state.version
        };
        self.updates.send_replace(version);
        version
    }

    pub fn record_failure(&self, error: &ProfileError) {
        let mut state = self.inner.write();
        if error.is_data_insufficiency() {
            state.status = ProfileStatus::WarmingUp;
        } else {
            state.status = ProfileStatus::Error;
            state.error_count += 1;
        }
        state.reason = Some(error.reason());
    }
}

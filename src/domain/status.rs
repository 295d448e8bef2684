use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle of the profile forecaster as seen by consumers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProfileStatus {
    /// No cycle has run yet
    #[default]
    Idle,
    /// A cycle is in progress
    Creating,
    /// Last cycle produced a prediction
    Ok,
    /// Not enough history yet; retried on the next tick
    WarmingUp,
    /// Last cycle failed unexpectedly
    Error,
}

impl ProfileStatus {
    pub fn has_fresh_prediction(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

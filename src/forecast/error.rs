use thiserror::Error;

/// Why a cycle produced no prediction.
///
/// Everything except [`ProfileError::Internal`] is a data-insufficiency
/// condition that clears by itself once more history accumulates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("no hourly consumption statistics available")]
    NoHourlyStats,

    #[error("only {found} usable daily profiles, need at least {required}")]
    NotEnoughDailyProfiles { found: usize, required: usize },

    #[error("current window has {available} usable hours, need {required}")]
    NotEnoughCurrentData { available: usize, required: usize },

    #[error("no three consecutive days available to build historical profiles")]
    NoHistoricalProfiles,

    #[error("no historical profile long enough to match the current window")]
    NoMatchingProfiles,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ProfileError {
    pub fn is_data_insufficiency(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }

    /// Short machine-readable reason surfaced next to the status.
    pub fn reason(&self) -> String {
        match self {
            Self::NoHourlyStats => "no_hourly_stats".to_string(),
            Self::NotEnoughDailyProfiles { found, .. } => {
                format!("not_enough_daily_profiles_{found}")
            }
            Self::NotEnoughCurrentData { available, .. } => {
                format!("not_enough_current_data_{available}")
            }
            Self::NoHistoricalProfiles => "no_historical_profiles".to_string(),
            Self::NoMatchingProfiles => "no_matching_profiles".to_string(),
            Self::Internal(_) => "error".to_string(),
        }
    }
}

impl From<anyhow::Error> for ProfileError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_strings() {
        assert_eq!(ProfileError::NoHourlyStats.reason(), "no_hourly_stats");
        assert_eq!(
            ProfileError::NotEnoughDailyProfiles { found: 2, required: 3 }.reason(),
            "not_enough_daily_profiles_2"
        );
        assert_eq!(
            ProfileError::NotEnoughCurrentData { available: 17, required: 24 }.reason(),
            "not_enough_current_data_17"
        );
        assert_eq!(ProfileError::Internal("boom".into()).reason(), "error");
    }

    #[test]
    fn test_classification() {
        assert!(ProfileError::NoMatchingProfiles.is_data_insufficiency());
        assert!(!ProfileError::Internal("x".into()).is_data_insufficiency());

        let err: ProfileError = anyhow::anyhow!("store offline").into();
        assert_eq!(err, ProfileError::Internal("store offline".into()));
    }
}

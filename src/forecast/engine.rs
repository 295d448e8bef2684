use chrono::{Duration, NaiveDateTime};
use tracing::{debug, info};

use super::daily::DailyProfileBuilder;
use super::error::ProfileError;
use super::library::HistoricalProfileLibrary;
use super::matcher::{MatchSelector, PredictionAggregator};
use super::naming;
use super::window::CurrentWindowBuilder;
use crate::config::ProfileTuning;
use crate::domain::{
    HourlySample, MatchSplit, Prediction, ProfileLabels, DAYS_PER_WINDOW, HOURS_PER_DAY,
};

/// Accepted daily profiles needed before matching is attempted
pub const MIN_DAILY_PROFILES: usize = DAYS_PER_WINDOW;

/// Runs one complete forecasting cycle over a pool of hourly samples.
///
/// The engine is a pure function of its inputs: the same samples and the
/// same `now` always produce the same prediction.
#[derive(Debug, Clone)]
pub struct ProfileEngine {
    tuning: ProfileTuning,
}

impl Default for ProfileEngine {
    fn default() -> Self {
        Self::new(ProfileTuning::default())
    }
}

impl ProfileEngine {
    pub fn new(tuning: ProfileTuning) -> Self {
        Self { tuning }
    }

    pub fn tuning(&self) -> &ProfileTuning {
        &self.tuning
    }

    pub fn run(
        &self,
        samples: &[HourlySample],
        now: NaiveDateTime,
    ) -> Result<Prediction, ProfileError> {
        let max_kwh = self.tuning.max_hourly_kwh;
        if !samples.iter().any(|s| s.is_plausible(max_kwh)) {
            return Err(ProfileError::NoHourlyStats);
        }

        // Today is still being recorded, so it never serves as history
        let today = now.date();
        let history: Vec<HourlySample> = samples
            .iter()
            .filter(|s| s.date() < today)
            .copied()
            .collect();

        let daily = DailyProfileBuilder::from_tuning(&self.tuning).build(&history);
        if daily.len() < MIN_DAILY_PROFILES {
            return Err(ProfileError::NotEnoughDailyProfiles {
                found: daily.len(),
                required: MIN_DAILY_PROFILES,
            });
        }

        let window = CurrentWindowBuilder::from_tuning(&self.tuning).build(samples, now, &daily)?;
        let current_hour = window.current_hour;
        let split = MatchSplit::for_hour(current_hour);
        if window.len() < split.match_hours {
            return Err(ProfileError::NotEnoughCurrentData {
                available: window.len(),
                required: split.match_hours,
            });
        }

        let library = HistoricalProfileLibrary::build(&daily.days);
        if library.is_empty() {
            return Err(ProfileError::NoHistoricalProfiles);
        }

        let matches = MatchSelector::from_tuning(&self.tuning).select(
            &window.values,
            split.match_hours,
            library.profiles(),
        )?;
        debug!(
            candidates = library.len(),
            selected = matches.len(),
            best_score = matches[0].score,
            best_start = %matches[0].profile.start_date,
            "selected matching profiles"
        );

        let forecast = PredictionAggregator::new(self.tuning.floor_ratio).aggregate(
            &matches,
            split,
            current_hour,
            &daily.hour_medians,
        )?;

        let labels = label_days(&forecast.matched_profile_full, now);

        info!(
            current_hour,
            days = daily.len(),
            profiles = library.len(),
            matches = forecast.sample_count,
            similarity = forecast.similarity_score,
            predicted_total_kwh = forecast.predicted_total,
            floor_applied = forecast.floor_applied_count,
            "consumption profile prediction ready"
        );

        Ok(Prediction {
            generated_at: now,
            current_hour,
            predicted_consumption: forecast.predicted_consumption,
            predicted_total: forecast.predicted_total,
            predicted_avg: forecast.predicted_avg,
            sample_count: forecast.sample_count,
            match_hours: split.match_hours,
            predict_hours: split.predict_hours,
            similarity_score: forecast.similarity_score,
            floor_applied_count: forecast.floor_applied_count,
            interpolated_hours: window.filled_hours,
            best_match_start: forecast.best_match_start,
            matched_profile_full: forecast.matched_profile_full,
            labels,
        })
    }
}

/// The best match lines up as [yesterday, today, tomorrow]; label its last
/// two days using the real dates' season and day type.
fn label_days(matched: &[f64], now: NaiveDateTime) -> ProfileLabels {
    let today = now.date();
    let tomorrow = today + Duration::days(1);
    let day = |index: usize| {
        matched
            .get(index * HOURS_PER_DAY..(index + 1) * HOURS_PER_DAY)
            .unwrap_or(&[])
    };
    ProfileLabels {
        today: naming::describe_date(day(1), today),
        tomorrow: naming::describe_date(day(2), tomorrow),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn flat_days(first: NaiveDate, days: i64, value: f64) -> Vec<HourlySample> {
        (0..days * 24)
            .map(|h| {
                HourlySample::new(
                    first.and_hms_opt(0, 0, 0).unwrap() + Duration::hours(h),
                    value,
                )
            })
            .collect()
    }

    #[test]
    fn test_no_samples() {
        let now = NaiveDate::from_ymd_opt(2025, 5, 5).unwrap().and_hms_opt(8, 0, 0).unwrap();
        assert_eq!(
            ProfileEngine::default().run(&[], now).unwrap_err(),
            ProfileError::NoHourlyStats
        );
    }

    #[test]
    fn test_only_implausible_samples() {
        let start = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let samples = flat_days(start, 4, 55.0);
        let now = start.and_hms_opt(0, 0, 0).unwrap() + Duration::days(4);
        assert_eq!(
            ProfileEngine::default().run(&samples, now).unwrap_err(),
            ProfileError::NoHourlyStats
        );
    }

    #[test]
    fn test_no_consecutive_triple() {
        let start = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        // 05-01, 05-02, gap, 05-04, 05-05 (yesterday), now on 05-06
        let mut samples = flat_days(start, 2, 1.0);
        samples.extend(flat_days(start + Duration::days(3), 2, 1.0));
        let now = (start + Duration::days(5)).and_hms_opt(0, 10, 0).unwrap();

        assert_eq!(
            ProfileEngine::default().run(&samples, now).unwrap_err(),
            ProfileError::NoHistoricalProfiles
        );
    }

    #[test]
    fn test_labels_follow_real_dates() {
        // 2025-01-10 is a Friday; tomorrow is a Saturday
        let now = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let labels = label_days(&[0.4; 72], now);
        assert_eq!(labels.today, "Weekday (typical day)");
        assert_eq!(labels.tomorrow, "Weekend (typical day)");
    }
}

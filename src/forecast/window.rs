use chrono::{Duration, NaiveDateTime, Timelike};

use super::daily::{bucket_samples, missing_hours, DailyProfiles};
use super::error::ProfileError;
use crate::config::ProfileTuning;
use crate::domain::{CurrentWindow, HourlySample, MatchSplit, HOURS_PER_DAY};

/// Builds the rolling match window: all of yesterday plus today's elapsed
/// hours (the running hour is excluded).
#[derive(Debug, Clone)]
pub struct CurrentWindowBuilder {
    max_missing_hours: usize,
    max_hourly_kwh: f64,
}

impl Default for CurrentWindowBuilder {
    fn default() -> Self {
        Self::from_tuning(&ProfileTuning::default())
    }
}

impl CurrentWindowBuilder {
    pub fn new(max_missing_hours: usize, max_hourly_kwh: f64) -> Self {
        Self {
            max_missing_hours,
            max_hourly_kwh,
        }
    }

    pub fn from_tuning(tuning: &ProfileTuning) -> Self {
        Self::new(tuning.max_missing_hours, tuning.max_hourly_kwh)
    }

    /// Gaps are filled with the same rules as historical days, using the
    /// hour medians of `history`.
    pub fn build(
        &self,
        samples: &[HourlySample],
        now: NaiveDateTime,
        history: &DailyProfiles,
    ) -> Result<CurrentWindow, ProfileError> {
        let today = now.date();
        let yesterday = today - Duration::days(1);
        let current_hour = now.hour() as usize;
        let required = MatchSplit::for_hour(current_hour).match_hours;

        let relevant: Vec<HourlySample> = samples
            .iter()
            .filter(|s| s.date() == yesterday || s.date() == today)
            .copied()
            .collect();
        let buckets = bucket_samples(&relevant, self.max_hourly_kwh);
        let empty = [None; HOURS_PER_DAY];
        let yesterday_obs = buckets.get(&yesterday).unwrap_or(&empty);
        let today_obs = &buckets.get(&today).unwrap_or(&empty)[..current_hour];

        let yesterday_missing = missing_hours(yesterday_obs);
        if yesterday_missing > self.max_missing_hours {
            return Err(ProfileError::NotEnoughCurrentData {
                available: HOURS_PER_DAY - yesterday_missing,
                required,
            });
        }

        let filler = history.gap_filler();
        let (mut values, mut filled_hours) = filler.fill(yesterday_obs);

        if current_hour > 0 {
            let today_missing = missing_hours(today_obs);
            if today_missing > self.max_missing_hours || today_missing == current_hour {
                return Err(ProfileError::NotEnoughCurrentData {
                    available: HOURS_PER_DAY - yesterday_missing + current_hour - today_missing,
                    required,
                });
            }
            let (today_values, today_filled) = filler.fill(today_obs);
            values.extend(today_values);
            filled_hours += today_filled;
        }

        Ok(CurrentWindow {
            values,
            current_hour,
            filled_hours,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::daily::DailyProfileBuilder;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 20).unwrap()
    }

    fn samples_for(date: NaiveDate, hours: impl Iterator<Item = u32>, value: f64) -> Vec<HourlySample> {
        hours
            .map(|h| HourlySample::new(date.and_hms_opt(h, 0, 0).unwrap(), value))
            .collect()
    }

    fn now_at(hour: u32) -> NaiveDateTime {
        today().and_hms_opt(hour, 37, 0).unwrap()
    }

    #[rstest]
    #[case(0)]
    #[case(5)]
    #[case(23)]
    fn test_window_length_tracks_hour(#[case] hour: u32) {
        let yesterday = today() - Duration::days(1);
        let mut samples = samples_for(yesterday, 0..24, 1.0);
        samples.extend(samples_for(today(), 0..24, 2.0));

        let window = CurrentWindowBuilder::default()
            .build(&samples, now_at(hour), &DailyProfiles::default())
            .unwrap();

        assert_eq!(window.len(), 24 + hour as usize);
        assert_eq!(window.values[23], 1.0);
        if hour > 0 {
            // running hour excluded, elapsed hours of today included
            assert_eq!(window.values[24], 2.0);
        }
        assert_eq!(window.filled_hours, 0);
    }

    #[test]
    fn test_yesterday_too_sparse() {
        let yesterday = today() - Duration::days(1);
        let samples = samples_for(yesterday, 7..24, 1.0);

        let err = CurrentWindowBuilder::default()
            .build(&samples, now_at(0), &DailyProfiles::default())
            .unwrap_err();
        assert_eq!(
            err,
            ProfileError::NotEnoughCurrentData {
                available: 17,
                required: 24
            }
        );
        assert!(err.reason().starts_with("not_enough_current_data_"));
    }

    #[test]
    fn test_today_without_any_reading() {
        let yesterday = today() - Duration::days(1);
        let samples = samples_for(yesterday, 0..24, 1.0);

        let err = CurrentWindowBuilder::default()
            .build(&samples, now_at(3), &DailyProfiles::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ProfileError::NotEnoughCurrentData { available: 24, required: 27 }
        ));
    }

    #[test]
    fn test_gaps_filled_from_history_medians() {
        let yesterday = today() - Duration::days(1);
        let history_day = yesterday - Duration::days(1);
        let history = DailyProfileBuilder::default()
            .build(&samples_for(history_day, 0..24, 0.8));

        // yesterday misses hour 0 (no earlier neighbour, so the median applies)
        let mut samples = samples_for(yesterday, 1..24, 1.0);
        samples.extend(samples_for(today(), 0..4, 1.0));

        let window = CurrentWindowBuilder::default()
            .build(&samples, now_at(4), &history)
            .unwrap();
        assert_eq!(window.values[0], 0.8);
        assert_eq!(window.filled_hours, 1);
    }

    #[test]
    fn test_future_readings_ignored() {
        let yesterday = today() - Duration::days(1);
        let mut samples = samples_for(yesterday, 0..24, 1.0);
        samples.extend(samples_for(today(), 0..2, 1.0));
        samples.extend(samples_for(today(), 2..24, 9.0));

        let window = CurrentWindowBuilder::default()
            .build(&samples, now_at(2), &DailyProfiles::default())
            .unwrap();
        assert_eq!(window.values.len(), 26);
        assert!(window.values.iter().all(|v| *v == 1.0));
    }
}

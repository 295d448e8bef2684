use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hours in one calendar-day profile
pub const HOURS_PER_DAY: usize = 24;

/// Days stitched into one historical window
pub const DAYS_PER_WINDOW: usize = 3;

/// Hours in one historical window (yesterday, today, tomorrow)
pub const WINDOW_HOURS: usize = HOURS_PER_DAY * DAYS_PER_WINDOW;

/// One hourly consumption reading in local time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlySample {
    /// Start of the hour the reading covers
    pub timestamp: NaiveDateTime,
    /// Energy used during the hour (kWh/h)
    pub value: f64,
}

impl HourlySample {
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// Readings outside `0..=max_kwh` (or non-finite) are sensor glitches.
    pub fn is_plausible(&self, max_kwh: f64) -> bool {
        self.value.is_finite() && self.value >= 0.0 && self.value <= max_kwh
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn hour(&self) -> usize {
        self.timestamp.hour() as usize
    }
}

/// A fully gap-filled calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyProfile {
    pub date: NaiveDate,
    pub hours: [f64; HOURS_PER_DAY],
    /// How many hours were filled rather than observed
    pub filled_hours: usize,
}

impl DailyProfile {
    pub fn total(&self) -> f64 {
        self.hours.iter().sum()
    }
}

/// Median of the observed (pre-fill) value for every hour of the day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourMedians {
    medians: [Option<f64>; HOURS_PER_DAY],
}

impl HourMedians {
    pub fn new(medians: [Option<f64>; HOURS_PER_DAY]) -> Self {
        Self { medians }
    }

    pub fn get(&self, hour: usize) -> Option<f64> {
        self.medians.get(hour).copied().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.medians.iter().all(Option::is_none)
    }
}

/// 72 contiguous hours built from three consecutive accepted days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalProfile {
    pub start_date: NaiveDate,
    pub consumption: Vec<f64>,
    pub total: f64,
    pub average: f64,
}

impl HistoricalProfile {
    pub fn from_days(days: [&DailyProfile; DAYS_PER_WINDOW]) -> Self {
        let consumption: Vec<f64> = days.iter().flat_map(|d| d.hours).collect();
        let total: f64 = consumption.iter().sum();
        let average = total / consumption.len() as f64;
        Self {
            start_date: days[0].date,
            consumption,
            total,
            average,
        }
    }

    pub fn len(&self) -> usize {
        self.consumption.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumption.is_empty()
    }
}

/// Yesterday's 24 hours followed by today's elapsed hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWindow {
    pub values: Vec<f64>,
    pub current_hour: usize,
    pub filled_hours: usize,
}

impl CurrentWindow {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Split of the 72-hour window into matched history and forecast horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSplit {
    pub match_hours: usize,
    pub predict_hours: usize,
}

impl MatchSplit {
    /// `current_hour` is clamped to 0..=23.
    pub fn for_hour(current_hour: usize) -> Self {
        let match_hours = HOURS_PER_DAY + current_hour.min(HOURS_PER_DAY - 1);
        Self {
            match_hours,
            predict_hours: WINDOW_HOURS - match_hours,
        }
    }
}

/// Human-readable names for the forecast days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileLabels {
    pub today: String,
    pub tomorrow: String,
}

/// Result of one successful forecasting cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub generated_at: NaiveDateTime,
    pub current_hour: usize,
    /// Forecast for the next `predict_hours` hours, starting at `current_hour`
    pub predicted_consumption: Vec<f64>,
    pub predicted_total: f64,
    pub predicted_avg: f64,
    /// Number of historical windows averaged
    pub sample_count: usize,
    pub match_hours: usize,
    pub predict_hours: usize,
    /// Mean similarity of the averaged windows (0.0 - 1.0)
    pub similarity_score: f64,
    pub floor_applied_count: usize,
    /// Hours of the current window that had to be filled
    pub interpolated_hours: usize,
    pub best_match_start: NaiveDate,
    pub matched_profile_full: Vec<f64>,
    pub labels: ProfileLabels,
}

impl Prediction {
    /// Predicted values keyed by the start of the hour they cover.
    pub fn hourly_points(&self) -> Vec<(NaiveDateTime, f64)> {
        let first_hour = self
            .generated_at
            .date()
            .and_hms_opt(self.current_hour as u32, 0, 0)
            .unwrap_or(self.generated_at);
        self.predicted_consumption
            .iter()
            .enumerate()
            .map(|(offset, value)| (first_hour + Duration::hours(offset as i64), *value))
            .collect()
    }

    /// Forecast energy per calendar date (remaining today, then the following days).
    pub fn daily_totals(&self) -> BTreeMap<NaiveDate, f64> {
        let mut totals = BTreeMap::new();
        for (ts, value) in self.hourly_points() {
            *totals.entry(ts.date()).or_insert(0.0) += value;
        }
        totals
    }
}

/// Weekday/weekend classification of a date
pub fn is_weekend(date: NaiveDate) -> bool {
    date.weekday().number_from_monday() >= 6
}

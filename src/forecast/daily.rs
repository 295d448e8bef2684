//! Per-calendar-day profiles built from raw hourly samples.
//!
//! Samples are bucketed by (date, hour). A day survives only when at most
//! `max_missing_hours` of its 24 hours are unknown; the remaining gaps are
//! filled by [`GapFiller`].

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

use super::stats;
use crate::config::ProfileTuning;
use crate::domain::{DailyProfile, HourMedians, HourlySample, HOURS_PER_DAY};

/// Observed value per hour of each date; `None` marks a gap.
pub type HourBuckets = BTreeMap<NaiveDate, [Option<f64>; HOURS_PER_DAY]>;

/// Bucket plausible samples by (date, hour). Later samples for the same hour
/// overwrite earlier ones.
pub fn bucket_samples(samples: &[HourlySample], max_hourly_kwh: f64) -> HourBuckets {
    let mut buckets = HourBuckets::new();
    for sample in samples.iter().filter(|s| s.is_plausible(max_hourly_kwh)) {
        let day = buckets
            .entry(sample.date())
            .or_insert([None; HOURS_PER_DAY]);
        day[sample.hour()] = Some(sample.value);
    }
    buckets
}

pub fn missing_hours(observed: &[Option<f64>]) -> usize {
    observed.iter().filter(|v| v.is_none()).count()
}

/// Fills unknown hours, in priority order: linear interpolation between
/// known neighbours of the same segment, the hour-of-day median, the
/// segment's own average, the global median.
#[derive(Debug, Clone, Copy)]
pub struct GapFiller<'a> {
    hour_medians: &'a HourMedians,
    global_median: Option<f64>,
}

impl<'a> GapFiller<'a> {
    pub fn new(hour_medians: &'a HourMedians, global_median: Option<f64>) -> Self {
        Self {
            hour_medians,
            global_median,
        }
    }

    /// `observed[i]` is hour-of-day `i`. Returns the filled values and the
    /// number of hours that were filled.
    pub fn fill(&self, observed: &[Option<f64>]) -> (Vec<f64>, usize) {
        let known: Vec<f64> = observed.iter().flatten().copied().collect();
        let own_average = stats::mean(&known);

        let mut filled = 0;
        let values = observed
            .iter()
            .enumerate()
            .map(|(hour, value)| match value {
                Some(v) => *v,
                None => {
                    filled += 1;
                    interpolate(observed, hour)
                        .or_else(|| self.hour_medians.get(hour))
                        .or(own_average)
                        .or(self.global_median)
                        .unwrap_or(0.0)
                }
            })
            .collect();

        (values, filled)
    }
}

fn interpolate(observed: &[Option<f64>], hour: usize) -> Option<f64> {
    let (prev_hour, prev) = observed[..hour]
        .iter()
        .enumerate()
        .rev()
        .find_map(|(h, v)| v.map(|v| (h, v)))?;
    let (next_hour, next) = observed[hour + 1..]
        .iter()
        .enumerate()
        .find_map(|(offset, v)| v.map(|v| (hour + 1 + offset, v)))?;

    let t = (hour - prev_hour) as f64 / (next_hour - prev_hour) as f64;
    Some(prev + (next - prev) * t)
}

/// Output of [`DailyProfileBuilder::build`]
#[derive(Debug, Clone, Default)]
pub struct DailyProfiles {
    pub days: BTreeMap<NaiveDate, DailyProfile>,
    /// Medians of observed values on accepted days only
    pub hour_medians: HourMedians,
    /// Median of every plausible sample in the pool
    pub global_median: Option<f64>,
    pub rejected_days: usize,
}

impl DailyProfiles {
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn gap_filler(&self) -> GapFiller<'_> {
        GapFiller::new(&self.hour_medians, self.global_median)
    }

    /// Filled hours per accepted day
    pub fn filled_hours(&self) -> BTreeMap<NaiveDate, usize> {
        self.days
            .iter()
            .map(|(date, profile)| (*date, profile.filled_hours))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct DailyProfileBuilder {
    max_missing_hours: usize,
    max_hourly_kwh: f64,
}

impl Default for DailyProfileBuilder {
    fn default() -> Self {
        Self::from_tuning(&ProfileTuning::default())
    }
}

impl DailyProfileBuilder {
    pub fn new(max_missing_hours: usize, max_hourly_kwh: f64) -> Self {
        Self {
            max_missing_hours,
            max_hourly_kwh,
        }
    }

    pub fn from_tuning(tuning: &ProfileTuning) -> Self {
        Self::new(tuning.max_missing_hours, tuning.max_hourly_kwh)
    }

    pub fn build(&self, samples: &[HourlySample]) -> DailyProfiles {
        let buckets = bucket_samples(samples, self.max_hourly_kwh);

        let all_values: Vec<f64> = buckets.values().flatten().flatten().copied().collect();
        let global_median = stats::median(&all_values);

        let (accepted, rejected): (Vec<_>, Vec<_>) = buckets
            .iter()
            .partition(|(_, hours)| missing_hours(&hours[..]) <= self.max_missing_hours);

        let hour_medians = hour_medians(accepted.iter().map(|(_, hours)| *hours));
        let filler = GapFiller::new(&hour_medians, global_median);

        let days = accepted
            .iter()
            .map(|(date, observed)| {
                let (values, filled_hours) = filler.fill(&observed[..]);
                let mut hours = [0.0; HOURS_PER_DAY];
                hours.copy_from_slice(&values);
                (
                    **date,
                    DailyProfile {
                        date: **date,
                        hours,
                        filled_hours,
                    },
                )
            })
            .collect::<BTreeMap<_, _>>();

        debug!(
            accepted = days.len(),
            rejected = rejected.len(),
            samples = all_values.len(),
            "built daily profiles"
        );

        DailyProfiles {
            days,
            hour_medians,
            global_median,
            rejected_days: rejected.len(),
        }
    }
}

fn hour_medians<'a>(days: impl Iterator<Item = &'a [Option<f64>; HOURS_PER_DAY]>) -> HourMedians {
    let mut per_hour: Vec<Vec<f64>> = vec![Vec::new(); HOURS_PER_DAY];
    for day in days {
        for (hour, value) in day.iter().enumerate() {
            if let Some(v) = value {
                per_hour[hour].push(*v);
            }
        }
    }

    let mut medians = [None; HOURS_PER_DAY];
    for (slot, values) in medians.iter_mut().zip(&per_hour) {
        *slot = stats::median(values);
    }
    HourMedians::new(medians)
}

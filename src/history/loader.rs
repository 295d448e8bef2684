use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::source::{HourlySeriesSource, SeriesField};
use crate::config::ProfileTuning;
use crate::domain::HourlySample;
use crate::forecast::ProfileError;

/// Unit reported by a power sensor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerUnit {
    #[default]
    W,
    Kw,
}

/// One named way of obtaining hourly consumption in kWh/h.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesStrategy {
    pub name: String,
    pub sensor_id: String,
    pub field: SeriesField,
    pub unit: PowerUnit,
}

impl SeriesStrategy {
    /// Daily-reset energy counter; the hourly `sum` is already kWh.
    pub fn energy(sensor_id: &str) -> Self {
        Self {
            name: "energy".to_string(),
            sensor_id: sensor_id.to_string(),
            field: SeriesField::Sum,
            unit: PowerUnit::Kw,
        }
    }

    /// Power sensor; the hourly `mean` in kW equals kWh/h.
    pub fn power(sensor_id: &str, unit: PowerUnit) -> Self {
        Self {
            name: "power".to_string(),
            sensor_id: sensor_id.to_string(),
            field: SeriesField::Mean,
            unit,
        }
    }

    fn to_kwh(&self, value: f64) -> f64 {
        match (self.field, self.unit) {
            (SeriesField::Mean, PowerUnit::W) => value / 1000.0,
            _ => value,
        }
    }
}

/// Samples returned by the first strategy that had data
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub strategy: String,
    pub start: NaiveDateTime,
    pub samples: Vec<HourlySample>,
}

/// Loads the lookback window, trying each strategy in order until one
/// returns data.
#[derive(Clone)]
pub struct HistoryLoader {
    source: Arc<dyn HourlySeriesSource>,
    strategies: Vec<SeriesStrategy>,
    lookback_days: Option<u32>,
    fallback_lookback_days: u32,
}

impl std::fmt::Debug for HistoryLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryLoader")
            .field("strategies", &self.strategies)
            .field("lookback_days", &self.lookback_days)
            .field("fallback_lookback_days", &self.fallback_lookback_days)
            .finish_non_exhaustive()
    }
}

impl HistoryLoader {
    pub fn new(source: Arc<dyn HourlySeriesSource>, strategies: Vec<SeriesStrategy>) -> Self {
        let tuning = ProfileTuning::default();
        Self {
            source,
            strategies,
            lookback_days: tuning.lookback_days,
            fallback_lookback_days: tuning.fallback_lookback_days,
        }
    }

    pub fn with_tuning(mut self, tuning: &ProfileTuning) -> Self {
        self.lookback_days = tuning.lookback_days;
        self.fallback_lookback_days = tuning.fallback_lookback_days;
        self
    }

    pub fn strategies(&self) -> &[SeriesStrategy] {
        &self.strategies
    }

    /// Midnight of the first day to query: configured lookback, else the
    /// sensor's earliest stored date, else the fallback lookback.
    pub async fn lookback_start(&self, strategy: &SeriesStrategy, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date();
        let days = match self.lookback_days {
            Some(days) => i64::from(days),
            None => match self.source.get_earliest_available(&strategy.sensor_id).await {
                Ok(Some(earliest)) if earliest <= today => (today - earliest).num_days().max(1),
                Ok(_) => i64::from(self.fallback_lookback_days),
                Err(e) => {
                    warn!(sensor = %strategy.sensor_id, error = %e, "earliest statistic lookup failed, using fallback lookback");
                    i64::from(self.fallback_lookback_days)
                }
            },
        };
        (today - Duration::days(days)).and_time(chrono::NaiveTime::MIN)
    }

    pub async fn load(&self, now: NaiveDateTime) -> Result<LoadedSeries, ProfileError> {
        let mut last_error = None;

        for strategy in &self.strategies {
            let start = self.lookback_start(strategy, now).await;
            match self
                .source
                .get_hourly_series(&strategy.sensor_id, start, now, strategy.field)
                .await
            {
                Ok(samples) if !samples.is_empty() => {
                    info!(
                        strategy = %strategy.name,
                        sensor = %strategy.sensor_id,
                        samples = samples.len(),
                        %start,
                        "loaded hourly history"
                    );
                    let samples = samples
                        .into_iter()
                        .map(|s| HourlySample::new(s.timestamp, strategy.to_kwh(s.value)))
                        .collect();
                    return Ok(LoadedSeries {
                        strategy: strategy.name.clone(),
                        start,
                        samples,
                    });
                }
                Ok(_) => {
                    debug!(strategy = %strategy.name, sensor = %strategy.sensor_id, "no hourly history, trying next source");
                }
                Err(e) => {
                    warn!(strategy = %strategy.name, sensor = %strategy.sensor_id, error = %e, "hourly history query failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e.into()),
            None => Err(ProfileError::NoHourlyStats),
        }
    }
}

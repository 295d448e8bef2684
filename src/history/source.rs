use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::domain::HourlySample;

/// Which hourly statistic to read from the time-series store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SeriesField {
    /// Hourly delta of a cumulative, daily-reset energy counter (kWh)
    Sum,
    /// Average power over the hour
    Mean,
}

/// Read access to stored hourly statistics.
///
/// Implementations may block on an expensive query; they are expected to
/// move that work off the async executor themselves.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HourlySeriesSource: Send + Sync {
    /// Samples in `[start, end)`, ordered by timestamp
    async fn get_hourly_series(
        &self,
        sensor_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        field: SeriesField,
    ) -> Result<Vec<HourlySample>>;

    /// First date with any stored statistic for the sensor
    async fn get_earliest_available(&self, sensor_id: &str) -> Result<Option<NaiveDate>>;
}

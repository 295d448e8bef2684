use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::RwLock;
use std::collections::HashMap;

use super::source::{HourlySeriesSource, SeriesField};
use crate::domain::HourlySample;

/// Hourly statistics held in memory, keyed by sensor id.
#[derive(Debug, Default)]
pub struct InMemorySeriesStore {
    series: RwLock<HashMap<String, Vec<HourlySample>>>,
}

impl InMemorySeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_series(series: HashMap<String, Vec<HourlySample>>) -> Self {
        let store = Self::new();
        for (sensor, samples) in series {
            store.extend(&sensor, samples);
        }
        store
    }

    /// Append samples, keeping each sensor's series ordered by time.
    pub fn extend(&self, sensor_id: &str, samples: impl IntoIterator<Item = HourlySample>) {
        let mut series = self.series.write();
        let entry = series.entry(sensor_id.to_string()).or_default();
        entry.extend(samples);
        entry.sort_by_key(|s| s.timestamp);
    }

    pub fn clear(&self) {
        self.series.write().clear();
    }

    pub fn range(
        &self,
        sensor_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Vec<HourlySample> {
        self.series
            .read()
            .get(sensor_id)
            .map(|samples| {
                samples
                    .iter()
                    .filter(|s| s.timestamp >= start && s.timestamp < end)
                    .copied()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn earliest(&self, sensor_id: &str) -> Option<NaiveDate> {
        self.series
            .read()
            .get(sensor_id)
            .and_then(|samples| samples.first())
            .map(HourlySample::date)
    }
}

#[async_trait]
impl HourlySeriesSource for InMemorySeriesStore {
    async fn get_hourly_series(
        &self,
        sensor_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        _field: SeriesField,
    ) -> Result<Vec<HourlySample>> {
        Ok(self.range(sensor_id, start, end))
    }

    async fn get_earliest_available(&self, sensor_id: &str) -> Result<Option<NaiveDate>> {
        Ok(self.earliest(sensor_id))
    }
}

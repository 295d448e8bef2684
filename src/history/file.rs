use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::path::PathBuf;

use super::memory::InMemorySeriesStore;
use super::source::{HourlySeriesSource, SeriesField};
use crate::domain::HourlySample;

/// Hourly statistics exported to a JSON file:
/// `{ "<sensor_id>": [{ "timestamp": "2025-01-01T00:00:00", "value": 0.42 }, ...] }`.
///
/// The file is re-read on every query so an external exporter can keep
/// rewriting it between cycles.
#[derive(Debug, Clone)]
pub struct JsonFileSeriesStore {
    path: PathBuf,
}

impl JsonFileSeriesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> Result<InMemorySeriesStore> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading sample store {}", self.path.display()))?;
        let series: HashMap<String, Vec<HourlySample>> =
            serde_json::from_str(&body).context("sample store JSON parse failed")?;
        Ok(InMemorySeriesStore::from_series(series))
    }
}

#[async_trait]
impl HourlySeriesSource for JsonFileSeriesStore {
    async fn get_hourly_series(
        &self,
        sensor_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        field: SeriesField,
    ) -> Result<Vec<HourlySample>> {
        self.load()
            .await?
            .get_hourly_series(sensor_id, start, end, field)
            .await
    }

    async fn get_earliest_available(&self, sensor_id: &str) -> Result<Option<NaiveDate>> {
        Ok(self.load().await?.earliest(sensor_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_reads_json_export() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"sensor.energy": [
                {{"timestamp": "2025-02-01T01:00:00", "value": 0.5}},
                {{"timestamp": "2025-02-01T00:00:00", "value": 0.25}}
            ]}}"#
        )
        .unwrap();

        let store = JsonFileSeriesStore::new(file.path());
        let start = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let end = start + chrono::Duration::days(1);
        let samples = store
            .get_hourly_series("sensor.energy", start, end, SeriesField::Sum)
            .await
            .unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].value, 0.25);
        assert_eq!(
            store.get_earliest_available("sensor.energy").await.unwrap(),
            Some(start.date())
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let store = JsonFileSeriesStore::new("/nonexistent/samples.json");
        assert!(store.get_earliest_available("sensor.energy").await.is_err());
    }
}

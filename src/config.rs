use anyhow::{bail, Result};
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;
use std::time::Duration;

use crate::forecast::SimilarityWeights;
use crate::history::{PowerUnit, SeriesStrategy};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub sources: SourcesConfig,
    #[serde(default)]
    pub profiles: ProfileTuning,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// IANA zone defining "today"; host local time when unset
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    /// Cumulative, daily-reset energy counter (kWh)
    pub energy_sensor: Option<String>,
    /// Average power sensor, used when the energy sensor has no history
    pub power_sensor: Option<String>,
    #[serde(default)]
    pub power_unit: PowerUnit,
    /// JSON file backing the bundled sample store
    pub store_path: String,
}

impl SourcesConfig {
    /// Ordered fallback list: energy counter first, then power.
    pub fn strategies(&self) -> Vec<SeriesStrategy> {
        let mut out = Vec::new();
        if let Some(sensor) = self.energy_sensor.as_deref().filter(|s| !s.is_empty()) {
            out.push(SeriesStrategy::energy(sensor));
        }
        if let Some(sensor) = self.power_sensor.as_deref().filter(|s| !s.is_empty()) {
            out.push(SeriesStrategy::power(sensor, self.power_unit));
        }
        out
    }
}

/// Tunables of the profile-matching engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProfileTuning {
    /// Fixed lookback; derived from the earliest stored sample when unset
    pub lookback_days: Option<u32>,
    pub fallback_lookback_days: u32,
    /// Days with more unknown hours than this are discarded
    pub max_missing_hours: usize,
    /// Hourly readings above this are treated as glitches (kWh/h)
    pub max_hourly_kwh: f64,
    pub top_matches: usize,
    /// Fraction of the hour-of-day median used as prediction floor
    pub floor_ratio: f64,
    /// RMSE (kWh/h) at which the RMSE component decays to 1/e
    pub rmse_scale: f64,
    pub weights: SimilarityWeights,
}

impl Default for ProfileTuning {
    fn default() -> Self {
        Self {
            lookback_days: None,
            fallback_lookback_days: 90,
            max_missing_hours: 6,
            max_hourly_kwh: 20.0,
            top_matches: 7,
            floor_ratio: 0.35,
            rmse_scale: 5.0,
            weights: SimilarityWeights::default(),
        }
    }
}

impl ProfileTuning {
    pub fn validate(&self) -> Result<()> {
        if self.top_matches == 0 {
            bail!("profiles.top_matches must be at least 1");
        }
        if self.max_missing_hours >= 24 {
            bail!("profiles.max_missing_hours must be below 24");
        }
        if !(self.max_hourly_kwh.is_finite() && self.max_hourly_kwh > 0.0) {
            bail!("profiles.max_hourly_kwh must be positive");
        }
        if !(0.0..=1.0).contains(&self.floor_ratio) {
            bail!("profiles.floor_ratio must be between 0 and 1");
        }
        if !(self.rmse_scale.is_finite() && self.rmse_scale > 0.0) {
            bail!("profiles.rmse_scale must be positive");
        }
        if self.fallback_lookback_days == 0 || self.lookback_days == Some(0) {
            bail!("profiles lookback must cover at least one day");
        }
        self.weights.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub interval_minutes: u64,
    pub startup_delay_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 15,
            startup_delay_seconds: 10,
        }
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.max(1) * 60)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_seconds)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed("PROFILER__").split("__")),
        )
    }

    pub fn from_toml_str(toml: &str) -> Result<Self> {
        Self::from_figment(Figment::new().merge(Toml::string(toml)))
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let cfg: Config = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sources.strategies().is_empty() {
            bail!("configure at least one of sources.energy_sensor or sources.power_sensor");
        }
        if let Some(tz) = &self.timezone {
            if tz.parse::<chrono_tz::Tz>().is_err() {
                bail!("unknown timezone {tz:?}");
            }
        }
        self.profiles.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::SeriesField;

    const MINIMAL: &str = r#"
        [sources]
        energy_sensor = "sensor.house_energy"
        store_path = "data/samples.json"
    "#;

    #[test]
    fn test_defaults_applied() {
        let cfg = Config::from_toml_str(MINIMAL).unwrap();
        assert_eq!(cfg.profiles, ProfileTuning::default());
        assert_eq!(cfg.scheduler.interval(), Duration::from_secs(900));
        assert!(cfg.timezone.is_none());
    }

    #[test]
    fn test_strategy_order() {
        let cfg = Config::from_toml_str(
            r#"
            timezone = "Europe/Prague"
            [sources]
            energy_sensor = "sensor.energy"
            power_sensor = "sensor.power"
            power_unit = "w"
            store_path = "x.json"
            [profiles]
            top_matches = 5
            floor_ratio = 0.2
            "#,
        )
        .unwrap();

        let strategies = cfg.sources.strategies();
        assert_eq!(strategies.len(), 2);
        assert_eq!(strategies[0].field, SeriesField::Sum);
        assert_eq!(strategies[1].sensor_id, "sensor.power");
        assert_eq!(strategies[1].field, SeriesField::Mean);
        assert_eq!(cfg.profiles.top_matches, 5);
        assert_eq!(cfg.profiles.max_missing_hours, 6);
    }

    #[test]
    fn test_rejects_missing_sensors() {
        let err = Config::from_toml_str(
            r#"
            [sources]
            store_path = "x.json"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("energy_sensor"));
    }

    #[test]
    fn test_rejects_bad_tuning() {
        let mut tuning = ProfileTuning::default();
        tuning.floor_ratio = 1.5;
        assert!(tuning.validate().is_err());

        let mut tuning = ProfileTuning::default();
        tuning.top_matches = 0;
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_timezone() {
        let toml = format!("timezone = \"Mars/Olympus\"\n{MINIMAL}");
        assert!(Config::from_toml_str(&toml).is_err());
    }
}

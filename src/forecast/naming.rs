//! Human-readable labels for a day of consumption.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::Display;

use super::stats;
use crate::domain::is_weekend;

/// A quadrant is a spike when its average exceeds the daily average by this factor
const SPIKE_RATIO: f64 = 1.3;

const HEATING_EVENING_KWH: f64 = 1.2;
const COOLING_AFTERNOON_KWH: f64 = 1.0;
const HOME_OFFICE_AFTERNOON_KWH: f64 = 0.8;
const NIGHT_HEATING_KWH: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Self::Winter,
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            _ => Self::Autumn,
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self::from_month(date.month())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum DayType {
    Weekday,
    Weekend,
}

impl DayType {
    pub fn of(date: NaiveDate) -> Self {
        if is_weekend(date) {
            Self::Weekend
        } else {
            Self::Weekday
        }
    }
}

/// What the day's shape most likely reflects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ProfileTag {
    #[strum(serialize = "heating")]
    Heating,
    #[strum(serialize = "air conditioning")]
    AirConditioning,
    #[strum(serialize = "laundry")]
    Laundry,
    #[strum(serialize = "home office")]
    HomeOffice,
    #[strum(serialize = "night heating")]
    NightHeating,
    #[strum(serialize = "evening peak")]
    EveningPeak,
    #[strum(serialize = "morning peak")]
    MorningPeak,
    #[strum(serialize = "afternoon peak")]
    AfternoonPeak,
    #[strum(serialize = "typical day")]
    TypicalDay,
}

/// Average consumption per six-hour quadrant of a day
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QuadrantAverages {
    pub daily: f64,
    pub night: f64,
    pub morning: f64,
    pub afternoon: f64,
    pub evening: f64,
}

impl QuadrantAverages {
    pub fn from_hours(hours: &[f64]) -> Self {
        let quadrant = |range: std::ops::Range<usize>| {
            hours
                .get(range.start.min(hours.len())..range.end.min(hours.len()))
                .and_then(stats::mean)
                .unwrap_or(0.0)
        };
        Self {
            daily: stats::mean(hours).unwrap_or(0.0),
            night: quadrant(0..6),
            morning: quadrant(6..12),
            afternoon: quadrant(12..18),
            evening: quadrant(18..24),
        }
    }

    fn is_spike(&self, quadrant: f64) -> bool {
        quadrant > self.daily * SPIKE_RATIO
    }
}

/// Classify a 24-hour vector. The first matching special tag wins, then the
/// strongest spike, then "typical day".
pub fn classify(hours: &[f64], season: Season, day_type: DayType) -> ProfileTag {
    let q = QuadrantAverages::from_hours(hours);

    if season == Season::Winter && q.evening > HEATING_EVENING_KWH {
        return ProfileTag::Heating;
    }
    if season == Season::Summer && q.afternoon > COOLING_AFTERNOON_KWH {
        return ProfileTag::AirConditioning;
    }
    if day_type == DayType::Weekend && q.is_spike(q.morning) {
        return ProfileTag::Laundry;
    }
    if day_type == DayType::Weekday && q.afternoon > HOME_OFFICE_AFTERNOON_KWH {
        return ProfileTag::HomeOffice;
    }
    if q.night > NIGHT_HEATING_KWH {
        return ProfileTag::NightHeating;
    }

    if q.is_spike(q.evening) {
        ProfileTag::EveningPeak
    } else if q.is_spike(q.morning) {
        ProfileTag::MorningPeak
    } else if q.is_spike(q.afternoon) {
        ProfileTag::AfternoonPeak
    } else {
        ProfileTag::TypicalDay
    }
}

/// Display label such as `"Weekend (laundry)"`.
pub fn describe(hours: &[f64], season: Season, day_type: DayType) -> String {
    format!("{day_type} ({})", classify(hours, season, day_type))
}

pub fn describe_date(hours: &[f64], date: NaiveDate) -> String {
    describe(hours, Season::of(date), DayType::of(date))
}

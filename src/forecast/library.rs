use chrono::{Duration, NaiveDate};
use itertools::Itertools;
use std::collections::BTreeMap;

use crate::domain::{DailyProfile, HistoricalProfile};

/// Every 72-hour window that can be stitched from three consecutive
/// calendar days, in chronological order.
#[derive(Debug, Clone, Default)]
pub struct HistoricalProfileLibrary {
    profiles: Vec<HistoricalProfile>,
}

impl HistoricalProfileLibrary {
    /// Triples spanning a missing day are skipped, never bridged.
    pub fn build(days: &BTreeMap<NaiveDate, DailyProfile>) -> Self {
        let profiles = days
            .values()
            .tuple_windows()
            .filter(|(a, b, c)| is_next_day(a.date, b.date) && is_next_day(b.date, c.date))
            .map(|(a, b, c)| HistoricalProfile::from_days([a, b, c]))
            .collect();
        Self { profiles }
    }

    pub fn profiles(&self) -> &[HistoricalProfile] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn is_next_day(earlier: NaiveDate, later: NaiveDate) -> bool {
    earlier + Duration::days(1) == later
}

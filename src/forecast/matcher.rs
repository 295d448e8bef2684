use chrono::NaiveDate;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;

use super::error::ProfileError;
use super::similarity::SimilarityScorer;
use crate::config::ProfileTuning;
use crate::domain::{HistoricalProfile, HourMedians, MatchSplit, HOURS_PER_DAY, WINDOW_HOURS};

/// A historical window together with its similarity to the current window.
#[derive(Debug, Clone, Copy)]
pub struct ScoredProfile<'a> {
    pub profile: &'a HistoricalProfile,
    pub score: f64,
}

/// Picks the historical windows that best resemble the current window.
#[derive(Debug, Clone)]
pub struct MatchSelector {
    scorer: SimilarityScorer,
    top_matches: usize,
}

impl Default for MatchSelector {
    fn default() -> Self {
        Self::from_tuning(&ProfileTuning::default())
    }
}

impl MatchSelector {
    pub fn new(scorer: SimilarityScorer, top_matches: usize) -> Self {
        Self {
            scorer,
            top_matches,
        }
    }

    pub fn from_tuning(tuning: &ProfileTuning) -> Self {
        Self::new(SimilarityScorer::from_tuning(tuning), tuning.top_matches)
    }

    /// Best matches first. Equal scores keep the library's chronological order.
    pub fn select<'a>(
        &self,
        current: &[f64],
        match_hours: usize,
        profiles: &'a [HistoricalProfile],
    ) -> Result<Vec<ScoredProfile<'a>>, ProfileError> {
        let window = current.get(..match_hours).unwrap_or(current);

        let mut scored: Vec<ScoredProfile<'a>> = profiles
            .iter()
            .filter(|p| p.len() >= match_hours)
            .map(|profile| ScoredProfile {
                profile,
                score: self.scorer.score(window, &profile.consumption[..match_hours]),
            })
            .collect();

        if scored.is_empty() {
            return Err(ProfileError::NoMatchingProfiles);
        }

        scored.sort_by_key(|s| Reverse(OrderedFloat(s.score)));
        scored.truncate(self.top_matches.max(1));
        Ok(scored)
    }
}

/// Averaged continuation of the selected matches
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedForecast {
    pub predicted_consumption: Vec<f64>,
    pub predicted_total: f64,
    pub predicted_avg: f64,
    pub sample_count: usize,
    pub similarity_score: f64,
    pub floor_applied_count: usize,
    pub best_match_start: NaiveDate,
    pub matched_profile_full: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct PredictionAggregator {
    floor_ratio: f64,
}

impl Default for PredictionAggregator {
    fn default() -> Self {
        Self::new(ProfileTuning::default().floor_ratio)
    }
}

impl PredictionAggregator {
    pub fn new(floor_ratio: f64) -> Self {
        Self { floor_ratio }
    }

    /// `matches` must be non-empty and ordered best first.
    pub fn aggregate(
        &self,
        matches: &[ScoredProfile<'_>],
        split: MatchSplit,
        current_hour: usize,
        hour_medians: &HourMedians,
    ) -> Result<AggregatedForecast, ProfileError> {
        let best = matches.first().ok_or(ProfileError::NoMatchingProfiles)?;

        let averaged = average_profiles(matches.iter().map(|m| m.profile));
        let end = (split.match_hours + split.predict_hours).min(averaged.len());
        let mut predicted = averaged
            .get(split.match_hours..end)
            .map(<[f64]>::to_vec)
            .unwrap_or_default();

        let floor_applied_count =
            apply_floor(&mut predicted, current_hour, hour_medians, self.floor_ratio);

        let predicted_total: f64 = predicted.iter().sum();
        let predicted_avg = if predicted.is_empty() {
            0.0
        } else {
            predicted_total / predicted.len() as f64
        };
        let similarity_score =
            matches.iter().map(|m| m.score).sum::<f64>() / matches.len() as f64;

        Ok(AggregatedForecast {
            predicted_consumption: predicted,
            predicted_total,
            predicted_avg,
            sample_count: matches.len(),
            similarity_score,
            floor_applied_count,
            best_match_start: best.profile.start_date,
            matched_profile_full: best.profile.consumption.clone(),
        })
    }
}

/// Element-wise mean over the 72 window positions; a position is averaged
/// over the profiles long enough to reach it.
fn average_profiles<'a>(profiles: impl Iterator<Item = &'a HistoricalProfile>) -> Vec<f64> {
    let mut sums = vec![0.0; WINDOW_HOURS];
    let mut counts = vec![0usize; WINDOW_HOURS];
    for profile in profiles {
        for (i, value) in profile.consumption.iter().take(WINDOW_HOURS).enumerate() {
            sums[i] += value;
            counts[i] += 1;
        }
    }
    sums.iter()
        .zip(&counts)
        .take_while(|(_, n)| **n > 0)
        .map(|(sum, n)| sum / *n as f64)
        .collect()
}

/// Raises each predicted hour to at least `ratio` times the median of its
/// hour of day. Values already at or above the floor are left untouched.
/// Returns the number of raised hours.
pub fn apply_floor(
    predicted: &mut [f64],
    current_hour: usize,
    hour_medians: &HourMedians,
    ratio: f64,
) -> usize {
    let mut applied = 0;
    for (offset, value) in predicted.iter_mut().enumerate() {
        let hour = (current_hour + offset) % HOURS_PER_DAY;
        let Some(median) = hour_medians.get(hour) else {
            continue;
        };
        let floor = median * ratio;
        if *value < floor {
            *value = floor;
            applied += 1;
        }
    }
    applied
}

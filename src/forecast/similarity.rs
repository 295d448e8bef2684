use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::stats;
use crate::config::ProfileTuning;

/// Relative weight of each similarity component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityWeights {
    pub correlation: f64,
    pub rmse: f64,
    pub magnitude: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            correlation: 0.50,
            rmse: 0.30,
            magnitude: 0.20,
        }
    }
}

impl SimilarityWeights {
    pub fn total(&self) -> f64 {
        self.correlation + self.rmse + self.magnitude
    }

    pub fn validate(&self) -> Result<()> {
        let all = [self.correlation, self.rmse, self.magnitude];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            bail!("similarity weights must be finite and non-negative");
        }
        if self.total() <= 0.0 {
            bail!("similarity weights must not all be zero");
        }
        Ok(())
    }
}

/// Individual components of a similarity score, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreComponents {
    pub correlation: f64,
    pub rmse: f64,
    pub magnitude: f64,
}

/// Scores how closely a historical segment follows the current window.
#[derive(Debug, Clone)]
pub struct SimilarityScorer {
    weights: SimilarityWeights,
    rmse_scale: f64,
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::new(SimilarityWeights::default(), 5.0)
    }
}

impl SimilarityScorer {
    pub fn new(weights: SimilarityWeights, rmse_scale: f64) -> Self {
        Self {
            weights,
            rmse_scale,
        }
    }

    pub fn from_tuning(tuning: &ProfileTuning) -> Self {
        Self::new(tuning.weights, tuning.rmse_scale)
    }

    /// Weighted similarity in [0, 1]. Never fails: mismatched lengths and any
    /// numeric breakdown score 0.0.
    pub fn score(&self, current: &[f64], candidate: &[f64]) -> f64 {
        let Some(c) = self.components(current, candidate) else {
            return 0.0;
        };
        let total_weight = self.weights.total();
        if total_weight <= 0.0 {
            return 0.0;
        }

        let score = (self.weights.correlation * c.correlation
            + self.weights.rmse * c.rmse
            + self.weights.magnitude * c.magnitude)
            / total_weight;

        if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn components(&self, current: &[f64], candidate: &[f64]) -> Option<ScoreComponents> {
        if current.len() != candidate.len() || current.is_empty() {
            return None;
        }
        if current.iter().chain(candidate).any(|v| !v.is_finite()) {
            return None;
        }

        let correlation = correlation_score(current, candidate)?;
        let rmse = (-stats::rmse(current, candidate)? / self.rmse_scale).exp();
        let magnitude = magnitude_score(current, candidate);

        let components = ScoreComponents {
            correlation,
            rmse,
            magnitude,
        };
        [correlation, rmse, magnitude]
            .iter()
            .all(|v| v.is_finite())
            .then_some(components)
    }
}

/// Positive Pearson correlation. Two flat series share the same (flat) shape
/// and count as fully correlated; a flat series against a varying one scores 0.
fn correlation_score(current: &[f64], candidate: &[f64]) -> Option<f64> {
    let flat_current = stats::variance(current)? <= f64::EPSILON;
    let flat_candidate = stats::variance(candidate)? <= f64::EPSILON;
    match (flat_current, flat_candidate) {
        (true, true) => Some(1.0),
        (true, false) | (false, true) => Some(0.0),
        (false, false) => Some(stats::pearson(current, candidate).unwrap_or(0.0).max(0.0)),
    }
}

fn magnitude_score(current: &[f64], candidate: &[f64]) -> f64 {
    let sum_current: f64 = current.iter().sum();
    let sum_candidate: f64 = candidate.iter().sum();

    if sum_candidate > 0.0 {
        (-(sum_current - sum_candidate).abs() / sum_candidate).exp()
    } else if sum_current == 0.0 {
        1.0
    } else {
        0.0
    }
}

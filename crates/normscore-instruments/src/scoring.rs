use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Tolerance for floating point comparisons against declared bounds.
pub(crate) const EPSILON: f64 = 1e-9;

/// The kind of value a score or classification cutoff is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ScoreType {
    /// Unadjusted sum or count.
    Raw,
    /// Percentile rank (0–100).
    Percentile,
    /// Standard score, mean=0, SD=1.
    ZScore,
    /// T-score, mean=50, SD=10.
    TScore,
}

impl fmt::Display for ScoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScoreType::Raw => "raw",
            ScoreType::Percentile => "percentile",
            ScoreType::ZScore => "z-score",
            ScoreType::TScore => "T-score",
        };
        f.write_str(name)
    }
}

/// Defines the valid range for a score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub step: Option<f64>,
}

impl ScoreRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            step: None,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        if value < self.min - EPSILON || value > self.max + EPSILON {
            return false;
        }
        if let Some(step) = self.step {
            let offset = value - self.min;
            let remainder = offset.rem_euclid(step);
            // Allow floating point tolerance
            remainder < EPSILON || (step - remainder) < EPSILON
        } else {
            true
        }
    }

    pub(crate) fn is_well_formed(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.min <= self.max
            && self.step.is_none_or(|s| s.is_finite() && s > 0.0)
    }
}

/// Raw scores for one scoring event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RawScoreResult {
    pub total: f64,
    /// Per-section subtotals. Empty unless the rule is sectioned.
    pub sections: BTreeMap<String, f64>,
}

impl RawScoreResult {
    pub fn total(total: f64) -> Self {
        Self {
            total,
            sections: BTreeMap::new(),
        }
    }
}

/// A raw score expressed against a demographic reference population.
///
/// Produced once per scoring event and never edited; rescoring produces a
/// new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NormalizedResult {
    pub raw_score: f64,
    pub percentile: Option<f64>,
    pub z_score: Option<f64>,
    pub t_score: Option<f64>,
    pub classification: Option<String>,
    pub matched_bin_id: Option<String>,
    /// The table's default bin was used because no bin matched.
    pub fallback: bool,
}

impl NormalizedResult {
    /// A result with no normative reference at all.
    pub fn unnormed(raw_score: f64) -> Self {
        Self {
            raw_score,
            percentile: None,
            z_score: None,
            t_score: None,
            classification: None,
            matched_bin_id: None,
            fallback: false,
        }
    }

    /// The value a classification of the given basis is applied to.
    pub fn value_for(&self, basis: ScoreType) -> Option<f64> {
        match basis {
            ScoreType::Raw => Some(self.raw_score),
            ScoreType::Percentile => self.percentile,
            ScoreType::ZScore => self.z_score,
            ScoreType::TScore => self.t_score,
        }
    }
}

/// Everything the persistence layer stores for one scoring event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScoringOutcome {
    pub instrument_id: String,
    pub raw: RawScoreResult,
    pub overall: NormalizedResult,
    pub sections: BTreeMap<String, NormalizedResult>,
}

use serde::{Deserialize, Serialize};

use crate::error::InstrumentError;
use crate::scoring::{EPSILON, NormalizedResult, ScoreRange, ScoreType};

/// A named cutoff range, half-open `[min, max)` unless it is the last band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationBand {
    pub label: String,
    pub min: f64,
    pub max: f64,
}

impl ClassificationBand {
    pub fn new(label: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            label: label.into(),
            min,
            max,
        }
    }
}

/// Ordered, contiguous qualitative labels over one kind of score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub basis: ScoreType,
    pub bands: Vec<ClassificationBand>,
}

impl Classification {
    /// Bands must be ordered, touch end to end, and cover the span the
    /// basis can take: the rule bounds for raw scores, 0–100 for
    /// percentiles. Z- and T-scores are unbounded and only checked at
    /// classification time.
    pub fn validate(&self, raw_bounds: &ScoreRange) -> Result<(), InstrumentError> {
        let (Some(first), Some(last)) = (self.bands.first(), self.bands.last()) else {
            return Err(InstrumentError::invalid("classification declares no bands"));
        };

        for band in &self.bands {
            if !band.min.is_finite() || !band.max.is_finite() || band.min > band.max {
                return Err(InstrumentError::invalid(format!(
                    "band '{}' has an invalid range [{}, {}]",
                    band.label, band.min, band.max
                )));
            }
        }

        for pair in self.bands.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev.min >= prev.max {
                return Err(InstrumentError::invalid(format!(
                    "band '{}' is empty",
                    prev.label
                )));
            }
            if next.min > prev.max + EPSILON {
                return Err(InstrumentError::ClassificationGap {
                    basis: self.basis,
                    value: prev.max,
                });
            }
            if next.min < prev.max - EPSILON {
                return Err(InstrumentError::invalid(format!(
                    "bands '{}' and '{}' overlap",
                    prev.label, next.label
                )));
            }
        }

        let span = match self.basis {
            ScoreType::Raw => Some((raw_bounds.min, raw_bounds.max)),
            ScoreType::Percentile => Some((0.0, 100.0)),
            ScoreType::ZScore | ScoreType::TScore => None,
        };
        if let Some((low, high)) = span {
            if first.min > low + EPSILON {
                return Err(InstrumentError::ClassificationGap {
                    basis: self.basis,
                    value: low,
                });
            }
            if last.max < high - EPSILON {
                return Err(InstrumentError::ClassificationGap {
                    basis: self.basis,
                    value: high,
                });
            }
        }
        Ok(())
    }

    /// Label for a value of this classification's basis.
    pub fn classify(&self, value: f64) -> Result<&str, InstrumentError> {
        let last = self.bands.len().saturating_sub(1);
        self.bands
            .iter()
            .enumerate()
            .find(|(i, band)| {
                value >= band.min - EPSILON
                    && (value < band.max || (*i == last && value <= band.max + EPSILON))
            })
            .map(|(_, band)| band.label.as_str())
            .ok_or(InstrumentError::ClassificationGap {
                basis: self.basis,
                value,
            })
    }

    /// Label for a normalized result, reading the value named by the basis.
    pub fn label_for(&self, result: &NormalizedResult) -> Result<&str, InstrumentError> {
        let value = result
            .value_for(self.basis)
            .ok_or(InstrumentError::ClassificationUnavailable { basis: self.basis })?;
        self.classify(value)
    }
}

//! Normative reference tables and demographic bin matching.

use std::collections::HashSet;

use normscore_core::models::demographics::{Demographics, Sex};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::InstrumentError;

/// Which respondents a bin covers by sex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SexFilter {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "both")]
    Both,
}

impl SexFilter {
    fn admits(self, sex: Sex) -> bool {
        matches!(
            (self, sex),
            (SexFilter::Both, _) | (SexFilter::Male, Sex::Male) | (SexFilter::Female, Sex::Female)
        )
    }
}

/// One (raw score, percentile) entry of a discrete lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentilePoint {
    pub raw: f64,
    pub percentile: f64,
}

/// The reference population statistics a bin carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReferenceStatistics {
    /// Sparse raw → percentile table, sorted by raw score.
    PercentileTable { points: Vec<PercentilePoint> },
    /// Normal approximation.
    MeanSd { mean: f64, sd: f64 },
}

/// One demographic stratum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormBin {
    pub id: String,
    /// Inclusive.
    pub age_min: u32,
    /// Inclusive.
    pub age_max: u32,
    pub sex: SexFilter,
    #[serde(default)]
    pub education: Option<String>,
    pub reference: ReferenceStatistics,
}

impl NormBin {
    fn admits(&self, profile: &Demographics) -> bool {
        let age_ok = (self.age_min..=self.age_max).contains(&profile.age);
        let education_ok = match (&self.education, &profile.education) {
            (None, _) => true,
            (Some(wanted), Some(given)) => same_education(wanted, given),
            (Some(_), None) => false,
        };
        age_ok && self.sex.admits(profile.sex) && education_ok
    }

    /// Higher is more specific: explicit sex first, then an education
    /// constraint.
    fn specificity(&self) -> (bool, bool) {
        (self.sex != SexFilter::Both, self.education.is_some())
    }
}

fn same_education(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// A reference table for one instrument, optionally scoped to a section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormativeTable {
    pub id: String,
    pub name: String,
    /// Section the table norms. `None` norms the overall score.
    #[serde(default)]
    pub section: Option<String>,
    pub bins: Vec<NormBin>,
    /// Bin used when nothing matches the respondent.
    #[serde(default)]
    pub default_bin: Option<String>,
}

/// The bin chosen for one normalization call.
#[derive(Debug, Clone, Copy)]
pub struct BinMatch<'a> {
    pub bin: &'a NormBin,
    /// True when the table's default bin stood in for a missing match.
    pub fallback: bool,
}

impl NormativeTable {
    pub fn bin(&self, id: &str) -> Option<&NormBin> {
        self.bins.iter().find(|b| b.id == id)
    }

    /// Check the table can be used for matching and normalization.
    pub fn validate(&self) -> Result<(), InstrumentError> {
        if self.bins.is_empty() {
            return Err(InstrumentError::invalid(format!(
                "table '{}' has no bins",
                self.id
            )));
        }

        let mut ids = HashSet::new();
        for bin in &self.bins {
            if !ids.insert(bin.id.as_str()) {
                return Err(InstrumentError::invalid(format!(
                    "table '{}' has duplicate bin id '{}'",
                    self.id, bin.id
                )));
            }
            if bin.age_min > bin.age_max {
                return Err(InstrumentError::invalid(format!(
                    "bin '{}' has age_min {} above age_max {}",
                    bin.id, bin.age_min, bin.age_max
                )));
            }
            validate_reference(bin)?;
        }

        if let Some(default) = &self.default_bin
            && self.bin(default).is_none()
        {
            return Err(InstrumentError::invalid(format!(
                "table '{}' default bin '{default}' does not exist",
                self.id
            )));
        }
        Ok(())
    }
}

fn validate_reference(bin: &NormBin) -> Result<(), InstrumentError> {
    match &bin.reference {
        ReferenceStatistics::MeanSd { mean, sd } => {
            if !mean.is_finite() || !sd.is_finite() || *sd < 0.0 {
                return Err(InstrumentError::invalid(format!(
                    "bin '{}' has invalid mean/sd {mean}/{sd}",
                    bin.id
                )));
            }
            if *sd == 0.0 {
                return Err(InstrumentError::ZeroStandardDeviation {
                    bin_id: bin.id.clone(),
                });
            }
        }
        ReferenceStatistics::PercentileTable { points } => {
            if points.is_empty() {
                return Err(InstrumentError::invalid(format!(
                    "bin '{}' has an empty percentile table",
                    bin.id
                )));
            }
            if let Some(p) = points
                .iter()
                .find(|p| !p.raw.is_finite() || !(0.0..=100.0).contains(&p.percentile))
            {
                return Err(InstrumentError::invalid(format!(
                    "bin '{}' has an invalid percentile entry {} -> {}",
                    bin.id, p.raw, p.percentile
                )));
            }
            if points.windows(2).any(|pair| pair[0].raw >= pair[1].raw) {
                return Err(InstrumentError::invalid(format!(
                    "bin '{}' percentile table is not strictly increasing by raw score",
                    bin.id
                )));
            }
        }
    }
    Ok(())
}

/// Select the one authoritative bin for a respondent.
///
/// Candidates must contain the age (both ends inclusive), admit the sex and
/// satisfy any education constraint. The most specific candidate wins; a
/// tie at the top is reported, never resolved arbitrarily. With no
/// candidate the default bin is used when the table declares one.
pub fn match_bin<'a>(
    table: &'a NormativeTable,
    profile: &Demographics,
) -> Result<BinMatch<'a>, InstrumentError> {
    let candidates: Vec<&NormBin> = table.bins.iter().filter(|b| b.admits(profile)).collect();

    if let Some(best) = candidates.iter().map(|b| b.specificity()).max() {
        let top: Vec<&NormBin> = candidates
            .into_iter()
            .filter(|b| b.specificity() == best)
            .collect();
        if let [bin] = top.as_slice() {
            debug!(table = %table.id, bin = %bin.id, "normative bin matched");
            return Ok(BinMatch {
                bin: *bin,
                fallback: false,
            });
        }
        return Err(InstrumentError::AmbiguousBinMatch {
            table_id: table.id.clone(),
            candidates: top.iter().map(|b| b.id.clone()).collect(),
        });
    }

    match table.default_bin.as_deref().and_then(|id| table.bin(id)) {
        Some(bin) => {
            warn!(
                table = %table.id,
                bin = %bin.id,
                age = profile.age,
                sex = %profile.sex,
                "no normative bin matched, using default bin"
            );
            Ok(BinMatch {
                bin,
                fallback: true,
            })
        }
        None => Err(InstrumentError::NoMatchingBin {
            table_id: table.id.clone(),
            age: profile.age,
            sex: profile.sex,
            education: profile.education.clone(),
        }),
    }
}

use tracing::debug;

use crate::classification::Classification;
use crate::error::InstrumentError;
use crate::norms::{BinMatch, PercentilePoint, ReferenceStatistics};
use crate::scoring::{EPSILON, NormalizedResult};

/// Express a raw score against the matched bin's reference statistics.
///
/// Percentile tables give a percentile only. Mean/SD bins give z, T
/// (`50 + 10z`) and a percentile from the standard normal CDF.
pub fn normalize(
    raw_score: f64,
    matched: &BinMatch<'_>,
    classification: Option<&Classification>,
) -> Result<NormalizedResult, InstrumentError> {
    let bin = matched.bin;
    let mut result = NormalizedResult {
        matched_bin_id: Some(bin.id.clone()),
        fallback: matched.fallback,
        ..NormalizedResult::unnormed(raw_score)
    };

    match &bin.reference {
        ReferenceStatistics::PercentileTable { points } => {
            let percentile = percentile_at(points, raw_score).ok_or_else(|| {
                InstrumentError::invalid(format!("bin '{}' has an empty percentile table", bin.id))
            })?;
            result.percentile = Some(percentile);
        }
        ReferenceStatistics::MeanSd { mean, sd } => {
            if sd.abs() < f64::EPSILON {
                return Err(InstrumentError::ZeroStandardDeviation {
                    bin_id: bin.id.clone(),
                });
            }
            let z = (raw_score - mean) / sd;
            result.z_score = Some(z);
            result.t_score = Some(t_score(z));
            result.percentile = Some((standard_normal_cdf(z) * 100.0).clamp(0.0, 100.0));
        }
    }

    if let Some(classification) = classification {
        result.classification = Some(classification.label_for(&result)?.to_string());
    }

    debug!(
        bin = %bin.id,
        fallback = result.fallback,
        percentile = ?result.percentile,
        z = ?result.z_score,
        "raw score normalized"
    );
    Ok(result)
}

/// A result with no reference table, classified by raw score when the
/// instrument says so.
pub fn without_norms(
    raw_score: f64,
    classification: Option<&Classification>,
) -> Result<NormalizedResult, InstrumentError> {
    let mut result = NormalizedResult::unnormed(raw_score);
    if let Some(classification) = classification {
        result.classification = Some(classification.label_for(&result)?.to_string());
    }
    Ok(result)
}

/// Floor lookup: the percentile of the closest entry at or below `raw`.
///
/// Below the first entry the first entry's percentile is returned; above
/// the last, the last entry's. Nothing is interpolated or extrapolated.
pub fn percentile_at(points: &[PercentilePoint], raw: f64) -> Option<f64> {
    let first = points.first()?;
    if raw < first.raw {
        return Some(first.percentile);
    }
    points
        .iter()
        .take_while(|p| p.raw <= raw + EPSILON)
        .last()
        .map(|p| p.percentile)
}

pub fn t_score(z: f64) -> f64 {
    50.0 + 10.0 * z
}

/// Standard normal CDF via the error function.
pub fn standard_normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

/// Abramowitz and Stegun 7.1.26, absolute error below 1.5e-7.
fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    sign * y
}

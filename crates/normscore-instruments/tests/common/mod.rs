#![allow(dead_code)]

use normscore_core::models::question::{ItemType, Question};
use normscore_core::models::response::{ResponseValue, Responses};
use normscore_core::models::scale::ResponseScale;
use normscore_instruments::form::TestForm;
use normscore_instruments::norms::{
    NormBin, NormativeTable, PercentilePoint, ReferenceStatistics, SexFilter,
};
use normscore_instruments::scoring::ScoreRange;

pub const SCALE: &str = "s0_3";

/// `count` likert items `q1..qN` on a 0–3 scale.
pub fn likert_form(count: u32) -> TestForm {
    let questions = (1..=count)
        .map(|n| Question::new(format!("q{n}"), n, ItemType::Likert).with_scale(SCALE))
        .collect();
    TestForm::new(questions, vec![ResponseScale::numeric(SCALE, 0..=3)])
}

/// Every question of the form answered with `value`.
pub fn answer_all(form: &TestForm, value: impl Into<ResponseValue> + Clone) -> Responses {
    form.questions
        .iter()
        .map(|q| (q.id.clone(), value.clone().into()))
        .collect()
}

pub fn bounds(min: f64, max: f64) -> ScoreRange {
    ScoreRange::new(min, max)
}

pub fn mean_sd_bin(id: &str, ages: (u32, u32), sex: SexFilter, mean: f64, sd: f64) -> NormBin {
    NormBin {
        id: id.to_string(),
        age_min: ages.0,
        age_max: ages.1,
        sex,
        education: None,
        reference: ReferenceStatistics::MeanSd { mean, sd },
    }
}

pub fn percentile_bin(id: &str, points: &[(f64, f64)]) -> NormBin {
    NormBin {
        id: id.to_string(),
        age_min: 0,
        age_max: 120,
        sex: SexFilter::Both,
        education: None,
        reference: ReferenceStatistics::PercentileTable {
            points: points
                .iter()
                .map(|&(raw, percentile)| PercentilePoint { raw, percentile })
                .collect(),
        },
    }
}

pub fn table(bins: Vec<NormBin>) -> NormativeTable {
    NormativeTable {
        id: "adult".to_string(),
        name: "Adult norms".to_string(),
        section: None,
        bins,
        default_bin: None,
    }
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} ± {tolerance}, got {actual}"
    );
}

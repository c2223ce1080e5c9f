use crate::Instrument;
use crate::classification::{Classification, ClassificationBand};
use crate::definition::InstrumentDefinition;
use crate::form::TestForm;
use crate::rules::CalculationRule;
use crate::scoring::{ScoreRange, ScoreType};

use super::{likert_items, two_week_frequency};

/// PHQ-9: Patient Health Questionnaire, depression module.
/// 9 items rated 0–3 over the last two weeks. Total 0–27, severity by raw
/// cutoffs. The functional-difficulty item is not scored.
pub struct Phq9;

impl Instrument for Phq9 {
    fn definition(&self) -> &InstrumentDefinition {
        static DEFINITION: std::sync::LazyLock<InstrumentDefinition> =
            std::sync::LazyLock::new(|| InstrumentDefinition {
                id: "phq9".to_string(),
                name: "PHQ-9".to_string(),
                form: TestForm::new(
                    likert_items("phq9", 9, "phq_frequency"),
                    vec![two_week_frequency("phq_frequency")],
                ),
                rule: CalculationRule::SimpleSum {
                    bounds: ScoreRange {
                        min: 0.0,
                        max: 27.0,
                        step: Some(1.0),
                    },
                },
                norms: vec![],
                classification: Some(Classification {
                    basis: ScoreType::Raw,
                    bands: vec![
                        ClassificationBand::new("Minimal", 0.0, 5.0),
                        ClassificationBand::new("Mild", 5.0, 10.0),
                        ClassificationBand::new("Moderate", 10.0, 15.0),
                        ClassificationBand::new("Moderately severe", 15.0, 20.0),
                        ClassificationBand::new("Severe", 20.0, 27.0),
                    ],
                }),
                section_classifications: Default::default(),
            });
        &DEFINITION
    }
}

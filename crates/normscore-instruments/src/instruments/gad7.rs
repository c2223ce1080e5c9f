use crate::Instrument;
use crate::classification::{Classification, ClassificationBand};
use crate::definition::InstrumentDefinition;
use crate::form::TestForm;
use crate::rules::CalculationRule;
use crate::scoring::{ScoreRange, ScoreType};

use super::{likert_items, two_week_frequency};

/// GAD-7: Generalized Anxiety Disorder scale.
/// 7 items rated 0–3. Total 0–21; 10+ warrants further evaluation.
pub struct Gad7;

impl Instrument for Gad7 {
    fn definition(&self) -> &InstrumentDefinition {
        static DEFINITION: std::sync::LazyLock<InstrumentDefinition> =
            std::sync::LazyLock::new(|| InstrumentDefinition {
                id: "gad7".to_string(),
                name: "GAD-7".to_string(),
                form: TestForm::new(
                    likert_items("gad7", 7, "gad_frequency"),
                    vec![two_week_frequency("gad_frequency")],
                ),
                rule: CalculationRule::SimpleSum {
                    bounds: ScoreRange {
                        min: 0.0,
                        max: 21.0,
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
                        ClassificationBand::new("Severe", 15.0, 21.0),
                    ],
                }),
                section_classifications: Default::default(),
            });
        &DEFINITION
    }
}

//! normscore-instruments
//!
//! The scoring engine: response validation, raw-score rules, normative bin
//! matching, normalization and classification. Pure functions over
//! already-loaded data. No I/O.

pub mod calculator;
pub mod classification;
pub mod definition;
pub mod error;
pub mod form;
pub mod instruments;
pub mod normalize;
pub mod norms;
pub mod pipeline;
pub mod rules;
pub mod scoring;
pub mod validate;

use normscore_core::models::demographics::Demographics;
use normscore_core::models::response::Responses;

use definition::InstrumentDefinition;
use error::InstrumentError;
use scoring::ScoringOutcome;

/// Trait implemented by each scorable instrument.
pub trait Instrument: Send + Sync {
    /// The data that drives scoring.
    fn definition(&self) -> &InstrumentDefinition;

    /// Unique identifier for this instrument (e.g., "phq9").
    fn id(&self) -> &str {
        &self.definition().id
    }

    /// Human-readable name (e.g., "PHQ-9").
    fn name(&self) -> &str {
        &self.definition().name
    }

    /// Advisory completeness check for partially saved responses.
    fn validate_responses(&self, responses: &Responses) -> Result<(), InstrumentError> {
        validate::validate_responses(&self.definition().form, responses)
    }

    /// Score a completed administration.
    fn score(
        &self,
        responses: &Responses,
        demographics: Option<&Demographics>,
    ) -> Result<ScoringOutcome, InstrumentError> {
        pipeline::score(self.definition(), responses, demographics)
    }
}

impl Instrument for InstrumentDefinition {
    fn definition(&self) -> &InstrumentDefinition {
        self
    }
}

/// Return all built-in instruments.
pub fn all_instruments() -> Vec<Box<dyn Instrument>> {
    vec![
        Box::new(instruments::phq9::Phq9),
        Box::new(instruments::gad7::Gad7),
    ]
}

/// Look up a built-in instrument by ID.
pub fn get_instrument(id: &str) -> Option<Box<dyn Instrument>> {
    all_instruments().into_iter().find(|i| i.id() == id)
}

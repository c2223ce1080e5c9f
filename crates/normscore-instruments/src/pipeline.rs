use std::collections::BTreeMap;

use normscore_core::models::demographics::Demographics;
use normscore_core::models::response::Responses;
use tracing::info;

use crate::calculator::compute_raw_score;
use crate::classification::Classification;
use crate::definition::InstrumentDefinition;
use crate::error::InstrumentError;
use crate::norms::{NormativeTable, match_bin};
use crate::normalize::{normalize, without_norms};
use crate::scoring::{NormalizedResult, ScoringOutcome};
use crate::validate::validate_responses;

/// Run a full scoring event: validate, compute raw scores, normalize the
/// overall score and every section, classify.
///
/// Any error means nothing should be persisted for this event.
pub fn score(
    definition: &InstrumentDefinition,
    responses: &Responses,
    demographics: Option<&Demographics>,
) -> Result<ScoringOutcome, InstrumentError> {
    definition.validate()?;
    validate_responses(&definition.form, responses)?;

    if definition.is_normed() && demographics.is_none() {
        return Err(InstrumentError::MissingDemographics(definition.id.clone()));
    }

    let raw = compute_raw_score(&definition.form, responses, &definition.rule)?;

    let overall = normalize_scope(
        raw.total,
        definition.overall_table(),
        demographics,
        definition.classification.as_ref(),
    )?;

    let mut sections = BTreeMap::new();
    for (name, subtotal) in &raw.sections {
        let result = normalize_scope(
            *subtotal,
            definition.section_table(name),
            demographics,
            definition.section_classifications.get(name),
        )?;
        sections.insert(name.clone(), result);
    }

    info!(
        instrument = %definition.id,
        raw = raw.total,
        classification = overall.classification.as_deref().unwrap_or("-"),
        fallback = overall.fallback,
        "instrument scored"
    );

    Ok(ScoringOutcome {
        instrument_id: definition.id.clone(),
        raw,
        overall,
        sections,
    })
}

fn normalize_scope(
    raw_score: f64,
    table: Option<&NormativeTable>,
    demographics: Option<&Demographics>,
    classification: Option<&Classification>,
) -> Result<NormalizedResult, InstrumentError> {
    match (table, demographics) {
        (Some(table), Some(profile)) => {
            let matched = match_bin(table, profile)?;
            normalize(raw_score, &matched, classification)
        }
        _ => without_norms(raw_score, classification),
    }
}

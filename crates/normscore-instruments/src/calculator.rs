use std::collections::BTreeMap;

use normscore_core::models::question::Question;
use normscore_core::models::response::Responses;
use tracing::debug;

use crate::error::InstrumentError;
use crate::form::{Answer, TestForm};
use crate::rules::{AnswerKey, CalculationRule, SectionCombination, SectionRange};
use crate::scoring::{EPSILON, RawScoreResult, ScoreRange};

/// Compute the raw score of a completed form under `rule`.
///
/// Pure: the responses are only read, nothing is clamped, and a required
/// question without an answer is an error rather than a zero.
pub fn compute_raw_score(
    form: &TestForm,
    responses: &Responses,
    rule: &CalculationRule,
) -> Result<RawScoreResult, InstrumentError> {
    form.validate()?;
    rule.validate(form)?;

    let result = match rule {
        CalculationRule::SimpleSum { .. } => {
            RawScoreResult::total(sum_items(form, responses, form.ordered(), |_| 1.0)?)
        }
        CalculationRule::WeightedSum { weights, .. } => {
            let weight_of = |q: &Question| weights.get(&q.id).copied().unwrap_or(1.0);
            RawScoreResult::total(sum_items(form, responses, form.ordered(), weight_of)?)
        }
        CalculationRule::SectionedSum {
            sections, combine, ..
        } => sectioned(form, responses, sections, *combine)?,
        CalculationRule::AnswerKey { key, .. } => {
            RawScoreResult::total(count_correct(form, responses, key)?)
        }
    };

    check_bounds("total", result.total, rule.bounds())?;
    debug!(
        total = result.total,
        sections = result.sections.len(),
        "raw score computed"
    );
    Ok(result)
}

fn sum_items<'q>(
    form: &TestForm,
    responses: &Responses,
    questions: impl IntoIterator<Item = &'q Question>,
    weight_of: impl Fn(&Question) -> f64,
) -> Result<f64, InstrumentError> {
    let mut total = 0.0;
    for question in questions {
        if let Some(value) = form.answer_for(question, responses)? {
            total += form.item_score(question, value)? * weight_of(question);
        }
    }
    Ok(total)
}

fn sectioned(
    form: &TestForm,
    responses: &Responses,
    sections: &[SectionRange],
    combine: SectionCombination,
) -> Result<RawScoreResult, InstrumentError> {
    let ordered = form.ordered();
    let mut subtotals = BTreeMap::new();

    for section in sections {
        let members = ordered
            .iter()
            .copied()
            .filter(|q| section.covers(q.position));
        let subtotal = sum_items(form, responses, members, |_| 1.0)?;
        if let Some(bounds) = &section.bounds {
            check_bounds(&section.name, subtotal, bounds)?;
        }
        subtotals.insert(section.name.clone(), subtotal);
    }

    let total = match combine {
        SectionCombination::Sum => subtotals.values().sum(),
        SectionCombination::Max => subtotals
            .values()
            .copied()
            .reduce(f64::max)
            .unwrap_or_default(),
    };

    Ok(RawScoreResult {
        total,
        sections: subtotals,
    })
}

/// Count questions whose answer equals the key entry stored at the
/// question's position-derived index.
fn count_correct(
    form: &TestForm,
    responses: &Responses,
    key: &AnswerKey,
) -> Result<f64, InstrumentError> {
    let mut correct = 0u32;
    for question in form.ordered() {
        let Some(expected) = key.answer_for(question.position) else {
            continue;
        };
        let Some(given) = form.answer_for(question, responses)? else {
            continue;
        };
        let given = form.resolve(question, given)?;
        let expected = form.resolve(question, expected)?;
        if answers_match(&given, &expected) {
            correct += 1;
        }
    }
    Ok(f64::from(correct))
}

/// Choices match by option identity, free numbers by value.
fn answers_match(given: &Answer, expected: &Answer) -> bool {
    match (given, expected) {
        (Answer::Choice { option: a, .. }, Answer::Choice { option: b, .. }) => a == b,
        (Answer::Number(a), Answer::Number(b)) => (a - b).abs() < EPSILON,
        (Answer::Multi(a), Answer::Multi(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|((x, _), (y, _))| x == y)
        }
        _ => false,
    }
}

fn check_bounds(scope: &str, value: f64, bounds: &ScoreRange) -> Result<(), InstrumentError> {
    if bounds.contains(value) {
        Ok(())
    } else {
        Err(InstrumentError::ScoreOutOfDeclaredBounds {
            scope: scope.to_string(),
            value,
            min: bounds.min,
            max: bounds.max,
        })
    }
}

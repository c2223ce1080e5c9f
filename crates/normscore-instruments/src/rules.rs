use std::collections::{BTreeMap, HashSet};
use std::fmt;

use normscore_core::models::response::ResponseValue;
use serde::{Deserialize, Serialize};

use crate::error::InstrumentError;
use crate::form::TestForm;
use crate::scoring::ScoreRange;

/// How a test turns validated responses into a raw score.
///
/// Selected per instrument by data, matched exhaustively by the calculator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CalculationRule {
    /// Sum of (possibly inverted) item values.
    SimpleSum { bounds: ScoreRange },
    /// Sum of item value × weight; unlisted questions weigh 1.
    WeightedSum {
        bounds: ScoreRange,
        #[serde(default)]
        weights: BTreeMap<String, f64>,
    },
    /// Simple sums restricted to contiguous position ranges.
    SectionedSum {
        bounds: ScoreRange,
        sections: Vec<SectionRange>,
        #[serde(default)]
        combine: SectionCombination,
    },
    /// Count of answers equal to the keyed answer.
    AnswerKey { bounds: ScoreRange, key: AnswerKey },
}

/// A named, inclusive range of question positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionRange {
    pub name: String,
    pub start: u32,
    pub end: u32,
    #[serde(default)]
    pub bounds: Option<ScoreRange>,
}

impl SectionRange {
    pub fn new(name: impl Into<String>, start: u32, end: u32) -> Self {
        Self {
            name: name.into(),
            start,
            end,
            bounds: None,
        }
    }

    pub fn covers(&self, position: u32) -> bool {
        (self.start..=self.end).contains(&position)
    }
}

/// How section subtotals combine into the overall raw score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionCombination {
    #[default]
    Sum,
    Max,
}

/// Which storage index the key uses for the first question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexBase {
    Zero,
    One,
}

impl fmt::Display for IndexBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexBase::Zero => f.write_str("0"),
            IndexBase::One => f.write_str("1"),
        }
    }
}

/// Correct answers by storage index, with the indexing base declared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerKey {
    pub index_base: IndexBase,
    pub answers: BTreeMap<u32, ResponseValue>,
}

impl AnswerKey {
    /// Storage index holding the answer for the question at `position`.
    pub fn storage_index(&self, position: u32) -> Option<u32> {
        match self.index_base {
            IndexBase::Zero => position.checked_sub(1),
            IndexBase::One => Some(position),
        }
    }

    /// Question position a storage index refers to, if any.
    pub fn position_of(&self, index: u32) -> Option<u32> {
        match self.index_base {
            IndexBase::Zero => index.checked_add(1),
            IndexBase::One => (index > 0).then_some(index),
        }
    }

    pub fn answer_for(&self, position: u32) -> Option<&ResponseValue> {
        self.storage_index(position)
            .and_then(|index| self.answers.get(&index))
    }
}

impl CalculationRule {
    pub fn bounds(&self) -> &ScoreRange {
        match self {
            CalculationRule::SimpleSum { bounds }
            | CalculationRule::WeightedSum { bounds, .. }
            | CalculationRule::SectionedSum { bounds, .. }
            | CalculationRule::AnswerKey { bounds, .. } => bounds,
        }
    }

    pub fn sections(&self) -> &[SectionRange] {
        match self {
            CalculationRule::SectionedSum { sections, .. } => sections,
            _ => &[],
        }
    }

    /// Validate the rule against the form it scores. Run once at load time.
    pub fn validate(&self, form: &TestForm) -> Result<(), InstrumentError> {
        if !self.bounds().is_well_formed() {
            return Err(InstrumentError::invalid("rule bounds are not a valid range"));
        }
        match self {
            CalculationRule::SimpleSum { .. } => {}
            CalculationRule::WeightedSum { weights, .. } => validate_weights(weights, form)?,
            CalculationRule::SectionedSum { sections, .. } => validate_sections(sections, form)?,
            CalculationRule::AnswerKey { key, .. } => validate_key(key, form)?,
        }
        validate_section_labels(self.sections(), form)
    }
}

/// A question labelled with a section must sit inside the range of that
/// name.
fn validate_section_labels(
    sections: &[SectionRange],
    form: &TestForm,
) -> Result<(), InstrumentError> {
    for question in &form.questions {
        let Some(label) = question.section.as_deref() else {
            continue;
        };
        match sections.iter().find(|s| s.name == label) {
            Some(section) if section.covers(question.position) => {}
            Some(section) => {
                return Err(InstrumentError::invalid(format!(
                    "question '{}' at position {} lies outside section '{label}' ({}..={})",
                    question.id, question.position, section.start, section.end
                )));
            }
            None => {
                return Err(InstrumentError::invalid(format!(
                    "question '{}' is labelled with unknown section '{label}'",
                    question.id
                )));
            }
        }
    }
    Ok(())
}

fn validate_weights(
    weights: &BTreeMap<String, f64>,
    form: &TestForm,
) -> Result<(), InstrumentError> {
    for (question_id, weight) in weights {
        if form.question(question_id).is_none() {
            return Err(InstrumentError::invalid(format!(
                "weight declared for unknown question '{question_id}'"
            )));
        }
        if !weight.is_finite() {
            return Err(InstrumentError::invalid(format!(
                "weight for question '{question_id}' is not finite"
            )));
        }
    }
    Ok(())
}

/// Sections must tile positions `1..=n` exactly: no overlap, no hole.
fn validate_sections(sections: &[SectionRange], form: &TestForm) -> Result<(), InstrumentError> {
    if sections.is_empty() {
        return Err(InstrumentError::invalid("sectioned rule declares no sections"));
    }

    let mut names = HashSet::new();
    for section in sections {
        if !names.insert(section.name.as_str()) {
            return Err(InstrumentError::invalid(format!(
                "duplicate section name '{}'",
                section.name
            )));
        }
        if section.start == 0 || section.start > section.end {
            return Err(InstrumentError::invalid(format!(
                "section '{}' has an empty or non-positive range {}..={}",
                section.name, section.start, section.end
            )));
        }
        if let Some(bounds) = &section.bounds
            && !bounds.is_well_formed()
        {
            return Err(InstrumentError::invalid(format!(
                "section '{}' bounds are not a valid range",
                section.name
            )));
        }
    }

    let mut ordered: Vec<&SectionRange> = sections.iter().collect();
    ordered.sort_by_key(|s| (s.start, s.end));

    let mut next = 1u32;
    let mut previous: Option<&SectionRange> = None;
    for section in ordered {
        if section.start < next {
            let first = previous.map(|p| p.name.clone()).unwrap_or_default();
            return Err(InstrumentError::SectionRangeOverlap {
                first,
                second: section.name.clone(),
            });
        }
        if section.start > next {
            return Err(InstrumentError::SectionRangeGap {
                start: next,
                end: section.start - 1,
            });
        }
        next = section.end.saturating_add(1);
        previous = Some(section);
    }

    let count = form.question_count() as u32;
    if next <= count {
        return Err(InstrumentError::SectionRangeGap {
            start: next,
            end: count,
        });
    }
    if next - 1 > count {
        return Err(InstrumentError::invalid(format!(
            "sections extend to position {} but the form has {count} questions",
            next - 1
        )));
    }
    Ok(())
}

fn validate_key(key: &AnswerKey, form: &TestForm) -> Result<(), InstrumentError> {
    let count = form.question_count();
    if key.answers.is_empty() {
        return Err(InstrumentError::invalid("answer key is empty"));
    }
    for (&index, expected) in &key.answers {
        let question = key
            .position_of(index)
            .and_then(|position| form.question_at(position))
            .ok_or(InstrumentError::AnswerKeyIndexOutOfRange {
                index,
                base: key.index_base,
                question_count: count,
            })?;
        form.resolve(question, expected).map_err(|e| {
            InstrumentError::invalid(format!(
                "answer key entry {index} is not a valid answer for question '{}': {e}",
                question.id
            ))
        })?;
    }
    Ok(())
}

use std::collections::HashSet;

use normscore_core::models::question::{ItemType, Question};
use normscore_core::models::response::{ResponseValue, Responses};
use normscore_core::models::scale::ResponseScale;
use serde::{Deserialize, Serialize};

use crate::error::InstrumentError;

/// The questions of one published test version and the scales they use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestForm {
    pub questions: Vec<Question>,
    pub scales: Vec<ResponseScale>,
}

/// An answer after it has been checked against its scale.
///
/// Choices keep the index of the option picked, so two options sharing a
/// value remain distinct answers.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Choice { option: usize, value: f64 },
    Number(f64),
    /// Selected options as `(index, value)`, sorted by index.
    Multi(Vec<(usize, f64)>),
}

impl Answer {
    /// Numeric contribution before any inversion. Multi-select items score
    /// the sum of the selected option values.
    pub fn value(&self) -> f64 {
        match self {
            Answer::Choice { value, .. } => *value,
            Answer::Number(n) => *n,
            Answer::Multi(selected) => selected.iter().map(|(_, v)| v).sum(),
        }
    }
}

impl TestForm {
    pub fn new(questions: Vec<Question>, scales: Vec<ResponseScale>) -> Self {
        Self { questions, scales }
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn question_at(&self, position: u32) -> Option<&Question> {
        self.questions.iter().find(|q| q.position == position)
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn scale(&self, id: &str) -> Option<&ResponseScale> {
        self.scales.iter().find(|s| s.id == id)
    }

    /// Questions in ordinal order.
    pub fn ordered(&self) -> Vec<&Question> {
        let mut ordered: Vec<&Question> = self.questions.iter().collect();
        ordered.sort_by_key(|q| q.position);
        ordered
    }

    /// Check the structural rules a published form must satisfy.
    pub fn validate(&self) -> Result<(), InstrumentError> {
        if self.questions.is_empty() {
            return Err(InstrumentError::invalid("form has no questions"));
        }

        let mut scale_ids = HashSet::new();
        for scale in &self.scales {
            if !scale_ids.insert(scale.id.as_str()) {
                return Err(InstrumentError::invalid(format!(
                    "duplicate scale id '{}'",
                    scale.id
                )));
            }
            if scale.options.is_empty() {
                return Err(InstrumentError::invalid(format!(
                    "scale '{}' has no options",
                    scale.id
                )));
            }
            if let Some(option) = scale.options.iter().find(|o| !o.value.is_finite()) {
                return Err(InstrumentError::invalid(format!(
                    "scale '{}' option '{}' has a non-finite value",
                    scale.id, option.label
                )));
            }
        }

        let count = self.questions.len();
        let mut ids = HashSet::new();
        let mut positions = HashSet::new();
        for question in &self.questions {
            if !ids.insert(question.id.as_str()) {
                return Err(InstrumentError::invalid(format!(
                    "duplicate question id '{}'",
                    question.id
                )));
            }
            if question.position == 0 || question.position as usize > count {
                return Err(InstrumentError::invalid(format!(
                    "question '{}' has position {}, expected 1..={count}",
                    question.id, question.position
                )));
            }
            if !positions.insert(question.position) {
                return Err(InstrumentError::invalid(format!(
                    "position {} is used by more than one question",
                    question.position
                )));
            }

            match question.scale_id.as_deref() {
                Some(scale_id) if self.scale(scale_id).is_none() => {
                    return Err(InstrumentError::invalid(format!(
                        "question '{}' references unknown scale '{scale_id}'",
                        question.id
                    )));
                }
                None if question.item_type.is_choice() => {
                    return Err(InstrumentError::invalid(format!(
                        "choice question '{}' has no scale",
                        question.id
                    )));
                }
                None if question.inverted => {
                    return Err(InstrumentError::invalid(format!(
                        "inverted question '{}' has no scale to reflect against",
                        question.id
                    )));
                }
                _ => {}
            }
            if question.inverted && question.item_type == ItemType::MultiSelect {
                return Err(InstrumentError::invalid(format!(
                    "multi-select question '{}' cannot be inverted",
                    question.id
                )));
            }
        }
        Ok(())
    }

    /// Look up the answer to a question.
    ///
    /// Returns `Ok(None)` only for optional questions left unanswered; a
    /// required question without an answer is a [`InstrumentError::MissingResponse`].
    pub fn answer_for<'r>(
        &self,
        question: &Question,
        responses: &'r Responses,
    ) -> Result<Option<&'r ResponseValue>, InstrumentError> {
        match responses.get(&question.id).filter(|v| !v.is_blank()) {
            Some(value) => Ok(Some(value)),
            None if question.optional => Ok(None),
            None => Err(InstrumentError::MissingResponse(question.id.clone())),
        }
    }

    /// Resolve a raw answer through the question's scale.
    pub fn resolve(
        &self,
        question: &Question,
        value: &ResponseValue,
    ) -> Result<Answer, InstrumentError> {
        let scale = self.scale_of(question)?;
        let invalid = |reason: String| InstrumentError::InvalidResponseValue {
            question_id: question.id.clone(),
            reason,
        };

        match question.item_type {
            ItemType::SingleChoice | ItemType::Likert => {
                let scale = scale.ok_or_else(|| missing_scale(question))?;
                if value.is_list() {
                    return Err(invalid("expected a single answer, got a list".to_string()));
                }
                let option = scale.resolve_option(value).ok_or_else(|| {
                    invalid(format!("{value} is not an option of scale '{}'", scale.id))
                })?;
                Ok(Answer::Choice {
                    option,
                    value: scale.options[option].value,
                })
            }
            ItemType::Numeric => {
                let number = value
                    .as_number()
                    .ok_or_else(|| invalid(format!("{value} is not a number")))?;
                match scale {
                    Some(scale) if !scale.spans(number) => Err(invalid(format!(
                        "{number} is outside the range of scale '{}'",
                        scale.id
                    ))),
                    _ => Ok(Answer::Number(number)),
                }
            }
            ItemType::MultiSelect => {
                let scale = scale.ok_or_else(|| missing_scale(question))?;
                let ResponseValue::List(items) = value else {
                    return Err(invalid(format!("expected a list of options, got {value}")));
                };
                let mut selected = Vec::with_capacity(items.len());
                for item in items {
                    if item.is_list() {
                        return Err(invalid("nested lists are not allowed".to_string()));
                    }
                    let option = scale.resolve_option(item).ok_or_else(|| {
                        invalid(format!("{item} is not an option of scale '{}'", scale.id))
                    })?;
                    selected.push((option, scale.options[option].value));
                }
                selected.sort_by_key(|(option, _)| *option);
                if selected.windows(2).any(|pair| pair[0].0 == pair[1].0) {
                    return Err(invalid("the same option is selected twice".to_string()));
                }
                Ok(Answer::Multi(selected))
            }
        }
    }

    /// The item's contribution to a sum: the resolved value, reflected
    /// against the scale maximum when the question is inverted.
    pub fn item_score(
        &self,
        question: &Question,
        value: &ResponseValue,
    ) -> Result<f64, InstrumentError> {
        let answer = self.resolve(question, value)?;
        if !question.inverted {
            return Ok(answer.value());
        }
        let v = match answer {
            Answer::Choice { value, .. } | Answer::Number(value) => value,
            Answer::Multi(_) => {
                return Err(InstrumentError::invalid(format!(
                    "multi-select question '{}' cannot be inverted",
                    question.id
                )));
            }
        };
        let max = self
            .scale_of(question)?
            .and_then(ResponseScale::max_value)
            .ok_or_else(|| missing_scale(question))?;
        Ok(invert(v, max))
    }

    fn scale_of(&self, question: &Question) -> Result<Option<&ResponseScale>, InstrumentError> {
        match question.scale_id.as_deref() {
            None => Ok(None),
            Some(id) => self.scale(id).map(Some).ok_or_else(|| {
                InstrumentError::invalid(format!(
                    "question '{}' references unknown scale '{id}'",
                    question.id
                ))
            }),
        }
    }
}

/// Reflect a value against the scale maximum.
pub fn invert(value: f64, scale_max: f64) -> f64 {
    scale_max - value
}

fn missing_scale(question: &Question) -> InstrumentError {
    InstrumentError::invalid(format!("question '{}' has no usable scale", question.id))
}

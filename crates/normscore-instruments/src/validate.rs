use std::fmt;

use normscore_core::models::response::Responses;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::error::InstrumentError;
use crate::form::TestForm;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum IssueKind {
    Missing,
    Invalid { reason: String },
}

/// One question that blocks scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResponseIssue {
    pub question_id: String,
    pub position: u32,
    #[serde(flatten)]
    pub issue: IssueKind,
}

/// Every missing or invalid answer found in one pass, in question order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, Error)]
#[ts(export)]
pub struct ResponseIssues {
    pub issues: Vec<ResponseIssue>,
}

impl ResponseIssues {
    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.issues
            .iter()
            .filter(|i| i.issue == IssueKind::Missing)
            .map(|i| i.question_id.as_str())
    }

    pub fn invalid(&self) -> impl Iterator<Item = &str> {
        self.issues
            .iter()
            .filter(|i| matches!(i.issue, IssueKind::Invalid { .. }))
            .map(|i| i.question_id.as_str())
    }
}

impl fmt::Display for ResponseIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let missing: Vec<&str> = self.missing().collect();
        let invalid: Vec<&str> = self.invalid().collect();
        match (missing.is_empty(), invalid.is_empty()) {
            (false, false) => write!(
                f,
                "missing [{}]; invalid [{}]",
                missing.join(", "),
                invalid.join(", ")
            ),
            (false, true) => write!(f, "missing [{}]", missing.join(", ")),
            (true, false) => write!(f, "invalid [{}]", invalid.join(", ")),
            (true, true) => f.write_str("no issues"),
        }
    }
}

/// Check that every required question has a present, type-appropriate
/// answer.
///
/// Partial saves may call this to show progress; final scoring must pass it.
/// Errors that are not about the answer itself (an unusable form) are
/// returned as-is rather than folded into the issue list.
pub fn validate_responses(form: &TestForm, responses: &Responses) -> Result<(), InstrumentError> {
    let mut issues = Vec::new();

    for question in form.ordered() {
        let value = match form.answer_for(question, responses) {
            Ok(Some(value)) => value,
            Ok(None) => continue,
            Err(InstrumentError::MissingResponse(question_id)) => {
                issues.push(ResponseIssue {
                    question_id,
                    position: question.position,
                    issue: IssueKind::Missing,
                });
                continue;
            }
            Err(other) => return Err(other),
        };

        match form.resolve(question, value) {
            Ok(_) => {}
            Err(InstrumentError::InvalidResponseValue {
                question_id,
                reason,
            }) => issues.push(ResponseIssue {
                question_id,
                position: question.position,
                issue: IssueKind::Invalid { reason },
            }),
            Err(other) => return Err(other),
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        tracing::debug!(count = issues.len(), "responses failed validation");
        Err(ResponseIssues { issues }.into())
    }
}

use std::fmt;

use normscore_core::models::demographics::Sex;
use serde::Serialize;
use thiserror::Error;

use crate::rules::IndexBase;
use crate::scoring::ScoreType;
use crate::validate::ResponseIssues;

/// Who has to act on an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Incomplete or malformed data entry; fixed by asking for more input.
    Input,
    /// Bad instrument or table authoring; surfaced to an administrator.
    Configuration,
    /// A computed value contradicts the declared rule; a logic/data mismatch.
    Domain,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Input => "input",
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Domain => "domain",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum InstrumentError {
    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error("missing response for question '{0}'")]
    MissingResponse(String),

    #[error("invalid response for question '{question_id}': {reason}")]
    InvalidResponseValue { question_id: String, reason: String },

    #[error("responses incomplete: {0}")]
    IncompleteResponses(#[from] ResponseIssues),

    #[error("instrument '{0}' is normed but no demographics were supplied")]
    MissingDemographics(String),

    #[error("invalid instrument definition: {0}")]
    InvalidDefinition(String),

    #[error("sections '{first}' and '{second}' overlap")]
    SectionRangeOverlap { first: String, second: String },

    #[error("questions {start}..={end} are not covered by any section")]
    SectionRangeGap { start: u32, end: u32 },

    #[error("answer key index {index} ({base}-based) maps to none of {question_count} questions")]
    AnswerKeyIndexOutOfRange {
        index: u32,
        base: IndexBase,
        question_count: usize,
    },

    #[error("bin '{bin_id}' declares a zero standard deviation")]
    ZeroStandardDeviation { bin_id: String },

    #[error("table '{table_id}': bins {candidates:?} match equally well")]
    AmbiguousBinMatch {
        table_id: String,
        candidates: Vec<String>,
    },

    #[error("table '{table_id}': no bin for age {age}, sex {sex} and no default bin")]
    NoMatchingBin {
        table_id: String,
        age: u32,
        sex: Sex,
        education: Option<String>,
    },

    #[error("{basis} value {value} falls outside every classification band")]
    ClassificationGap { basis: ScoreType, value: f64 },

    #[error("classification by {basis} needs a value the matched bin does not provide")]
    ClassificationUnavailable { basis: ScoreType },

    #[error("{scope} raw score {value} is outside the declared bounds [{min}, {max}]")]
    ScoreOutOfDeclaredBounds {
        scope: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl InstrumentError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownInstrument(_)
            | Self::MissingResponse(_)
            | Self::InvalidResponseValue { .. }
            | Self::IncompleteResponses(_)
            | Self::MissingDemographics(_) => ErrorCategory::Input,
            Self::InvalidDefinition(_)
            | Self::SectionRangeOverlap { .. }
            | Self::SectionRangeGap { .. }
            | Self::AnswerKeyIndexOutOfRange { .. }
            | Self::ZeroStandardDeviation { .. }
            | Self::AmbiguousBinMatch { .. }
            | Self::NoMatchingBin { .. }
            | Self::ClassificationGap { .. }
            | Self::ClassificationUnavailable { .. }
            | Self::Serialization(_) => ErrorCategory::Configuration,
            Self::ScoreOutOfDeclaredBounds { .. } => ErrorCategory::Domain,
        }
    }

    /// Configuration and domain errors must block test finalization.
    pub fn is_blocking(&self) -> bool {
        !matches!(self.category(), ErrorCategory::Input)
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidDefinition(reason.into())
    }
}

use std::fmt;
use std::str::FromStr;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => f.write_str("M"),
            Sex::Female => f.write_str("F"),
        }
    }
}

impl FromStr for Sex {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "m" | "male" => Ok(Sex::Male),
            "f" | "female" => Ok(Sex::Female),
            other => Err(CoreError::InvalidSex(other.to_string())),
        }
    }
}

/// The respondent profile used to select a normative bin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Demographics {
    /// Completed years at the evaluation date.
    pub age: u32,
    pub sex: Sex,
    #[serde(default)]
    pub education: Option<String>,
}

impl Demographics {
    pub fn new(age: u32, sex: Sex) -> Self {
        Self {
            age,
            sex,
            education: None,
        }
    }

    pub fn with_education(mut self, education: impl Into<String>) -> Self {
        self.education = Some(education.into());
        self
    }

    /// Build a profile from a birth date, counting completed years up to
    /// the day the instrument was administered.
    pub fn at_evaluation(
        birth_date: Date,
        evaluated_on: Date,
        sex: Sex,
        education: Option<String>,
    ) -> Result<Self, CoreError> {
        if birth_date > evaluated_on {
            return Err(CoreError::BirthAfterEvaluation {
                birth_date,
                evaluated_on,
            });
        }
        let span = birth_date.until((jiff::Unit::Year, evaluated_on))?;
        let age = u32::try_from(span.get_years()).map_err(|_| CoreError::BirthAfterEvaluation {
            birth_date,
            evaluated_on,
        })?;
        Ok(Self {
            age,
            sex,
            education,
        })
    }
}

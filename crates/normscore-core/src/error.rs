use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid date arithmetic: {0}")]
    Date(#[from] jiff::Error),

    #[error("birth date {birth_date} is after evaluation date {evaluated_on}")]
    BirthAfterEvaluation {
        birth_date: jiff::civil::Date,
        evaluated_on: jiff::civil::Date,
    },

    #[error("invalid sex '{0}', expected M or F")]
    InvalidSex(String),
}

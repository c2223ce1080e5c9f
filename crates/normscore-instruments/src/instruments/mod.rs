//! Built-in public-domain instruments.

pub mod gad7;
pub mod phq9;

use normscore_core::models::question::{ItemType, Question};
use normscore_core::models::scale::{ResponseOption, ResponseScale};

/// The two-week frequency scale shared by the PHQ and GAD screeners.
pub(crate) fn two_week_frequency(id: &str) -> ResponseScale {
    let options = [
        ("Not at all", 0.0),
        ("Several days", 1.0),
        ("More than half the days", 2.0),
        ("Nearly every day", 3.0),
    ];
    ResponseScale {
        id: id.to_string(),
        name: Some("Over the last 2 weeks".to_string()),
        options: options
            .iter()
            .map(|(label, value)| ResponseOption {
                label: label.to_string(),
                value: *value,
            })
            .collect(),
    }
}

/// `count` likert items named `{prefix}_01`, `{prefix}_02`, ...
pub(crate) fn likert_items(prefix: &str, count: u32, scale_id: &str) -> Vec<Question> {
    (1..=count)
        .map(|n| {
            Question::new(format!("{prefix}_{n:02}"), n, ItemType::Likert).with_scale(scale_id)
        })
        .collect()
}

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::response::ResponseValue;

/// Tolerance used when comparing option values.
const VALUE_EPSILON: f64 = 1e-9;

/// One selectable option of a response scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResponseOption {
    pub label: String,
    pub value: f64,
}

/// A named, ordered set of options. The maximum value is what inverted
/// items are reflected against.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResponseScale {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub options: Vec<ResponseOption>,
}

impl ResponseScale {
    /// Build a scale whose labels are the stringified values, e.g. `0..=3`.
    pub fn numeric(id: impl Into<String>, values: impl IntoIterator<Item = i32>) -> Self {
        Self {
            id: id.into(),
            name: None,
            options: values
                .into_iter()
                .map(|v| ResponseOption {
                    label: v.to_string(),
                    value: f64::from(v),
                })
                .collect(),
        }
    }

    pub fn max_value(&self) -> Option<f64> {
        self.options.iter().map(|o| o.value).reduce(f64::max)
    }

    pub fn min_value(&self) -> Option<f64> {
        self.options.iter().map(|o| o.value).reduce(f64::min)
    }

    pub fn has_value(&self, value: f64) -> bool {
        self.options
            .iter()
            .any(|o| (o.value - value).abs() < VALUE_EPSILON)
    }

    pub fn option_by_label(&self, label: &str) -> Option<&ResponseOption> {
        self.option_index_by_label(label).map(|index| &self.options[index])
    }

    fn option_index_by_label(&self, label: &str) -> Option<usize> {
        let wanted = label.trim();
        self.options
            .iter()
            .position(|o| o.label.trim().eq_ignore_ascii_case(wanted))
    }

    /// Resolve a scalar answer to the index of the chosen option.
    ///
    /// Text is matched against labels first, then read as a number. Values
    /// need not be unique; a number picks the first option carrying it.
    /// Lists never resolve here.
    pub fn resolve_option(&self, answer: &ResponseValue) -> Option<usize> {
        if let ResponseValue::Text(text) = answer
            && let Some(index) = self.option_index_by_label(text)
        {
            return Some(index);
        }
        match answer {
            ResponseValue::List(_) => None,
            scalar => {
                let value = scalar.as_number()?;
                self.options
                    .iter()
                    .position(|o| (o.value - value).abs() < VALUE_EPSILON)
            }
        }
    }

    /// Resolve a scalar answer to an option value.
    pub fn resolve_choice(&self, answer: &ResponseValue) -> Option<f64> {
        self.resolve_option(answer).map(|index| self.options[index].value)
    }

    /// Whether a free numeric answer lies within the scale's span.
    pub fn spans(&self, value: f64) -> bool {
        match (self.min_value(), self.max_value()) {
            (Some(min), Some(max)) => value >= min - VALUE_EPSILON && value <= max + VALUE_EPSILON,
            _ => false,
        }
    }
}

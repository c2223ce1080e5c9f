use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The answer shape a question accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ItemType {
    /// One option from the referenced scale.
    SingleChoice,
    /// One point on an ordered agreement/frequency scale.
    Likert,
    /// A free number, bounded by the scale when one is referenced.
    Numeric,
    /// Any non-empty subset of the scale's options.
    MultiSelect,
}

impl ItemType {
    /// Choice-type items must reference a response scale.
    pub fn is_choice(self) -> bool {
        matches!(self, Self::SingleChoice | Self::Likert | Self::MultiSelect)
    }
}

/// One item of a published test version.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Question {
    /// Stable key used in the responses map. Not necessarily the position.
    pub id: String,
    /// 1-based ordinal position within the test.
    pub position: u32,
    pub item_type: ItemType,
    /// Identifier of the response scale this item draws its options from.
    #[serde(default)]
    pub scale_id: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    /// Score is reflected against the scale maximum before summation.
    #[serde(default)]
    pub inverted: bool,
    #[serde(default)]
    pub optional: bool,
}

impl Question {
    pub fn new(id: impl Into<String>, position: u32, item_type: ItemType) -> Self {
        Self {
            id: id.into(),
            position,
            item_type,
            scale_id: None,
            section: None,
            inverted: false,
            optional: false,
        }
    }

    pub fn with_scale(mut self, scale_id: impl Into<String>) -> Self {
        self.scale_id = Some(scale_id.into());
        self
    }

    pub fn in_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn inverted(mut self) -> Self {
        self.inverted = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

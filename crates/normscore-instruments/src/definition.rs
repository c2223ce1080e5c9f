use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::classification::Classification;
use crate::error::InstrumentError;
use crate::form::TestForm;
use crate::norms::{NormativeTable, ReferenceStatistics};
use crate::rules::CalculationRule;
use crate::scoring::ScoreType;

/// Everything needed to score one instrument: its form, the rule that
/// produces the raw score, the reference tables and the cutoff labels.
///
/// Loaded as data; nothing about a specific test is hardcoded in the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentDefinition {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub form: TestForm,
    pub rule: CalculationRule,
    #[serde(default)]
    pub norms: Vec<NormativeTable>,
    /// Labels for the overall score.
    #[serde(default)]
    pub classification: Option<Classification>,
    /// Labels for individual sections of a sectioned rule.
    #[serde(default)]
    pub section_classifications: BTreeMap<String, Classification>,
}

impl InstrumentDefinition {
    /// Parse and validate a definition document.
    pub fn from_json(json: &str) -> Result<Self, InstrumentError> {
        let definition: Self = serde_json::from_str(json)?;
        definition.validate()?;
        Ok(definition)
    }

    /// Load-time checks: everything that can be caught without a respondent,
    /// including classifications whose basis the norms can never produce.
    pub fn validate(&self) -> Result<(), InstrumentError> {
        self.form.validate()?;
        self.rule.validate(&self.form)?;

        let section_names: HashSet<&str> =
            self.rule.sections().iter().map(|s| s.name.as_str()).collect();

        let mut scopes = HashSet::new();
        for table in &self.norms {
            table.validate()?;
            if let Some(section) = table.section.as_deref()
                && !section_names.contains(section)
            {
                return Err(InstrumentError::invalid(format!(
                    "table '{}' norms unknown section '{section}'",
                    table.id
                )));
            }
            if !scopes.insert(table.section.as_deref()) {
                return Err(InstrumentError::invalid(format!(
                    "more than one table norms {}",
                    table.section.as_deref().unwrap_or("the overall score")
                )));
            }
        }

        if let Some(classification) = &self.classification {
            classification.validate(self.rule.bounds())?;
            check_basis(classification, self.overall_table(), "the overall score")?;
        }
        for (name, classification) in &self.section_classifications {
            let section = self
                .rule
                .sections()
                .iter()
                .find(|s| &s.name == name)
                .ok_or_else(|| {
                    InstrumentError::invalid(format!(
                        "classification declared for unknown section '{name}'"
                    ))
                })?;
            let bounds = section.bounds.as_ref().unwrap_or(self.rule.bounds());
            classification.validate(bounds)?;
            check_basis(classification, self.section_table(name), &format!("section '{name}'"))?;
        }
        Ok(())
    }

    pub fn is_normed(&self) -> bool {
        !self.norms.is_empty()
    }

    pub fn overall_table(&self) -> Option<&NormativeTable> {
        self.norms.iter().find(|t| t.section.is_none())
    }

    pub fn section_table(&self, section: &str) -> Option<&NormativeTable> {
        self.norms
            .iter()
            .find(|t| t.section.as_deref() == Some(section))
    }
}

/// The basis a classification reads must be produced for its scope: any
/// non-raw basis needs a table, and z/T need mean/SD statistics in every bin.
fn check_basis(
    classification: &Classification,
    table: Option<&NormativeTable>,
    scope: &str,
) -> Result<(), InstrumentError> {
    let needs_mean_sd = match classification.basis {
        ScoreType::Raw => return Ok(()),
        ScoreType::Percentile => false,
        ScoreType::ZScore | ScoreType::TScore => true,
    };
    let Some(table) = table else {
        return Err(InstrumentError::invalid(format!(
            "{scope} is classified by {} but has no normative table",
            classification.basis
        )));
    };
    if needs_mean_sd
        && let Some(bin) = table
            .bins
            .iter()
            .find(|b| matches!(b.reference, ReferenceStatistics::PercentileTable { .. }))
    {
        return Err(InstrumentError::invalid(format!(
            "{scope} is classified by {} but bin '{}' of table '{}' only has percentiles",
            classification.basis, bin.id, table.id
        )));
    }
    Ok(())
}

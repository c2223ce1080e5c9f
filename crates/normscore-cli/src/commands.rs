use std::path::{Path, PathBuf};

use jiff::civil::Date;
use normscore_core::models::demographics::{Demographics, Sex};
use normscore_core::models::response::{Responses, parse_responses};
use normscore_instruments::Instrument;
use normscore_instruments::error::{ErrorCategory, InstrumentError};
use normscore_instruments::scoring::ScoringOutcome;
use serde::Serialize;

use crate::catalog::{Catalog, LoadFailure, Source, load_definition};
use crate::config::OutputStyle;

#[derive(Debug, Serialize)]
pub struct InstrumentSummary {
    pub id: String,
    pub name: String,
    pub questions: usize,
    pub normed: bool,
    pub source: Source,
}

pub fn list(catalog: &Catalog) -> Vec<InstrumentSummary> {
    catalog
        .entries()
        .iter()
        .map(|entry| {
            let definition = entry.instrument.definition();
            InstrumentSummary {
                id: definition.id.clone(),
                name: definition.name.clone(),
                questions: definition.form.question_count(),
                normed: definition.is_normed(),
                source: entry.source.clone(),
            }
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub file: PathBuf,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Load and validate a definition file. Definition problems are reported,
/// not returned as errors; only an unreadable file fails the command.
pub fn check(path: &Path) -> eyre::Result<CheckReport> {
    let mut report = CheckReport {
        file: path.to_path_buf(),
        valid: false,
        instrument_id: None,
        category: None,
        error: None,
    };
    match load_definition(path) {
        Ok(definition) => {
            report.valid = true;
            report.instrument_id = Some(definition.id);
        }
        Err(LoadFailure::Definition(e)) => {
            report.category = Some(e.category());
            report.error = Some(e.to_string());
        }
        Err(LoadFailure::Io(e)) => {
            return Err(eyre::eyre!("failed to read {}: {e}", path.display()));
        }
    }
    Ok(report)
}

/// Respondent details as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct DemographicsInput {
    pub age: Option<u32>,
    pub birth_date: Option<Date>,
    pub evaluated_on: Option<Date>,
    pub sex: Option<Sex>,
    pub education: Option<String>,
}

impl DemographicsInput {
    /// `None` when no age information was given at all. An explicit age
    /// wins over a birth date; the evaluation date defaults to `today`.
    pub fn resolve(&self, today: Date) -> eyre::Result<Option<Demographics>> {
        let age_given = self.age.is_some() || self.birth_date.is_some();
        let sex = match (self.sex, age_given) {
            (Some(sex), true) => sex,
            (None, false) => {
                if self.education.is_some() || self.evaluated_on.is_some() {
                    return Err(eyre::eyre!(
                        "--education and --evaluated-on need --age or --birth-date"
                    ));
                }
                return Ok(None);
            }
            (Some(_), false) => return Err(eyre::eyre!("--sex needs --age or --birth-date")),
            (None, true) => return Err(eyre::eyre!("--sex is required with age information")),
        };

        let demographics = match (self.age, self.birth_date) {
            (Some(age), _) => Demographics {
                age,
                sex,
                education: self.education.clone(),
            },
            (None, Some(birth_date)) => Demographics::at_evaluation(
                birth_date,
                self.evaluated_on.unwrap_or(today),
                sex,
                self.education.clone(),
            )?,
            (None, None) => return Ok(None),
        };
        Ok(Some(demographics))
    }
}

/// Find the instrument by catalog id, or load it from a definition file.
fn resolve_instrument<'a>(
    catalog: &'a Catalog,
    reference: &str,
) -> eyre::Result<InstrumentRef<'a>> {
    if let Some(instrument) = catalog.get(reference) {
        return Ok(InstrumentRef::Registered(instrument));
    }
    let path = Path::new(reference);
    if path.is_file() {
        return load_definition(path)
            .map(|d| InstrumentRef::Loaded(Box::new(d)))
            .map_err(|e| eyre::eyre!("failed to load {}: {e}", path.display()));
    }
    Err(InstrumentError::UnknownInstrument(reference.to_string()).into())
}

enum InstrumentRef<'a> {
    Registered(&'a dyn Instrument),
    Loaded(Box<dyn Instrument>),
}

impl InstrumentRef<'_> {
    fn get(&self) -> &dyn Instrument {
        match self {
            InstrumentRef::Registered(instrument) => *instrument,
            InstrumentRef::Loaded(instrument) => instrument.as_ref(),
        }
    }
}

pub fn read_responses(path: &Path) -> eyre::Result<Responses> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read responses at {}: {e}", path.display()))?;
    Ok(parse_responses(&json)?)
}

/// Run the full pipeline for one administration.
pub fn score(
    catalog: &Catalog,
    instrument: &str,
    responses_path: &Path,
    demographics: Option<&Demographics>,
) -> eyre::Result<ScoringOutcome> {
    let instrument = resolve_instrument(catalog, instrument)?;
    let responses = read_responses(responses_path)?;
    instrument
        .get()
        .score(&responses, demographics)
        .map_err(|e| {
            let category = e.category();
            eyre::Report::new(e).wrap_err(format!("scoring failed ({category} error)"))
        })
}

/// Serialize a command result in the configured style.
pub fn render<T: Serialize>(value: &T, style: OutputStyle) -> eyre::Result<String> {
    let rendered = match style {
        OutputStyle::Pretty => serde_json::to_string_pretty(value)?,
        OutputStyle::Compact => serde_json::to_string(value)?,
    };
    Ok(rendered)
}

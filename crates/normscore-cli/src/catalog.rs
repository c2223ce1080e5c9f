//! The instruments a harness run can score: the built-ins plus any
//! definition files found in the configured directory.

use std::path::{Path, PathBuf};

use normscore_instruments::definition::InstrumentDefinition;
use normscore_instruments::error::InstrumentError;
use normscore_instruments::{Instrument, all_instruments};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum Source {
    Builtin,
    File(PathBuf),
}

pub struct CatalogEntry {
    pub instrument: Box<dyn Instrument>,
    pub source: Source,
}

pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

/// Why a definition file could not be used.
#[derive(Debug, Error)]
pub enum LoadFailure {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0} ({category} error)", category = .0.category())]
    Definition(#[from] InstrumentError),
}

/// Read and validate one definition file.
pub fn load_definition(path: &Path) -> Result<InstrumentDefinition, LoadFailure> {
    let json = std::fs::read_to_string(path)?;
    Ok(InstrumentDefinition::from_json(&json)?)
}

impl Catalog {
    /// Built-ins only.
    pub fn builtin() -> Self {
        Self {
            entries: all_instruments()
                .into_iter()
                .map(|instrument| CatalogEntry {
                    instrument,
                    source: Source::Builtin,
                })
                .collect(),
        }
    }

    /// Built-ins plus every valid `*.json` definition in `dir`.
    ///
    /// Unreadable or invalid files, and files whose id is already taken,
    /// are skipped with a warning so one bad file does not hide the rest.
    pub fn load(dir: Option<&Path>) -> eyre::Result<Self> {
        let mut catalog = Self::builtin();
        let Some(dir) = dir else {
            return Ok(catalog);
        };
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "instruments directory does not exist");
            return Ok(catalog);
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| eyre::eyre!("failed to read {}: {e}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        for path in files {
            match load_definition(&path) {
                Ok(definition) => {
                    if catalog.get(&definition.id).is_some() {
                        warn!(
                            file = %path.display(),
                            instrument = %definition.id,
                            "instrument id already registered, skipping file"
                        );
                        continue;
                    }
                    debug!(
                        file = %path.display(),
                        instrument = %definition.id,
                        "definition loaded"
                    );
                    catalog.entries.push(CatalogEntry {
                        instrument: Box::new(definition),
                        source: Source::File(path),
                    });
                }
                Err(e) => warn!(file = %path.display(), error = %e, "skipping definition file"),
            }
        }
        Ok(catalog)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&dyn Instrument> {
        self.entries
            .iter()
            .find(|e| e.instrument.id() == id)
            .map(|e| e.instrument.as_ref())
    }
}

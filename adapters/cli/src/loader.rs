//! Reads maps, wave catalogs and configuration from disk.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::de::DeserializeOwned;
use team_defence_core::{MapDefinition, SimulationConfig, WaveCatalog};
use thiserror::Error;

/// Failures raised while loading simulation content.
#[derive(Debug, Error)]
pub(crate) enum LoadError {
    /// The file could not be read.
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid JSON for the expected shape.
    #[error("failed to parse {} as JSON", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The file is not valid TOML for the expected shape.
    #[error("failed to parse {} as TOML", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// The catalog contains no rounds.
    #[error("wave catalog {} contains no rounds", path.display())]
    EmptyCatalog { path: PathBuf },
    /// A spawn entry carries a negative delay.
    #[error("round {round} entry {entry} of {} has a negative delay", path.display())]
    NegativeDelay {
        path: PathBuf,
        round: usize,
        entry: usize,
    },
}

/// Loads a map definition from a JSON file.
pub(crate) fn load_map(path: &Path) -> Result<MapDefinition, LoadError> {
    parse_json(path, &read(path)?)
}

/// Loads a wave catalog from a JSON file and checks its entries.
pub(crate) fn load_catalog(path: &Path) -> Result<WaveCatalog, LoadError> {
    let catalog: WaveCatalog = parse_json(path, &read(path)?)?;
    check_catalog(path, catalog)
}

/// Loads simulation settings from a TOML file; missing keys keep their defaults.
pub(crate) fn load_config(path: &Path) -> Result<SimulationConfig, LoadError> {
    let text = read(path)?;
    toml::from_str(&text).map_err(|source| LoadError::Toml {
        path: path.to_owned(),
        source,
    })
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })
}

fn parse_json<T: DeserializeOwned>(path: &Path, text: &str) -> Result<T, LoadError> {
    serde_json::from_str(text).map_err(|source| LoadError::Json {
        path: path.to_owned(),
        source,
    })
}

fn check_catalog(path: &Path, catalog: WaveCatalog) -> Result<WaveCatalog, LoadError> {
    if catalog.is_empty() {
        return Err(LoadError::EmptyCatalog {
            path: path.to_owned(),
        });
    }
    for (round, plan) in catalog.rounds.iter().enumerate() {
        if let Some(entry) = plan.entries().iter().position(|entry| entry.delay < 0.0) {
            return Err(LoadError::NegativeDelay {
                path: path.to_owned(),
                round: round + 1,
                entry,
            });
        }
    }
    Ok(catalog)
}

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::data::loader::LoadOptions;

/// Default dataset file, looked up in the working directory.
pub const DEFAULT_DATASET: &str = "dataset.csv";

/// Dashboard configuration loaded from an optional TOML file.
/// All fields have sensible defaults.
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    /// Dataset to load when none is given on the command line.
    pub dataset: Option<PathBuf>,
    /// Field separator for `.csv` / `.txt` datasets (default `,`).
    pub delimiter: Option<char>,
    /// Initial genre selection. Empty = every genre.
    pub genres: Vec<String>,
    /// Initial lower year bound (default: dataset minimum).
    pub year_from: Option<i64>,
    /// Initial upper year bound (default: dataset maximum).
    pub year_to: Option<i64>,
}

impl DashboardConfig {
    /// Load config from `path`.
    /// Logs a warning and returns defaults if the file can't be read or parsed.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<DashboardConfig>(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse {}: {}. Using defaults.",
                        path.display(),
                        e
                    );
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!(
                    "Failed to read {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Resolve the dataset path: explicit argument > config > default.
    pub fn resolve_dataset(&self, cli: Option<PathBuf>) -> PathBuf {
        cli.or_else(|| self.dataset.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET))
    }

    /// Loader options. Non-ASCII delimiters fall back to `,`.
    pub fn load_options(&self) -> LoadOptions {
        match self.delimiter {
            Some(c) if c.is_ascii() => LoadOptions {
                delimiter: c as u8,
            },
            Some(c) => {
                log::warn!("Delimiter '{c}' is not ASCII, using ','");
                LoadOptions::default()
            }
            None => LoadOptions::default(),
        }
    }
}

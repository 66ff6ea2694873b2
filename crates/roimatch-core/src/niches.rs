use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A named keyword set used to classify creator bios and brand descriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicheConfig {
    pub name: String,
    /// Category recorded on campaigns qualified by this niche.
    pub product_category: String,
    pub keywords: Vec<String>,
}

impl NicheConfig {
    /// Case-insensitive substring match of any keyword against `text`.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        self.keywords
            .iter()
            .any(|k| haystack.contains(&k.to_lowercase()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NichesFile {
    pub niches: Vec<NicheConfig>,
}

impl NichesFile {
    /// First niche, in file order, whose keywords match `text`.
    #[must_use]
    pub fn classify(&self, text: &str) -> Option<&NicheConfig> {
        self.niches.iter().find(|n| n.matches(text))
    }
}

/// Load and validate the niche keyword sets from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_niches(path: &Path) -> Result<NichesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::NichesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let niches_file: NichesFile =
        serde_yaml::from_str(&content).map_err(ConfigError::NichesFileParse)?;

    validate_niches(&niches_file)?;

    Ok(niches_file)
}

fn validate_niches(niches_file: &NichesFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for niche in &niches_file.niches {
        if niche.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "niche name must be non-empty".to_string(),
            ));
        }

        if niche.keywords.is_empty() {
            return Err(ConfigError::Validation(format!(
                "niche '{}' has no keywords",
                niche.name
            )));
        }

        if niche.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "niche '{}' has a blank keyword",
                niche.name
            )));
        }

        if !seen_names.insert(niche.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate niche name: '{}'",
                niche.name
            )));
        }
    }

    Ok(())
}

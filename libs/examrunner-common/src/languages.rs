// Language catalog: which interpreter/compiler version to request per language
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Version sent when a language has no pinned version.
/// The execution service resolves it to its newest installed runtime.
pub const ANY_VERSION: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LanguagesJson {
    languages: Vec<LanguageEntry>,
}

/// Language catalog loaded from languages.json
///
/// The catalog never restricts what may be submitted: a language missing
/// from it is forwarded as-is with the wildcard version.
#[derive(Debug, Clone, Default)]
pub struct LanguageCatalog {
    entries: Vec<LanguageEntry>,
}

impl LanguageCatalog {
    pub fn new(entries: Vec<LanguageEntry>) -> Self {
        Self { entries }
    }

    /// Load language entries from a languages.json file
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            bail!("Language config file not found: {}", config_path.display());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        Self::from_json(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))
    }

    /// Load, or start empty when the file does not exist yet
    pub fn load_or_empty(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            Self::load(config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let languages_json: LanguagesJson = serde_json::from_str(content)?;

        for entry in &languages_json.languages {
            if entry.name.trim().is_empty() {
                bail!("Language entry with empty name");
            }
        }

        Ok(Self::new(languages_json.languages))
    }

    pub fn save(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let languages_json = LanguagesJson {
            languages: self.entries.clone(),
        };
        let json_content = serde_json::to_string_pretty(&languages_json)
            .context("Failed to serialize language catalog")?;

        fs::write(config_path, json_content)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;

        Ok(())
    }

    /// Version to request for a language, case-insensitive on the name
    pub fn version_for(&self, language: &str) -> &str {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(language))
            .map(|entry| entry.version.as_str())
            .unwrap_or(ANY_VERSION)
    }

    /// Pin a language to a version, adding the language if needed
    pub fn pin(&mut self, language: &str, version: &str) {
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.name.eq_ignore_ascii_case(language))
        {
            Some(entry) => entry.version = version.to_string(),
            None => self.entries.push(LanguageEntry {
                name: language.to_lowercase(),
                version: version.to_string(),
            }),
        }
    }

    /// Drop the pin for a language. Returns false when it was not listed.
    pub fn unpin(&mut self, language: &str) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|entry| !entry.name.eq_ignore_ascii_case(language));
        self.entries.len() != before
    }

    pub fn entries(&self) -> &[LanguageEntry] {
        &self.entries
    }

    pub fn list_languages(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.name.clone()).collect()
    }
}

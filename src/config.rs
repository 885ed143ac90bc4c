// File: src/config.rs
use crate::error::{Result, RxError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// How a corrected name is spelled when handed downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceStyle {
    /// The dictionary's canonical name exactly as loaded (trimmed).
    #[default]
    Verbatim,
    /// Whitespace removed and `500mg` spelled `500밀리그램`, the form the
    /// government drug lookup indexes item names under.
    LookupFormat,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub dictionary_path: PathBuf,
    pub name_column: String,
    pub max_edit_distance: usize,
    pub prefix_length: usize,
    pub concurrency: usize,
    pub prefix_fallback_len: usize,
    pub surface_style: SurfaceStyle,
    pub snapshot_path: Option<PathBuf>,
    /// JSON interaction rules; none are checked when unset.
    pub rules_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dictionary_path: PathBuf::from("drug_db.csv"),
            name_column: "drug_name".to_string(),
            max_edit_distance: 2,
            prefix_length: 7,
            concurrency: 4,
            prefix_fallback_len: 4,
            surface_style: SurfaceStyle::Verbatim,
            snapshot_path: None,
            rules_path: None,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Reads `path` when given, otherwise starts from the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_toml_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_edit_distance > 3 {
            return Err(RxError::Config(format!(
                "max_edit_distance must be at most 3, got {}",
                self.max_edit_distance
            )));
        }
        if self.prefix_length <= self.max_edit_distance {
            return Err(RxError::Config(format!(
                "prefix_length ({}) must exceed max_edit_distance ({})",
                self.prefix_length, self.max_edit_distance
            )));
        }
        if self.concurrency == 0 {
            return Err(RxError::Config("concurrency must be at least 1".into()));
        }
        if self.prefix_fallback_len == 0 {
            return Err(RxError::Config("prefix_fallback_len must be at least 1".into()));
        }
        if self.name_column.trim().is_empty() {
            return Err(RxError::Config("name_column must not be blank".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config.max_edit_distance, 2);
        assert_eq!(config.prefix_length, 7);
        assert_eq!(config.name_column, "drug_name");
        assert_eq!(config.surface_style, SurfaceStyle::Verbatim);
        assert!(config.snapshot_path.is_none());
    }

    #[test]
    fn parses_overrides() {
        let config = EngineConfig::from_toml_str(
            r#"
            dictionary_path = "data/drugs.csv"
            concurrency = 8
            surface_style = "lookup_format"
            snapshot_path = "cache/drugs.bin"
            rules_path = "data/drug_rules.json"
            "#,
        )
        .unwrap();
        assert_eq!(config.dictionary_path, PathBuf::from("data/drugs.csv"));
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.surface_style, SurfaceStyle::LookupFormat);
        assert_eq!(config.snapshot_path, Some(PathBuf::from("cache/drugs.bin")));
        assert_eq!(config.rules_path, Some(PathBuf::from("data/drug_rules.json")));
    }

    #[test]
    fn rejects_prefix_not_longer_than_distance() {
        let err = EngineConfig::from_toml_str("prefix_length = 2").unwrap_err();
        assert!(matches!(err, RxError::Config(_)));
    }

    #[test]
    fn rejects_zero_concurrency() {
        let err = EngineConfig::from_toml_str("concurrency = 0").unwrap_err();
        assert!(matches!(err, RxError::Config(_)));
    }

    #[test]
    fn loads_file_or_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rx.toml");
        fs::write(&path, "max_edit_distance = 1\nprefix_length = 5\n").unwrap();
        let config = EngineConfig::load(Some(&path)).unwrap();
        assert_eq!(config.max_edit_distance, 1);
        assert_eq!(config.prefix_length, 5);

        assert_eq!(EngineConfig::load(None).unwrap().concurrency, 4);
        assert!(matches!(
            EngineConfig::load(Some(&dir.path().join("missing.toml"))),
            Err(RxError::Io(_))
        ));
    }

    #[test]
    fn reports_malformed_toml() {
        let err = EngineConfig::from_toml_str("max_edit_distance = \"two\"").unwrap_err();
        assert!(matches!(err, RxError::TomlParse(_)));
    }
}

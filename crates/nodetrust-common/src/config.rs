//! Sectioned `config.toml` loading.
//!
//! Each crate owns one top-level table (`[policy]`, `[trust_sync]`) and
//! deserializes only that table. A missing file or missing section yields
//! the section's `Default`.

use std::path::Path;

use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config.toml: {0}")]
    Parse(String),
    #[error("invalid [{section}] section: {message}")]
    Section { section: String, message: String },
}

impl From<&ConfigError> for crate::error::ErrorCode {
    fn from(e: &ConfigError) -> Self {
        match e {
            ConfigError::Io { .. } => Self::IoError,
            ConfigError::Parse(_) | ConfigError::Section { .. } => Self::ConfigError,
        }
    }
}

/// Load the `[section]` table from the TOML file at `path`.
pub fn load_section<T>(path: &Path, section: &str) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        return Ok(T::default());
    }
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_section(&raw, section)
}

/// Load the `[section]` table from the shared `config.toml` in the data
/// directory.
pub fn load_default_section<T>(section: &str) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    load_section(&crate::paths::config_path(), section)
}

/// Parse the `[section]` table out of raw TOML text.
pub fn parse_section<T>(raw: &str, section: &str) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    let value: toml::Value = raw
        .parse()
        .map_err(|e: toml::de::Error| ConfigError::Parse(e.to_string()))?;
    let Some(table) = value.get(section).cloned() else {
        return Ok(T::default());
    };
    table.try_into().map_err(|e: toml::de::Error| ConfigError::Section {
        section: section.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Sample {
        #[serde(default)]
        name: String,
        #[serde(default)]
        count: u32,
    }

    #[test]
    fn missing_section_yields_default() {
        let parsed: Sample = parse_section("[other]\nname = \"x\"\n", "sample").unwrap();
        assert_eq!(parsed, Sample::default());
    }

    #[test]
    fn reads_named_section_only() {
        let raw = "[sample]\nname = \"alpha\"\ncount = 3\n\n[other]\nname = \"beta\"\n";
        let parsed: Sample = parse_section(raw, "sample").unwrap();
        assert_eq!(parsed.name, "alpha");
        assert_eq!(parsed.count, 3);
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let err = parse_section::<Sample>("[sample\nname=", "sample").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn wrong_type_is_section_error() {
        let err = parse_section::<Sample>("[sample]\ncount = \"many\"\n", "sample").unwrap_err();
        match err {
            ConfigError::Section { section, .. } => assert_eq!(section, "sample"),
            other => panic!("expected Section error, got: {other}"),
        }
    }

    #[test]
    fn missing_file_yields_default() {
        let path = crate::test::scratch_dir("config-missing").join("absent.toml");
        let parsed: Sample = load_section(&path, "sample").unwrap();
        assert_eq!(parsed, Sample::default());
    }
}

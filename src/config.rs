use crate::document::ProcessingOptions;
use crate::parser::ParseOptions;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_MAX_FILE_SIZE_MB: &str = "DOCINGEST_MAX_FILE_SIZE_MB";
pub const ENV_SUPPORTED_EXTENSIONS: &str = "DOCINGEST_SUPPORTED_EXTENSIONS";
pub const ENV_LOG_LEVEL: &str = "DOCINGEST_LOG_LEVEL";

const DEFAULT_EXTENSIONS: &[&str] = &[".pdf", ".docx", ".txt", ".png", ".jpg", ".jpeg", ".tiff"];
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Ingestion settings shared by the registry, pipeline and CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub max_file_size_mb: u64,
    /// Extensions admitted by the pipeline, lower-case with a leading dot.
    #[serde(deserialize_with = "deserialize_extensions")]
    pub supported_extensions: Vec<String>,
    pub log_level: String,
    pub processing: ProcessingOptions,
    pub parse: ParseOptions,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 50,
            supported_extensions: DEFAULT_EXTENSIONS.iter().map(|ext| (*ext).to_owned()).collect(),
            log_level: "warn".to_owned(),
            processing: ProcessingOptions::default(),
            parse: ParseOptions::default(),
        }
    }
}

impl IngestConfig {
    /// Read a YAML config file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults or `path`, then process environment overrides.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `DOCINGEST_*` overrides obtained through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_MAX_FILE_SIZE_MB) {
            self.max_file_size_mb = raw.trim().parse().map_err(|error| ConfigError::InvalidValue {
                key: ENV_MAX_FILE_SIZE_MB.to_owned(),
                reason: format!("'{raw}' is not a whole number of megabytes: {error}"),
            })?;
        }
        if let Some(raw) = lookup(ENV_SUPPORTED_EXTENSIONS) {
            self.supported_extensions = split_extensions(&raw);
        }
        if let Some(raw) = lookup(ENV_LOG_LEVEL) {
            self.log_level = raw.trim().to_ascii_lowercase();
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_file_size_mb == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_file_size_mb".to_owned(),
                reason: "must be greater than zero".to_owned(),
            });
        }
        if self.supported_extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "supported_extensions".to_owned(),
                reason: "at least one extension is required".to_owned(),
            });
        }
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "log_level".to_owned(),
                reason: format!("'{}' is not one of {}", self.log_level, LOG_LEVELS.join(", ")),
            });
        }
        Ok(())
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    /// Whether the pipeline admits `path` by extension.
    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .is_some_and(|ext| self.supported_extensions.contains(&ext))
    }

    /// Parse options carrying this config's top-level processing snapshot.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            processing: self.processing.clone(),
            ..self.parse.clone()
        }
    }
}

fn split_extensions(raw: &str) -> Vec<String> {
    raw.split(',').filter_map(normalize_extension).collect()
}

fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('.');
    (!trimmed.is_empty()).then(|| format!(".{}", trimmed.to_ascii_lowercase()))
}

fn deserialize_extensions<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Extensions {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match Extensions::deserialize(deserializer)? {
        Extensions::List(items) => items.iter().filter_map(|item| normalize_extension(item)).collect(),
        Extensions::Joined(raw) => split_extensions(&raw),
    })
}

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::chunker::{NoteChunker, DEFAULT_MAX_CHUNK_CHARS};
use crate::pipeline::extraction::prompt::DEFAULT_SYSTEM_PROMPT;
use crate::pipeline::extraction::{ExtractorSettings, InferenceError, OllamaClient};

/// Application-level constants
pub const APP_NAME: &str = "chartex";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "chartex=info"
}

/// Per-user config directory, e.g. `~/.config/chartex/`.
/// `None` when the platform has no config dir.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Default location of the pipeline config file.
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.json"))
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// ═══════════════════════════════════════════
// Pipeline config
// ═══════════════════════════════════════════

/// Extraction run settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub model_name: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub chunk_max_chars: usize,
    pub system_prompt: String,
    pub include_patient_meta: bool,
    pub evaluation: EvaluationConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model_name: "gemma3:27b".to_string(),
            base_url: "http://localhost:11434".to_string(),
            timeout_secs: 300,
            chunk_max_chars: DEFAULT_MAX_CHUNK_CHARS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            include_patient_meta: true,
            evaluation: EvaluationConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), model = %config.model_name, "Loaded config");
        Ok(config)
    }

    pub fn extractor_settings(&self) -> ExtractorSettings {
        ExtractorSettings {
            model_name: self.model_name.clone(),
            system_prompt: self.system_prompt.clone(),
            include_patient_meta: self.include_patient_meta,
        }
    }

    pub fn chunker(&self) -> NoteChunker {
        NoteChunker::new(self.chunk_max_chars)
    }

    pub fn ollama_client(&self) -> Result<OllamaClient, InferenceError> {
        OllamaClient::new(&self.base_url, self.timeout_secs)
    }
}

// ═══════════════════════════════════════════
// Evaluation config
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Max distance in days for two dates to count as the same.
    pub date_tolerance_days: i64,
    pub numeric_tolerance: f64,
    /// Minimum per-record Jaccard for a structured-record match.
    pub jaccard_threshold: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            date_tolerance_days: 30,
            numeric_tolerance: 2.0,
            jaccard_threshold: 0.75,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.chunk_max_chars, 18_000);
        assert_eq!(config.evaluation.date_tolerance_days, 30);
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"model_name": "llama3:8b", "evaluation": {{"date_tolerance_days": 10}}}}"#
        )
        .unwrap();

        let config = PipelineConfig::load(file.path()).unwrap();
        assert_eq!(config.model_name, "llama3:8b");
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.evaluation.date_tolerance_days, 10);
        assert_eq!(config.evaluation.jaccard_threshold, 0.75);
    }

    #[test]
    fn malformed_file_is_json_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(PipelineConfig::load(file.path()), Err(ConfigError::Json { .. })));
    }

    #[test]
    fn extractor_settings_follow_config() {
        let config = PipelineConfig {
            include_patient_meta: false,
            ..Default::default()
        };
        let settings = config.extractor_settings();
        assert!(!settings.include_patient_meta);
        assert_eq!(settings.model_name, "gemma3:27b");
        assert_eq!(config.chunker().max_chunk_chars(), 18_000);
    }

    #[test]
    fn config_path_under_app_dir() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("chartex/config.json"));
        }
    }

    #[test]
    fn default_filter_targets_crate() {
        assert_eq!(default_log_filter(), "chartex=info");
        assert_eq!(APP_NAME, "chartex");
    }
}

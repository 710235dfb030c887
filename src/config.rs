use crate::defaults;
use crate::error::EchologError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub transcription: TranscriptionConfig,
    pub summarization: SummarizationConfig,
    pub store: StoreConfig,
}

/// Audio capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub device: Option<String>,
    pub sample_rate: u32,
    pub frame_samples: usize,
    pub chunk_seconds: u32,
}

/// Transcription service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub endpoint: String,
    pub model: String,
    pub language: String,
    pub api_key: Option<String>,
    pub attempts: u32,
    pub retry_pause_ms: u64,
}

/// Summarization service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SummarizationConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub min_free_memory: u64,
}

/// Transcript store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub max_records: usize,
    pub cache_size: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: defaults::SAMPLE_RATE,
            frame_samples: defaults::FRAME_SAMPLES,
            chunk_seconds: defaults::CHUNK_SECONDS,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::STT_ENDPOINT.to_string(),
            model: defaults::STT_MODEL.to_string(),
            language: defaults::STT_LANGUAGE.to_string(),
            api_key: None,
            attempts: defaults::TRANSCRIBE_ATTEMPTS,
            retry_pause_ms: defaults::RETRY_PAUSE_MS,
        }
    }
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::LLM_ENDPOINT.to_string(),
            model: defaults::LLM_MODEL.to_string(),
            api_key: None,
            max_tokens: defaults::LLM_MAX_TOKENS,
            min_free_memory: defaults::MIN_FREE_MEMORY,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("transcripts.json"),
            max_records: defaults::STORE_MAX_RECORDS,
            cache_size: defaults::STORE_CACHE_SIZE,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::Error::new(EchologError::ConfigFileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                anyhow::Error::new(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if matches!(
                    e.downcast_ref::<EchologError>(),
                    Some(EchologError::ConfigFileNotFound { .. })
                ) {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Rejects values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), EchologError> {
        if self.audio.sample_rate == 0 {
            return Err(EchologError::ConfigInvalidValue {
                key: "audio.sample_rate".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.audio.chunk_seconds == 0 {
            return Err(EchologError::ConfigInvalidValue {
                key: "audio.chunk_seconds".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.transcription.attempts == 0 {
            return Err(EchologError::ConfigInvalidValue {
                key: "transcription.attempts".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.store.max_records == 0 || self.store.cache_size == 0 {
            return Err(EchologError::ConfigInvalidValue {
                key: "store".to_string(),
                message: "max_records and cache_size must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - ECHOLOG_API_KEY → transcription.api_key AND summarization.api_key
    /// - ECHOLOG_STT_MODEL → transcription.model
    /// - ECHOLOG_LLM_MODEL → summarization.model
    /// - ECHOLOG_STORE_PATH → store.path
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var("ECHOLOG_API_KEY")
            && !key.is_empty()
        {
            self.transcription.api_key = Some(key.clone());
            self.summarization.api_key = Some(key);
        }

        if let Ok(model) = std::env::var("ECHOLOG_STT_MODEL")
            && !model.is_empty()
        {
            self.transcription.model = model;
        }

        if let Ok(model) = std::env::var("ECHOLOG_LLM_MODEL")
            && !model.is_empty()
        {
            self.summarization.model = model;
        }

        if let Ok(path) = std::env::var("ECHOLOG_STORE_PATH")
            && !path.is_empty()
        {
            self.store.path = PathBuf::from(path);
        }

        self
    }

    /// Default config file location: `$XDG_CONFIG_HOME/echolog/config.toml`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("echolog")
            .join("config.toml")
    }
}

//! Layered configuration for Feedsift
//!
//! Loading order (later wins):
//! 1. Built-in defaults (`config/defaults.toml`)
//! 2. Optional TOML file passed with `--config`
//! 3. Environment variables `FEEDSIFT__SECTION__KEY`
//!    (e.g. `FEEDSIFT__MODEL__MIN_TRAINING_EXAMPLES=10`)

use crate::classifier::DEFAULT_MIN_TRAINING_EXAMPLES;
use crate::error::{FeedsiftError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULTS: &str = include_str!("../config/defaults.toml");

/// Environment variable prefix
pub const ENV_PREFIX: &str = "FEEDSIFT";

/// Preference model settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Rated items required before the model emits labels
    pub min_training_examples: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            min_training_examples: DEFAULT_MIN_TRAINING_EXAMPLES,
        }
    }
}

/// When retraining happens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Retrain after every saved rating. When off, use the explicit `train` command.
    pub retrain_on_rating: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            retrain_on_rating: true,
        }
    }
}

/// Preference store location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub db_path: Option<PathBuf>,
}

impl StorageConfig {
    /// Configured path, or `<data_local_dir>/feedsift/feedsift.db`
    pub fn db_path(&self) -> PathBuf {
        self.db_path.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("feedsift")
                .join("feedsift.db")
        })
    }
}

/// Request/response daemon settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonConfig {
    pub socket_path: Option<PathBuf>,

    /// Client-side wait for a response
    pub request_timeout_ms: u64,

    /// Pending requests buffered ahead of the worker
    pub queue_capacity: usize,

    /// How often the worker folds deferred ratings into one retrain
    pub retrain_debounce_ms: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            socket_path: None,
            request_timeout_ms: 5000,
            queue_capacity: 256,
            retrain_debounce_ms: 1000,
        }
    }
}

impl DaemonConfig {
    /// Configured path, or `<runtime_dir>/feedsift/feedsift.sock`
    pub fn socket_path(&self) -> PathBuf {
        self.socket_path.clone().unwrap_or_else(|| {
            dirs::runtime_dir()
                .or_else(dirs::data_local_dir)
                .unwrap_or_else(|| PathBuf::from("."))
                .join("feedsift")
                .join("feedsift.sock")
        })
    }
}

/// Complete Feedsift configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedsiftConfig {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub training: TrainingConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub daemon: DaemonConfig,
}

impl FeedsiftConfig {
    /// Load defaults, then `config_path` if it exists, then environment overrides
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder().add_source(config::File::from_str(
            DEFAULTS,
            config::FileFormat::Toml,
        ));

        if let Some(path) = config_path {
            if path.exists() {
                debug!("Loading configuration from {}", path.display());
                builder = builder.add_source(config::File::from(path));
            } else {
                debug!("Config file {} not found, using defaults", path.display());
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: FeedsiftConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.min_training_examples == 0 {
            return Err(invalid("model.min_training_examples must be at least 1"));
        }
        if self.daemon.request_timeout_ms == 0 {
            return Err(invalid("daemon.request_timeout_ms must be greater than 0"));
        }
        if self.daemon.queue_capacity == 0 {
            return Err(invalid("daemon.queue_capacity must be greater than 0"));
        }
        if self.daemon.retrain_debounce_ms == 0 {
            return Err(invalid("daemon.retrain_debounce_ms must be greater than 0"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> FeedsiftError {
    FeedsiftError::Config(config::ConfigError::Message(message.to_string()))
}

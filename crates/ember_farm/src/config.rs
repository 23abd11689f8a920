//! Farm configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::{Encoding, StartupMessage, StartupParams};

/// Errors from loading or validating a [`FarmConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// How many workers to run and what each of them renders.
///
/// Missing fields in a JSON config fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmConfig {
    /// Number of worker threads
    pub workers: usize,
    pub width: u32,
    pub height: u32,
    /// Iterations each worker renders between two progress messages
    pub iterations_per_message: u32,
    /// Maximum bounce depth
    pub max_depth: u32,
    /// Base seed; worker `i` uses `seed + i` (None = from entropy)
    pub seed: Option<u64>,
    /// Encoding of the startup and progress messages
    pub encoding: Encoding,
    /// Batches after which each worker stops on its own (None = never)
    pub max_batches_per_worker: Option<u64>,
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            width: 320,
            height: 240,
            iterations_per_message: 4,
            max_depth: 5,
            seed: None,
            encoding: Encoding::Native,
            max_batches_per_worker: None,
        }
    }
}

impl FarmConfig {
    /// Parse a config from JSON text and validate it.
    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        let config: FarmConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a JSON file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        log::info!("Loading farm config from {:?}", path);
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_iterations_per_message(mut self, iterations: u32) -> Self {
        self.iterations_per_message = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Check that the config describes a renderable farm.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "resolution {}x{} has no pixels",
                self.width, self.height
            )));
        }
        if self.iterations_per_message == 0 {
            return Err(ConfigError::Invalid(
                "iterations_per_message must be at least 1".into(),
            ));
        }
        if self.max_batches_per_worker == Some(0) {
            return Err(ConfigError::Invalid(
                "max_batches_per_worker must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Startup message sent to every worker.
    pub fn startup_message(&self) -> StartupMessage {
        match self.encoding {
            Encoding::Native => StartupMessage::Native(StartupParams::new(
                self.width,
                self.height,
                self.iterations_per_message,
            )),
            Encoding::Json => StartupMessage::Text(format!(
                "{},{},{}",
                self.width, self.height, self.iterations_per_message
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = FarmConfig::default();
        assert!(config.workers >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = FarmConfig::from_json_str(
            r#"{ "workers": 2, "width": 64, "height": 32, "encoding": "json", "seed": 9 }"#,
        )
        .unwrap();

        assert_eq!(config.workers, 2);
        assert_eq!((config.width, config.height), (64, 32));
        assert_eq!(config.encoding, Encoding::Json);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.iterations_per_message, 4);
        assert_eq!(config.max_depth, 5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            FarmConfig::from_json_str(r#"{ "workers": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            FarmConfig::from_json_str(r#"{ "width": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            FarmConfig::from_json_str(r#"{ "iterations_per_message": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            FarmConfig::from_json_str(r#"{ "workers": "many" }"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_startup_message_matches_encoding() {
        let config = FarmConfig::default()
            .with_resolution(40, 30)
            .with_iterations_per_message(7);

        let (params, encoding) = config.startup_message().parse().unwrap();
        assert_eq!(params, StartupParams::new(40, 30, 7));
        assert_eq!(encoding, Encoding::Native);

        let text = config.with_encoding(Encoding::Json).startup_message();
        assert_eq!(text, StartupMessage::Text("40,30,7".to_string()));
        assert_eq!(text.parse().unwrap().1, Encoding::Json);
    }

    #[test]
    fn test_load_missing_file() {
        let result = FarmConfig::load("/nonexistent/ember/farm.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}

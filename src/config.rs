//! Harness configuration, loaded from an optional TOML file and then overridden
//! from the command line.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Model file in the `DPQM` format. Without one, a template-matching model is built
    /// from the sample table.
    pub model: Option<PathBuf>,
    /// Working-memory budget of the engine.
    pub arena_bytes: usize,
    /// Pause between samples of an automatic test.
    pub pacing_ms: u64,
    /// Upper bound on one wait for input.
    pub poll_timeout_ms: u64,
    /// MNIST IDX image file; requires `labels`.
    pub images: Option<PathBuf>,
    /// MNIST IDX label file; requires `images`.
    pub labels: Option<PathBuf>,
    /// Park forever after a fatal startup error instead of exiting.
    pub halt_on_fatal: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            model: None,
            arena_bytes: 64 * 1024,
            pacing_ms: 200,
            poll_timeout_ms: 1,
            images: None,
            labels: None,
            halt_on_fatal: true,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.arena_bytes == 0 {
            return Err(ConfigError::Invalid("arena_bytes must be positive".into()));
        }
        if self.images.is_some() != self.labels.is_some() {
            return Err(ConfigError::Invalid(
                "images and labels must be given together".into(),
            ));
        }
        Ok(())
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn fields_override_defaults() {
        let config = Config::from_toml(
            "model = \"m.dpqm\"\npacing_ms = 0\nimages = \"i\"\nlabels = \"l.gz\"\n",
        )
        .unwrap();
        assert_eq!(config.model, Some(PathBuf::from("m.dpqm")));
        assert_eq!(config.pacing(), Duration::ZERO);
        assert_eq!(config.arena_bytes, 64 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(Config::from_toml("arena = 5").is_err());
    }

    #[test]
    fn lone_image_path_is_invalid() {
        let config = Config {
            images: Some(PathBuf::from("i")),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}

//! Configuration for the attention engine

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{EngineError, Result};

const APP_NAME: &str = "attention-budget";

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// A component must score strictly above this to be allocated
    pub activation_threshold: f64,

    /// Enable the learned score adjustment
    pub learning_enabled: bool,

    /// Training examples required before adjustments are applied
    pub warmup_examples: usize,

    /// Retrain after every N appended training examples
    pub retrain_every: usize,

    /// Passes over the training set per retrain
    pub epochs: usize,

    /// Gradient descent step size
    pub learning_rate: f64,

    /// Maximum interactions kept in the ledger (oldest evicted)
    pub history_capacity: usize,

    /// Most recent interactions written to a learning snapshot
    pub persist_history_limit: usize,

    /// Upper clamp for adjusted scores
    pub score_ceiling: f64,

    /// Directory holding the learning snapshot
    pub model_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            activation_threshold: 10.0,
            learning_enabled: true,
            warmup_examples: 50,
            retrain_every: 20,
            epochs: 10,
            learning_rate: 0.01,
            history_capacity: 1000,
            persist_history_limit: 500,
            score_ceiling: 100.0,
            model_path: default_model_path(),
        }
    }
}

/// `<config dir>/attention-budget`, or `./data` when no config dir exists.
pub fn default_model_path() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join(APP_NAME),
        None => PathBuf::from("./data"),
    }
}

/// `<config dir>/attention-budget/config.toml`
pub fn default_config_path() -> PathBuf {
    default_model_path().join("config.toml")
}

impl EngineConfig {
    /// Load from `path`, or the default location. A missing default file
    /// yields the defaults; a missing explicit file is an error.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let path = default_config_path();
                if path.exists() {
                    Self::load(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load config from TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.activation_threshold.is_finite() {
            return Err(EngineError::Config("activation_threshold must be finite".into()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate >= 0.0) {
            return Err(EngineError::Config(format!(
                "learning_rate must be a non-negative number, got {}",
                self.learning_rate
            )));
        }
        if self.epochs == 0 {
            return Err(EngineError::Config("epochs must be > 0".into()));
        }
        if self.retrain_every == 0 {
            return Err(EngineError::Config("retrain_every must be > 0".into()));
        }
        if self.history_capacity == 0 {
            return Err(EngineError::Config("history_capacity must be > 0".into()));
        }
        if !(self.score_ceiling.is_finite() && self.score_ceiling > 0.0) {
            return Err(EngineError::Config("score_ceiling must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.warmup_examples, 50);
        assert_eq!(config.retrain_every, 20);
        assert_eq!(config.epochs, 10);
        assert_eq!(config.activation_threshold, 10.0);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: EngineConfig = toml::from_str("learning_rate = 0.05\n").unwrap();
        assert_eq!(config.learning_rate, 0.05);
        assert_eq!(config.history_capacity, 1000);
    }

    #[test]
    fn test_rejects_zero_epochs() {
        let config = EngineConfig { epochs: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        let config = EngineConfig { activation_threshold: 12.5, ..Default::default() };
        config.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded.activation_threshold, 12.5);
        assert_eq!(loaded.model_path, config.model_path);
    }

    #[test]
    fn test_resolve_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = EngineConfig::resolve(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(EngineError::Io(_))));
    }
}

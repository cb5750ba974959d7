use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::get_think_multiplier;
use crate::error::LevelError;
use crate::types::Difficulty;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    pub difficulty: Difficulty,
    /// Overrides the difficulty's multiplier on every ghost think interval.
    pub think_multiplier: Option<f64>,
    /// Fixed seed for ghost decisions; random when absent.
    pub seed: Option<u32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Hard,
            think_multiplier: None,
            seed: None,
        }
    }
}

impl SessionConfig {
    pub fn effective_think_multiplier(&self) -> f64 {
        self.think_multiplier
            .unwrap_or_else(|| get_think_multiplier(self.difficulty))
    }

    pub fn resolve_seed(&self) -> u32 {
        self.seed.unwrap_or_else(rand::random::<u32>)
    }

    pub fn from_json_str(text: &str) -> Result<Self, LevelError> {
        let config: Self =
            serde_json::from_str(text).map_err(|err| LevelError::Config(err.to_string()))?;
        if let Some(multiplier) = config.think_multiplier {
            if !multiplier.is_finite() || multiplier <= 0.0 {
                return Err(LevelError::Config(format!(
                    "thinkMultiplier must be positive, got {multiplier}"
                )));
            }
        }
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, LevelError> {
        let text = fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_hard_mode() {
        let config = SessionConfig::default();
        assert_eq!(config.difficulty, Difficulty::Hard);
        assert_eq!(config.effective_think_multiplier(), 1.0);
        assert_eq!(SessionConfig::from_json_str("{}").expect("empty object"), config);
    }

    #[test]
    fn normal_mode_and_override() {
        let config = SessionConfig::from_json_str(r#"{"difficulty":"normal","seed":7}"#)
            .expect("valid config");
        assert_eq!(config.effective_think_multiplier(), 1.2);
        assert_eq!(config.resolve_seed(), 7);

        let config = SessionConfig::from_json_str(r#"{"thinkMultiplier":0.5}"#)
            .expect("valid config");
        assert_eq!(config.effective_think_multiplier(), 0.5);
    }

    #[test]
    fn rejects_bad_multiplier_and_bad_json() {
        assert!(matches!(
            SessionConfig::from_json_str(r#"{"thinkMultiplier":-1}"#),
            Err(LevelError::Config(_))
        ));
        assert!(SessionConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("session.json");
        fs::write(&path, r#"{"difficulty":"hard","seed":42}"#).expect("write config");
        let config = SessionConfig::from_json_file(&path).expect("load config");
        assert_eq!(config.seed, Some(42));
    }
}

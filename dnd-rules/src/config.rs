//! Tunable rules switches.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors from loading a rules configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Rules options that vary between tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Maximum number of entries kept in an encounter's combat log.
    pub combat_log_capacity: usize,
    /// Reroll 1s and 2s on damage dice for the Great Weapon Fighting style.
    ///
    /// Off by default, which matches the long-standing behaviour of the
    /// engine where the style grants no mechanical benefit.
    pub great_weapon_fighting_reroll: bool,
    /// Add sneak attack dice when the caller marks a strike as eligible.
    pub sneak_attack: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            combat_log_capacity: 20,
            great_weapon_fighting_reroll: false,
            sneak_attack: true,
        }
    }
}

impl RulesConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_combat_log_capacity(mut self, capacity: usize) -> Self {
        self.combat_log_capacity = capacity;
        self
    }

    pub fn with_great_weapon_fighting_reroll(mut self, enabled: bool) -> Self {
        self.great_weapon_fighting_reroll = enabled;
        self
    }

    pub fn with_sneak_attack(mut self, enabled: bool) -> Self {
        self.sneak_attack = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.combat_log_capacity == 0 {
            return Err(ConfigError::Invalid(
                "combat_log_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Load from a JSON file. Missing fields take their default values.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

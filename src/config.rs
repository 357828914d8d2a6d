//! Engine configuration
//!
//! Loaded from `config.ron` in the home directory, with fallback to defaults.

use std::fs;
use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Storage keys used for persisted state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    /// XP ledger JSON blob
    pub xp_state: String,
    /// Serialized quest array
    pub daily_quests: String,
    /// Last reset instant, epoch milliseconds
    pub daily_last_reset: String,
    /// XP earned from quests since the last reset
    pub daily_xp_earned: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            xp_state: "pear.xp_state".to_string(),
            daily_quests: "pear.daily_quests".to_string(),
            daily_last_reset: "pear.daily_quests.last_reset".to_string(),
            daily_xp_earned: "pear.daily_quests.xp_earned".to_string(),
        }
    }
}

/// Tunable engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum quest XP per reset window
    pub daily_xp_cap: u32,
    /// Length of the quest reset window
    pub reset_window_hours: u32,
    /// How many reward entries the ledger keeps
    pub recent_rewards_limit: usize,
    pub storage_keys: StorageKeys,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            daily_xp_cap: 300,
            reset_window_hours: 24,
            recent_rewards_limit: 10,
            storage_keys: StorageKeys::default(),
        }
    }
}

impl EngineConfig {
    pub fn reset_window(&self) -> Duration {
        Duration::hours(i64::from(self.reset_window_hours))
    }

    /// Load `config.ron` from `home`, or defaults if missing or invalid
    pub fn load(home: &Path) -> Self {
        let path = home.join("config.ron");
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => match ron::from_str(&content) {
                    Ok(config) => {
                        log::info!("Config loaded from {:?}", path);
                        return config;
                    }
                    Err(e) => log::warn!("Failed to parse config.ron: {}, using defaults", e),
                },
                Err(e) => log::warn!("Failed to read config.ron: {}, using defaults", e),
            }
        }
        Self::default()
    }
}

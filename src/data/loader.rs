//! RON data loader
//!
//! Loads progression data from RON files, with fallback to built-in defaults.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::progression::{default_badges, Badge, LevelTable, QuestCatalog};

const LEVELS_FILE: &str = "levels.ron";
const QUESTS_FILE: &str = "quests.ron";
const BADGES_FILE: &str = "badges.ron";

/// Errors writing data files
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to create data directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize {file}: {source}")]
    Serialize {
        file: &'static str,
        #[source]
        source: ron::Error,
    },
    #[error("failed to write {file}: {source}")]
    Write {
        file: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// All data the progression engine is configured with
#[derive(Debug, Clone)]
pub struct DataManager {
    pub levels: Arc<LevelTable>,
    pub quests: Arc<QuestCatalog>,
    pub badges: Vec<Badge>,
}

impl DataManager {
    /// Load data from `dir`, falling back per file to defaults
    pub fn load_from_dir(dir: &Path) -> Self {
        let levels = load_or_default(dir, LEVELS_FILE, LevelTable::default);
        let quests = load_or_default(dir, QUESTS_FILE, QuestCatalog::default);
        let badges = load_or_default(dir, BADGES_FILE, default_badges);

        Self {
            levels: Arc::new(levels),
            quests: Arc::new(quests),
            badges,
        }
    }

    pub fn level_table(&self) -> &LevelTable {
        &self.levels
    }

    pub fn quest_catalog(&self) -> &QuestCatalog {
        &self.quests
    }
}

impl Default for DataManager {
    fn default() -> Self {
        Self {
            levels: Arc::new(LevelTable::default()),
            quests: Arc::new(QuestCatalog::default()),
            badges: default_badges(),
        }
    }
}

fn load_or_default<T: DeserializeOwned>(dir: &Path, file: &str, default: fn() -> T) -> T {
    let path = dir.join(file);
    if path.exists() {
        match fs::read_to_string(&path) {
            Ok(content) => match ron::from_str(&content) {
                Ok(value) => {
                    log::info!("Loaded {:?}", path);
                    return value;
                }
                Err(e) => log::warn!("Failed to parse {}: {}, using defaults", file, e),
            },
            Err(e) => log::warn!("Failed to read {}: {}, using defaults", file, e),
        }
    }
    default()
}

fn export<T: Serialize>(dir: &Path, file: &'static str, value: &T) -> Result<(), DataError> {
    let content = ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
        .map_err(|source| DataError::Serialize { file, source })?;
    fs::write(dir.join(file), content).map_err(|source| DataError::Write { file, source })
}

/// Export all default data to RON files for easy editing
pub fn export_default_data(dir: &Path) -> Result<(), DataError> {
    fs::create_dir_all(dir).map_err(|source| DataError::CreateDir {
        path: dir.display().to_string(),
        source,
    })?;

    let defaults = DataManager::default();
    export(dir, LEVELS_FILE, defaults.levels.as_ref())?;
    export(dir, QUESTS_FILE, defaults.quests.as_ref())?;
    export(dir, BADGES_FILE, &defaults.badges)?;

    log::info!("Exported default data to {:?}", dir);
    Ok(())
}

//! Level table and level resolution
//!
//! Maps cumulative XP to a level, the next level, XP remaining and percent
//! progress. The table is validated once when it is built.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named tier unlocked at a cumulative XP threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub level: u32,
    pub xp_threshold: u32,
    pub title: String,
    pub description: String,
    /// Display color as a hex string
    pub color: String,
}

impl Level {
    pub fn new(level: u32, xp_threshold: u32, title: &str, description: &str, color: &str) -> Self {
        Self {
            level,
            xp_threshold,
            title: title.to_string(),
            description: description.to_string(),
            color: color.to_string(),
        }
    }
}

/// Reasons a level table is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelTableError {
    #[error("level table is empty")]
    Empty,
    #[error("first level must be level 1 at 0 XP, found level {level} at {threshold} XP")]
    BadFirstLevel { level: u32, threshold: u32 },
    #[error("level {found} follows level {previous}; levels must be contiguous")]
    NonContiguous { previous: u32, found: u32 },
    #[error("level {level} threshold {threshold} does not exceed previous threshold {previous}")]
    NonIncreasing { level: u32, threshold: u32, previous: u32 },
}

/// Validated, ascending list of levels
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LevelTable {
    levels: Vec<Level>,
}

/// Everything the UI needs to render a progress bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    pub total_xp: u32,
    pub current: Level,
    pub next: Option<Level>,
    pub xp_to_next: u32,
    pub percent: u8,
}

impl LevelTable {
    /// Build a table, checking ordering invariants
    pub fn new(levels: Vec<Level>) -> Result<Self, LevelTableError> {
        let first = levels.first().ok_or(LevelTableError::Empty)?;
        if first.level != 1 || first.xp_threshold != 0 {
            return Err(LevelTableError::BadFirstLevel {
                level: first.level,
                threshold: first.xp_threshold,
            });
        }

        for pair in levels.windows(2) {
            let (prev, cur) = (&pair[0], &pair[1]);
            if cur.level != prev.level + 1 {
                return Err(LevelTableError::NonContiguous {
                    previous: prev.level,
                    found: cur.level,
                });
            }
            if cur.xp_threshold <= prev.xp_threshold {
                return Err(LevelTableError::NonIncreasing {
                    level: cur.level,
                    threshold: cur.xp_threshold,
                    previous: prev.xp_threshold,
                });
            }
        }

        Ok(Self { levels })
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn max_level(&self) -> &Level {
        // Non-empty by construction
        &self.levels[self.levels.len() - 1]
    }

    /// Look up a level by its number
    pub fn level(&self, number: u32) -> Option<&Level> {
        let index = number.checked_sub(1)? as usize;
        self.levels.get(index)
    }

    fn index_for(&self, xp: u32) -> usize {
        // First threshold is 0, so at least one level always matches
        self.levels
            .partition_point(|l| l.xp_threshold <= xp)
            .saturating_sub(1)
    }

    /// Highest level whose threshold is at or below `xp`
    pub fn resolve_level(&self, xp: u32) -> &Level {
        &self.levels[self.index_for(xp)]
    }

    /// Level after the resolved one, `None` at max level
    pub fn next_level(&self, xp: u32) -> Option<&Level> {
        self.levels.get(self.index_for(xp) + 1)
    }

    /// XP still needed for the next level (0 at max level)
    pub fn xp_to_next(&self, xp: u32) -> u32 {
        self.next_level(xp)
            .map(|next| next.xp_threshold - xp)
            .unwrap_or(0)
    }

    /// Percent progress through the current level, in `0..=100`
    pub fn progress_percent(&self, xp: u32) -> u8 {
        let current = self.resolve_level(xp);
        let Some(next) = self.next_level(xp) else {
            return 100;
        };

        let span = (next.xp_threshold - current.xp_threshold) as f64;
        let into = (xp - current.xp_threshold) as f64;
        let percent = (100.0 * into / span).round();
        percent.clamp(0.0, 100.0) as u8
    }

    /// Snapshot of all resolver outputs for `xp`
    pub fn progress(&self, xp: u32) -> LevelProgress {
        LevelProgress {
            total_xp: xp,
            current: self.resolve_level(xp).clone(),
            next: self.next_level(xp).cloned(),
            xp_to_next: self.xp_to_next(xp),
            percent: self.progress_percent(xp),
        }
    }
}

impl<'de> Deserialize<'de> for LevelTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let levels = Vec::<Level>::deserialize(deserializer)?;
        LevelTable::new(levels).map_err(serde::de::Error::custom)
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self {
            levels: default_levels(),
        }
    }
}

/// Built-in level tiers
pub fn default_levels() -> Vec<Level> {
    vec![
        Level::new(1, 0, "Seedling", "Just getting started. Every piece of litter counts.", "#8BC34A"),
        Level::new(2, 250, "Sprout", "Your first cleanups are taking root.", "#7CB342"),
        Level::new(3, 600, "Sapling", "A regular face at neighborhood cleanups.", "#689F38"),
        Level::new(4, 1000, "Trail Keeper", "Parks and paths stay clean on your watch.", "#558B2F"),
        Level::new(5, 1500, "River Guardian", "Waterways are safer thanks to you.", "#0288D1"),
        Level::new(6, 2200, "Reef Protector", "Shorelines and beaches are your territory.", "#0277BD"),
        Level::new(7, 3000, "Grove Warden", "You lead others into the field.", "#2E7D32"),
        Level::new(8, 4000, "Eco Champion", "Your impact is felt across the community.", "#1B5E20"),
        Level::new(9, 5500, "Earth Defender", "A pillar of the movement.", "#F9A825"),
        Level::new(10, 7500, "Planet Hero", "The highest honor a PEAR member can earn.", "#FF6F00"),
    ]
}

//! Badge definitions
//!
//! Badges unlock once, when the ledger first meets their requirement.

use serde::{Deserialize, Serialize};

/// What a player must reach to earn a badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BadgeRequirement {
    ReachLevel(u32),
    TotalXp(u32),
    StreakDays(u32),
}

impl BadgeRequirement {
    pub fn is_met(&self, level: u32, total_xp: u32, streak_days: u32) -> bool {
        match *self {
            BadgeRequirement::ReachLevel(n) => level >= n,
            BadgeRequirement::TotalXp(n) => total_xp >= n,
            BadgeRequirement::StreakDays(n) => streak_days >= n,
        }
    }
}

/// Badge definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub requirement: BadgeRequirement,
}

impl Badge {
    fn new(id: &str, name: &str, description: &str, requirement: BadgeRequirement) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            requirement,
        }
    }
}

/// Get all built-in badge definitions
pub fn default_badges() -> Vec<Badge> {
    use BadgeRequirement::*;

    vec![
        // XP milestones
        Badge::new("first_steps", "First Steps", "Earn your first 50 XP", TotalXp(50)),
        Badge::new("xp_1000", "Committed", "Earn 1,000 XP total", TotalXp(1000)),
        Badge::new("xp_5000", "Unstoppable", "Earn 5,000 XP total", TotalXp(5000)),
        // Level tiers
        Badge::new("trash_hero", "Trash Hero", "Reach level 3", ReachLevel(3)),
        Badge::new("impact_warrior", "Impact Warrior", "Reach level 5", ReachLevel(5)),
        Badge::new("eco_defender", "Eco Defender", "Reach level 8", ReachLevel(8)),
        Badge::new("planet_hero", "Planet Hero", "Reach the highest level", ReachLevel(10)),
        // Streaks
        Badge::new("streak_3", "Habit Forming", "Log in 3 days in a row", StreakDays(3)),
        Badge::new("streak_7", "Week Warrior", "Log in 7 days in a row", StreakDays(7)),
        Badge::new("streak_30", "Evergreen", "Log in 30 days in a row", StreakDays(30)),
    ]
}

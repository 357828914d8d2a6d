//! XP ledger
//!
//! Owns cumulative XP, reward history, level-up history and login streaks.
//! Every mutation is persisted as one JSON blob. A failed write is logged and
//! the in-memory state stands; the next successful write catches storage up.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::badges::Badge;
use super::levels::{Level, LevelProgress, LevelTable};
use crate::clock::SharedClock;
use crate::config::EngineConfig;
use crate::save::SharedStore;

/// One XP change, newest first in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardEntry {
    /// Positive for awards, negative for deductions
    pub amount: i64,
    pub source: String,
    /// Epoch milliseconds
    pub timestamp: i64,
}

/// Persisted ledger state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XpState {
    #[serde(rename = "totalXP")]
    pub total_xp: u32,
    #[serde(rename = "currentLevel")]
    pub current_level: u32,
    #[serde(rename = "weeklyXP")]
    pub weekly_xp: u32,
    #[serde(rename = "monthlyXP")]
    pub monthly_xp: u32,
    #[serde(rename = "recentRewards")]
    pub recent_rewards: Vec<RewardEntry>,
    #[serde(rename = "levelUpHistory")]
    pub level_up_history: Vec<Level>,
    #[serde(rename = "lastLoginDate")]
    pub last_login_date: Option<NaiveDate>,
    #[serde(rename = "streakDays")]
    pub streak_days: u32,
    /// Unlocked badge ids
    pub badges: BTreeSet<String>,
    /// Level-up not yet acknowledged by the UI
    #[serde(rename = "pendingLevelUp")]
    pub pending_level_up: Option<Level>,
}

impl Default for XpState {
    fn default() -> Self {
        Self {
            total_xp: 0,
            current_level: 1,
            weekly_xp: 0,
            monthly_xp: 0,
            recent_rewards: Vec::new(),
            level_up_history: Vec::new(),
            last_login_date: None,
            streak_days: 0,
            badges: BTreeSet::new(),
            pending_level_up: None,
        }
    }
}

/// Result of a successful `add_xp`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XpOutcome {
    pub amount: u32,
    pub total_xp: u32,
    /// Set when this award crossed into a higher level
    pub level_up: Option<Level>,
    pub new_badges: Vec<Badge>,
}

/// Running counters that can be reset on their own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Weekly,
    Monthly,
}

/// The authoritative XP record for one user
pub struct XpLedger {
    state: XpState,
    levels: Arc<LevelTable>,
    badges: Vec<Badge>,
    store: SharedStore,
    clock: SharedClock,
    key: String,
    recent_limit: usize,
}

impl XpLedger {
    /// Load the ledger from storage, or start fresh
    pub fn load(
        store: SharedStore,
        clock: SharedClock,
        levels: Arc<LevelTable>,
        badges: Vec<Badge>,
        config: &EngineConfig,
    ) -> Self {
        let key = config.storage_keys.xp_state.clone();
        let state = match store.get(&key) {
            Ok(Some(data)) => match serde_json::from_str::<XpState>(&data) {
                Ok(state) => {
                    log::info!("XP state loaded ({} XP)", state.total_xp);
                    state
                }
                Err(e) => {
                    log::warn!("Failed to parse XP state: {}, starting fresh", e);
                    XpState::default()
                }
            },
            Ok(None) => {
                log::info!("Creating new XP state");
                XpState::default()
            }
            Err(e) => {
                log::warn!("Failed to read XP state: {}, starting fresh", e);
                XpState::default()
            }
        };

        let mut ledger = Self {
            state,
            levels,
            badges,
            store,
            clock,
            key,
            recent_limit: config.recent_rewards_limit,
        };
        ledger.normalize();
        ledger
    }

    /// Repair state that no longer fits the current table or limits
    fn normalize(&mut self) {
        if self.levels.level(self.state.current_level).is_none() {
            let resolved = self.levels.resolve_level(self.state.total_xp).level;
            log::warn!(
                "Stored level {} is not in the level table, using {}",
                self.state.current_level,
                resolved
            );
            self.state.current_level = resolved;
        }
        self.state.recent_rewards.truncate(self.recent_limit);
    }

    pub fn state(&self) -> &XpState {
        &self.state
    }

    pub fn total_xp(&self) -> u32 {
        self.state.total_xp
    }

    pub fn levels(&self) -> &LevelTable {
        &self.levels
    }

    pub fn badges(&self) -> &[Badge] {
        &self.badges
    }

    /// The stored current level
    pub fn current_level(&self) -> &Level {
        self.levels
            .level(self.state.current_level)
            .unwrap_or_else(|| self.levels.resolve_level(self.state.total_xp))
    }

    pub fn progress(&self) -> LevelProgress {
        self.levels.progress(self.state.total_xp)
    }

    pub fn pending_level_up(&self) -> Option<&Level> {
        self.state.pending_level_up.as_ref()
    }

    /// Acknowledge the level-up, returning to idle
    pub fn dismiss_level_up(&mut self) -> Option<Level> {
        let dismissed = self.state.pending_level_up.take()?;
        self.persist();
        Some(dismissed)
    }

    /// Award XP. Non-positive amounts are ignored.
    pub fn add_xp(&mut self, amount: i64, source: &str) -> Option<XpOutcome> {
        if amount <= 0 {
            log::debug!("Ignoring non-positive XP award {} from {}", amount, source);
            return None;
        }
        let amount = u32::try_from(amount).unwrap_or(u32::MAX);

        let new_total = self.state.total_xp.saturating_add(amount);
        let amount = new_total - self.state.total_xp;
        if amount == 0 {
            log::warn!("XP total already at maximum, ignoring award from {}", source);
            return None;
        }
        let resolved = self.levels.resolve_level(new_total).clone();

        let level_up = if resolved.level > self.state.current_level {
            log::info!("Level up: {} -> {} ({})", self.state.current_level, resolved.level, resolved.title);
            self.state.level_up_history.push(resolved.clone());
            self.state.pending_level_up = Some(resolved.clone());
            Some(resolved.clone())
        } else {
            None
        };

        self.state.total_xp = new_total;
        self.state.current_level = self.state.current_level.max(resolved.level);
        self.state.weekly_xp = self.state.weekly_xp.saturating_add(amount);
        self.state.monthly_xp = self.state.monthly_xp.saturating_add(amount);
        self.push_reward(i64::from(amount), source);

        let new_badges = self.unlock_badges();
        self.persist();

        Some(XpOutcome {
            amount,
            total_xp: new_total,
            level_up,
            new_badges,
        })
    }

    /// Deduct XP, floored at 0. Returns the new total, or `None` if ignored.
    ///
    /// The stored level follows the total back down, without an event.
    pub fn subtract_xp(&mut self, amount: i64, source: &str) -> Option<u32> {
        if amount <= 0 {
            return None;
        }
        let amount = u32::try_from(amount).unwrap_or(u32::MAX);
        let removed = amount.min(self.state.total_xp);

        self.state.total_xp -= removed;
        self.state.weekly_xp = self.state.weekly_xp.saturating_sub(removed);
        self.state.monthly_xp = self.state.monthly_xp.saturating_sub(removed);

        let resolved = self.levels.resolve_level(self.state.total_xp).level;
        if resolved < self.state.current_level {
            log::info!("Level dropped: {} -> {}", self.state.current_level, resolved);
            self.state.current_level = resolved;
        }

        self.push_reward(-i64::from(removed), source);
        self.persist();
        Some(self.state.total_xp)
    }

    /// Reinitialize the ledger to defaults
    pub fn reset_xp(&mut self) {
        log::info!("Resetting XP state");
        self.state = XpState::default();
        self.persist();
    }

    /// Zero a weekly or monthly counter
    pub fn reset_period(&mut self, period: Period) {
        match period {
            Period::Weekly => self.state.weekly_xp = 0,
            Period::Monthly => self.state.monthly_xp = 0,
        }
        self.persist();
    }

    /// Update the login streak for `today`. Returns newly unlocked badges.
    pub fn record_login(&mut self, today: NaiveDate) -> Vec<Badge> {
        match self.state.last_login_date {
            Some(last) if last == today => return Vec::new(),
            Some(last) if last.succ_opt() == Some(today) => {
                self.state.streak_days += 1;
            }
            _ => self.state.streak_days = 1,
        }
        self.state.last_login_date = Some(today);
        log::info!("Login recorded, streak {} days", self.state.streak_days);

        let new_badges = self.unlock_badges();
        self.persist();
        new_badges
    }

    fn push_reward(&mut self, amount: i64, source: &str) {
        let entry = RewardEntry {
            amount,
            source: source.to_string(),
            timestamp: self.clock.now().timestamp_millis(),
        };
        self.state.recent_rewards.insert(0, entry);
        self.state.recent_rewards.truncate(self.recent_limit);
    }

    fn unlock_badges(&mut self) -> Vec<Badge> {
        let mut unlocked = Vec::new();
        for badge in &self.badges {
            if self.state.badges.contains(&badge.id) {
                continue;
            }
            let met = badge.requirement.is_met(
                self.state.current_level,
                self.state.total_xp,
                self.state.streak_days,
            );
            if met {
                self.state.badges.insert(badge.id.clone());
                log::info!("Badge unlocked: {}", badge.id);
                unlocked.push(badge.clone());
            }
        }
        unlocked
    }

    fn persist(&self) {
        let json = match serde_json::to_string(&self.state) {
            Ok(json) => json,
            Err(e) => {
                log::error!("Failed to serialize XP state: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(&self.key, &json) {
            log::error!("Failed to save XP state: {}", e);
        }
    }
}

//! Progress session
//!
//! One owned handle per user session. Quest XP passes through the daily cap
//! before it reaches the ledger, and every change is reported to the event
//! sink.

use serde::Serialize;

use super::ledger::{Period, XpLedger, XpOutcome};
use super::levels::{Level, LevelProgress};
use super::quests::{DailyQuestTracker, Quest};
use crate::clock::SharedClock;
use crate::config::EngineConfig;
use crate::data::DataManager;
use crate::events::{EventSink, ProgressEvent};
use crate::save::SharedStore;

/// Read model for rendering the progress screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub progress: LevelProgress,
    pub pending_level_up: Option<Level>,
    pub weekly_xp: u32,
    pub monthly_xp: u32,
    pub streak_days: u32,
    pub badges: Vec<String>,
    pub quest_xp_today: u32,
    pub quest_xp_remaining: u32,
    pub daily_cap: u32,
}

pub struct ProgressSession {
    ledger: XpLedger,
    quests: DailyQuestTracker,
    clock: SharedClock,
    sink: Box<dyn EventSink>,
}

impl ProgressSession {
    /// Load ledger and quest state from `store`
    pub fn open(
        store: SharedStore,
        clock: SharedClock,
        data: &DataManager,
        config: &EngineConfig,
        sink: Box<dyn EventSink>,
    ) -> Self {
        let ledger = XpLedger::load(
            store.clone(),
            clock.clone(),
            data.levels.clone(),
            data.badges.clone(),
            config,
        );
        let quests = DailyQuestTracker::load(store, clock.clone(), data.quests.clone(), config);
        Self { ledger, quests, clock, sink }
    }

    pub fn ledger(&self) -> &XpLedger {
        &self.ledger
    }

    pub fn quests(&mut self) -> &[Quest] {
        self.quests.quests()
    }

    /// Award XP from any source
    pub fn add_xp(&mut self, amount: i64, source: &str) -> Option<XpOutcome> {
        let outcome = self.ledger.add_xp(amount, source)?;
        self.report(&outcome, source);
        Some(outcome)
    }

    pub fn subtract_xp(&mut self, amount: i64, source: &str) -> Option<u32> {
        self.ledger.subtract_xp(amount, source)
    }

    pub fn reset_xp(&mut self) {
        self.ledger.reset_xp();
    }

    pub fn reset_period(&mut self, period: Period) {
        self.ledger.reset_period(period);
    }

    pub fn dismiss_level_up(&mut self) -> Option<Level> {
        self.ledger.dismiss_level_up()
    }

    /// Complete a daily quest and forward its XP to the ledger.
    /// Returns the XP granted, 0 if the quest was refused.
    pub fn complete_quest(&mut self, id: &str) -> u32 {
        let granted = self.quests.complete_quest(id);
        if granted == 0 {
            return 0;
        }

        self.sink.emit(ProgressEvent::QuestCompleted {
            quest_id: id.to_string(),
            xp: granted,
        });
        self.add_xp(i64::from(granted), &format!("quest:{}", id));
        granted
    }

    pub fn reset_quests(&mut self) {
        self.quests.reset();
    }

    /// Record today's login, returning the current streak
    pub fn record_login(&mut self) -> u32 {
        let today = self.clock.today();
        for badge in self.ledger.record_login(today) {
            self.sink.emit(ProgressEvent::BadgeUnlocked { badge });
        }
        self.ledger.state().streak_days
    }

    pub fn snapshot(&mut self) -> ProgressSnapshot {
        let state = self.ledger.state();
        ProgressSnapshot {
            progress: self.ledger.progress(),
            pending_level_up: self.ledger.pending_level_up().cloned(),
            weekly_xp: state.weekly_xp,
            monthly_xp: state.monthly_xp,
            streak_days: state.streak_days,
            badges: state.badges.iter().cloned().collect(),
            quest_xp_today: self.quests.xp_earned_today(),
            quest_xp_remaining: self.quests.remaining_allowance(),
            daily_cap: self.quests.daily_cap(),
        }
    }

    fn report(&mut self, outcome: &XpOutcome, source: &str) {
        self.sink.emit(ProgressEvent::XpAwarded {
            amount: outcome.amount,
            source: source.to_string(),
            total_xp: outcome.total_xp,
        });
        if let Some(level) = &outcome.level_up {
            self.sink.emit(ProgressEvent::LevelUp { level: level.clone() });
        }
        for badge in &outcome.new_badges {
            self.sink.emit(ProgressEvent::BadgeUnlocked { badge: badge.clone() });
        }
    }
}

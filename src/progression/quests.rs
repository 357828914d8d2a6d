//! Daily quests
//!
//! A fixed catalog of quests that can each be completed once per reset window,
//! with a cap on the total XP they grant inside that window. The window resets
//! lazily: every read and mutation first checks whether it has expired.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::SharedClock;
use crate::config::{EngineConfig, StorageKeys};
use crate::save::SharedStore;

/// Quest categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestCategory {
    Cleanup,
    Social,
    Reporting,
    Engagement,
}

impl QuestCategory {
    pub fn name(&self) -> &'static str {
        match self {
            QuestCategory::Cleanup => "Cleanup",
            QuestCategory::Social => "Social",
            QuestCategory::Reporting => "Reporting",
            QuestCategory::Engagement => "Engagement",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub id: String,
    pub title: String,
    pub description: String,
    pub xp_value: u32,
    #[serde(default)]
    pub completed: bool,
    pub category: QuestCategory,
}

impl Quest {
    pub fn new(id: &str, title: &str, description: &str, xp_value: u32, category: QuestCategory) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            xp_value,
            completed: false,
            category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestCatalogError {
    #[error("duplicate quest id {0:?}")]
    DuplicateId(String),
}

/// The set of quests every window starts from, all incomplete
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QuestCatalog {
    quests: Vec<Quest>,
}

impl QuestCatalog {
    pub fn new(quests: Vec<Quest>) -> Result<Self, QuestCatalogError> {
        let mut seen = HashSet::new();
        for quest in &quests {
            if !seen.insert(quest.id.as_str()) {
                return Err(QuestCatalogError::DuplicateId(quest.id.clone()));
            }
        }
        let quests = quests
            .into_iter()
            .map(|q| Quest { completed: false, ..q })
            .collect();
        Ok(Self { quests })
    }

    pub fn quests(&self) -> &[Quest] {
        &self.quests
    }

    pub fn find(&self, id: &str) -> Option<&Quest> {
        self.quests.iter().find(|q| q.id == id)
    }

    pub fn by_category(&self, category: QuestCategory) -> Vec<&Quest> {
        self.quests.iter().filter(|q| q.category == category).collect()
    }
}

impl<'de> Deserialize<'de> for QuestCatalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let quests = Vec::<Quest>::deserialize(deserializer)?;
        QuestCatalog::new(quests).map_err(serde::de::Error::custom)
    }
}

impl Default for QuestCatalog {
    fn default() -> Self {
        Self {
            quests: default_quests(),
        }
    }
}

/// Built-in daily quests
pub fn default_quests() -> Vec<Quest> {
    use QuestCategory::*;

    vec![
        Quest::new("pick_up_10", "Pick Up 10 Items", "Collect 10 pieces of litter on a cleanup", 100, Cleanup),
        Quest::new("join_mission", "Join a Mission", "Sign up for any cleanup mission", 50, Cleanup),
        Quest::new("report_hotspot", "Report a Hotspot", "Report a littered area with a photo", 75, Reporting),
        Quest::new("invite_friend", "Invite a Friend", "Send an invite to someone new", 50, Social),
        Quest::new("share_impact", "Share Your Impact", "Share a mission result", 25, Social),
        Quest::new("read_news", "Stay Informed", "Read an article in the news feed", 25, Engagement),
        Quest::new("check_in", "Daily Check-In", "Open the app and check your progress", 10, Engagement),
    ]
}

/// Quest progress for the current window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyQuestState {
    pub quests: Vec<Quest>,
    pub xp_earned_today: u32,
    pub last_reset: DateTime<Utc>,
}

impl DailyQuestState {
    fn fresh(catalog: &QuestCatalog, now: DateTime<Utc>) -> Self {
        Self {
            quests: catalog.quests().to_vec(),
            xp_earned_today: 0,
            last_reset: now,
        }
    }
}

/// Enforces the per-window quest XP cap
pub struct DailyQuestTracker {
    catalog: Arc<QuestCatalog>,
    state: DailyQuestState,
    daily_cap: u32,
    window: Duration,
    store: SharedStore,
    clock: SharedClock,
    keys: StorageKeys,
}

impl DailyQuestTracker {
    /// Load quest progress from storage, then apply any pending reset
    pub fn load(
        store: SharedStore,
        clock: SharedClock,
        catalog: Arc<QuestCatalog>,
        config: &EngineConfig,
    ) -> Self {
        let now = clock.now();
        let keys = config.storage_keys.clone();
        let state = load_state(&store, &keys, &catalog, config.daily_xp_cap)
            .unwrap_or_else(|| DailyQuestState::fresh(&catalog, now));

        let mut tracker = Self {
            catalog,
            state,
            daily_cap: config.daily_xp_cap,
            window: config.reset_window(),
            store,
            clock,
            keys,
        };
        if !tracker.check_and_reset() {
            tracker.persist();
        }
        tracker
    }

    /// Reset if the window has expired. Returns true if a reset happened.
    ///
    /// A reset time in the future (clock skew or a bad stored value) also
    /// starts a new window.
    pub fn check_and_reset(&mut self) -> bool {
        let now = self.clock.now();
        let elapsed = now - self.state.last_reset;
        if elapsed > self.window {
            log::info!("Daily quest window expired, resetting");
        } else if elapsed < Duration::zero() {
            log::warn!("Daily reset time {} is in the future, resetting", self.state.last_reset);
        } else {
            return false;
        }
        self.reset_at(now);
        true
    }

    /// Start a new window now, regardless of elapsed time
    pub fn reset(&mut self) {
        log::info!("Daily quests reset manually");
        let now = self.clock.now();
        self.reset_at(now);
    }

    fn reset_at(&mut self, now: DateTime<Utc>) {
        self.state = DailyQuestState::fresh(&self.catalog, now);
        self.persist();
    }

    /// Complete a quest, returning the XP granted (0 if refused)
    pub fn complete_quest(&mut self, id: &str) -> u32 {
        self.check_and_reset();

        let remaining = self.daily_cap.saturating_sub(self.state.xp_earned_today);
        let Some(quest) = self.state.quests.iter_mut().find(|q| q.id == id) else {
            log::debug!("Unknown quest {}", id);
            return 0;
        };
        if quest.completed {
            log::debug!("Quest {} already completed", id);
            return 0;
        }
        if quest.xp_value > remaining {
            log::info!(
                "Quest {} worth {} XP exceeds remaining daily allowance {}",
                id,
                quest.xp_value,
                remaining
            );
            return 0;
        }

        quest.completed = true;
        let xp = quest.xp_value;
        self.state.xp_earned_today += xp;
        log::info!("Quest {} completed, {}/{} daily XP", id, self.state.xp_earned_today, self.daily_cap);

        self.persist();
        xp
    }

    pub fn quests(&mut self) -> &[Quest] {
        self.check_and_reset();
        &self.state.quests
    }

    pub fn state(&mut self) -> &DailyQuestState {
        self.check_and_reset();
        &self.state
    }

    pub fn xp_earned_today(&mut self) -> u32 {
        self.check_and_reset();
        self.state.xp_earned_today
    }

    /// XP that can still be earned this window
    pub fn remaining_allowance(&mut self) -> u32 {
        self.check_and_reset();
        self.daily_cap.saturating_sub(self.state.xp_earned_today)
    }

    /// Percent of the daily cap already earned
    pub fn progress_percent(&mut self) -> u8 {
        self.check_and_reset();
        if self.daily_cap == 0 {
            return 100;
        }
        let percent = (100.0 * self.state.xp_earned_today as f64 / self.daily_cap as f64).round();
        percent.clamp(0.0, 100.0) as u8
    }

    /// Time left in the current window
    pub fn time_until_reset(&self) -> Duration {
        let remaining = self.state.last_reset + self.window - self.clock.now();
        remaining.max(Duration::zero())
    }

    pub fn daily_cap(&self) -> u32 {
        self.daily_cap
    }

    fn persist(&self) {
        match serde_json::to_string(&self.state.quests) {
            Ok(json) => {
                if let Err(e) = self.store.set(&self.keys.daily_quests, &json) {
                    log::error!("Failed to save daily quests: {}", e);
                }
            }
            Err(e) => log::error!("Failed to serialize daily quests: {}", e),
        }

        let last_reset = self.state.last_reset.timestamp_millis().to_string();
        if let Err(e) = self.store.set(&self.keys.daily_last_reset, &last_reset) {
            log::error!("Failed to save daily reset time: {}", e);
        }

        let earned = self.state.xp_earned_today.to_string();
        if let Err(e) = self.store.set(&self.keys.daily_xp_earned, &earned) {
            log::error!("Failed to save daily XP: {}", e);
        }
    }
}

/// Read the three quest keys. `None` means start a fresh window.
fn load_state(
    store: &SharedStore,
    keys: &StorageKeys,
    catalog: &QuestCatalog,
    daily_cap: u32,
) -> Option<DailyQuestState> {
    let read = |key: &str| match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Failed to read {}: {}", key, e);
            None
        }
    };

    let raw_reset = read(keys.daily_last_reset.as_str())?;
    let last_reset = match raw_reset.trim().parse::<i64>().ok().and_then(DateTime::from_timestamp_millis) {
        Some(instant) => instant,
        None => {
            log::warn!("Invalid daily reset time {:?}, starting fresh", raw_reset);
            return None;
        }
    };

    let completed: HashSet<String> = match read(keys.daily_quests.as_str()) {
        Some(json) => match serde_json::from_str::<Vec<Quest>>(&json) {
            Ok(stored) => stored.into_iter().filter(|q| q.completed).map(|q| q.id).collect(),
            Err(e) => {
                log::warn!("Failed to parse daily quests: {}, starting fresh", e);
                return None;
            }
        },
        None => HashSet::new(),
    };

    let quests: Vec<Quest> = catalog
        .quests()
        .iter()
        .map(|q| Quest {
            completed: completed.contains(&q.id),
            ..q.clone()
        })
        .collect();

    let earned = read(keys.daily_xp_earned.as_str())
        .and_then(|s| s.trim().parse::<u32>().ok())
        .unwrap_or(0);
    if earned > daily_cap {
        log::warn!("Stored daily XP {} exceeds cap {}, clamping", earned, daily_cap);
    }

    Some(DailyQuestState {
        quests,
        xp_earned_today: earned.min(daily_cap),
        last_reset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::save::{KeyValueStore, MemoryStore, StorageError};

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Io { key: key.to_string(), source: std::io::Error::other("unavailable") })
        }
        fn set(&self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io { key: key.to_string(), source: std::io::Error::other("unavailable") })
        }
        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    const START: i64 = 1_700_000_000_000;

    fn catalog() -> Arc<QuestCatalog> {
        Arc::new(
            QuestCatalog::new(vec![
                Quest::new("big", "Big", "", 50, QuestCategory::Cleanup),
                Quest::new("small", "Small", "", 20, QuestCategory::Social),
                Quest::new("tiny", "Tiny", "", 5, QuestCategory::Engagement),
            ])
            .unwrap(),
        )
    }

    fn tracker_with(store: SharedStore, clock: Arc<ManualClock>) -> DailyQuestTracker {
        DailyQuestTracker::load(store, clock, catalog(), &EngineConfig::default())
    }

    fn setup() -> (SharedStore, Arc<ManualClock>, DailyQuestTracker) {
        let store: SharedStore = MemoryStore::shared();
        let clock = Arc::new(ManualClock::at_millis(START));
        let tracker = tracker_with(store.clone(), clock.clone());
        (store, clock, tracker)
    }

    #[test]
    fn test_fresh_tracker_persists_layout() {
        let (store, _clock, mut tracker) = setup();
        assert_eq!(tracker.xp_earned_today(), 0);
        assert!(tracker.quests().iter().all(|q| !q.completed));

        assert_eq!(store.get("pear.daily_quests.last_reset").unwrap().as_deref(), Some("1700000000000"));
        assert_eq!(store.get("pear.daily_quests.xp_earned").unwrap().as_deref(), Some("0"));
        let quests: Vec<Quest> = serde_json::from_str(&store.get("pear.daily_quests").unwrap().unwrap()).unwrap();
        assert_eq!(quests.len(), 3);
    }

    #[test]
    fn test_complete_quest_grants_xp() {
        let (_store, _clock, mut tracker) = setup();
        assert_eq!(tracker.complete_quest("big"), 50);
        assert_eq!(tracker.xp_earned_today(), 50);
        assert_eq!(tracker.remaining_allowance(), 250);
        assert!(tracker.quests().iter().find(|q| q.id == "big").unwrap().completed);
    }

    #[test]
    fn test_unknown_and_repeat_quests_grant_nothing() {
        let (_store, _clock, mut tracker) = setup();
        assert_eq!(tracker.complete_quest("nope"), 0);

        assert_eq!(tracker.complete_quest("small"), 20);
        let before = tracker.state().clone();
        assert_eq!(tracker.complete_quest("small"), 0);
        assert_eq!(tracker.state(), &before);
    }

    #[test]
    fn test_daily_cap_is_all_or_nothing() {
        let store: SharedStore = MemoryStore::shared();
        store.set("pear.daily_quests.last_reset", &START.to_string()).unwrap();
        store.set("pear.daily_quests.xp_earned", "280").unwrap();
        let clock = Arc::new(ManualClock::at_millis(START + 1000));
        let mut tracker = tracker_with(store.clone(), clock);

        assert_eq!(tracker.xp_earned_today(), 280);
        assert_eq!(tracker.complete_quest("big"), 0);
        assert_eq!(tracker.xp_earned_today(), 280);
        assert!(!tracker.quests().iter().find(|q| q.id == "big").unwrap().completed);

        assert_eq!(tracker.complete_quest("small"), 20);
        assert_eq!(tracker.xp_earned_today(), 300);
        assert_eq!(tracker.remaining_allowance(), 0);
        assert_eq!(tracker.progress_percent(), 100);
        assert_eq!(tracker.complete_quest("tiny"), 0);
        assert_eq!(store.get("pear.daily_quests.xp_earned").unwrap().as_deref(), Some("300"));
    }

    #[test]
    fn test_resets_after_window() {
        let (_store, clock, mut tracker) = setup();
        tracker.complete_quest("big");
        tracker.complete_quest("small");

        clock.advance(Duration::hours(24));
        assert!(!tracker.check_and_reset());
        assert_eq!(tracker.xp_earned_today(), 70);

        clock.advance(Duration::milliseconds(1));
        assert_eq!(tracker.xp_earned_today(), 0);
        assert!(tracker.quests().iter().all(|q| !q.completed));
        assert_eq!(tracker.state().last_reset, clock.now());
        assert_eq!(tracker.complete_quest("big"), 50);
    }

    #[test]
    fn test_stale_storage_resets_on_load() {
        let (store, clock, mut tracker) = setup();
        tracker.complete_quest("big");
        drop(tracker);

        clock.advance(Duration::hours(30));
        let mut reloaded = tracker_with(store.clone(), clock);
        assert_eq!(reloaded.xp_earned_today(), 0);
        assert_eq!(store.get("pear.daily_quests.xp_earned").unwrap().as_deref(), Some("0"));
    }

    #[test]
    fn test_future_reset_time_starts_new_window() {
        let store: SharedStore = MemoryStore::shared();
        let future = START + Duration::days(10).num_milliseconds();
        store.set("pear.daily_quests.last_reset", &future.to_string()).unwrap();
        store.set("pear.daily_quests.xp_earned", "300").unwrap();
        let clock = Arc::new(ManualClock::at_millis(START));

        let mut tracker = tracker_with(store.clone(), clock.clone());
        assert_eq!(tracker.xp_earned_today(), 0);
        assert_eq!(tracker.remaining_allowance(), 300);
        assert_eq!(tracker.state().last_reset, clock.now());
        assert_eq!(
            store.get("pear.daily_quests.last_reset").unwrap().as_deref(),
            Some(START.to_string().as_str())
        );
    }

    #[test]
    fn test_clock_moving_backwards_starts_new_window() {
        let (_store, clock, mut tracker) = setup();
        assert_eq!(tracker.complete_quest("big"), 50);

        clock.advance(Duration::hours(-3));
        assert_eq!(tracker.xp_earned_today(), 0);
        assert_eq!(tracker.complete_quest("big"), 50);
    }

    #[test]
    fn test_storage_failure_keeps_memory_state() {
        let clock = Arc::new(ManualClock::at_millis(START));
        let mut tracker =
            DailyQuestTracker::load(Arc::new(FailingStore), clock, catalog(), &EngineConfig::default());
        assert_eq!(tracker.xp_earned_today(), 0);
        assert!(tracker.quests().iter().all(|q| !q.completed));

        assert_eq!(tracker.complete_quest("big"), 50);
        assert_eq!(tracker.xp_earned_today(), 50);
        assert_eq!(tracker.complete_quest("big"), 0);
        assert_eq!(tracker.time_until_reset(), Duration::hours(24));
    }

    #[test]
    fn test_manual_reset() {
        let (_store, clock, mut tracker) = setup();
        tracker.complete_quest("big");
        clock.advance(Duration::hours(1));
        tracker.reset();
        assert_eq!(tracker.xp_earned_today(), 0);
        assert_eq!(tracker.time_until_reset(), Duration::hours(24));
    }

    #[test]
    fn test_reload_keeps_progress() {
        let (store, clock, mut tracker) = setup();
        tracker.complete_quest("small");
        clock.advance(Duration::hours(2));

        let mut reloaded = tracker_with(store, clock);
        assert_eq!(reloaded.xp_earned_today(), 20);
        assert_eq!(reloaded.complete_quest("small"), 0);
        assert_eq!(reloaded.time_until_reset(), Duration::hours(22));
    }

    #[test]
    fn test_reload_reconciles_with_catalog() {
        let store: SharedStore = MemoryStore::shared();
        let stored = vec![
            Quest { completed: true, ..Quest::new("big", "Big", "", 50, QuestCategory::Cleanup) },
            Quest { completed: true, ..Quest::new("retired", "Old", "", 10, QuestCategory::Social) },
        ];
        store.set("pear.daily_quests", &serde_json::to_string(&stored).unwrap()).unwrap();
        store.set("pear.daily_quests.last_reset", &START.to_string()).unwrap();
        store.set("pear.daily_quests.xp_earned", "9999").unwrap();

        let mut tracker = tracker_with(store, Arc::new(ManualClock::at_millis(START)));
        let ids: Vec<_> = tracker.quests().iter().map(|q| (q.id.clone(), q.completed)).collect();
        assert_eq!(
            ids,
            vec![("big".to_string(), true), ("small".to_string(), false), ("tiny".to_string(), false)]
        );
        assert_eq!(tracker.xp_earned_today(), 300);
    }

    #[test]
    fn test_corrupt_storage_starts_fresh() {
        let store: SharedStore = MemoryStore::shared();
        store.set("pear.daily_quests", "[{").unwrap();
        store.set("pear.daily_quests.last_reset", &START.to_string()).unwrap();
        store.set("pear.daily_quests.xp_earned", "100").unwrap();

        let mut tracker = tracker_with(store.clone(), Arc::new(ManualClock::at_millis(START + 5)));
        assert_eq!(tracker.xp_earned_today(), 0);
        assert_eq!(
            store.get("pear.daily_quests.last_reset").unwrap().as_deref(),
            Some((START + 5).to_string().as_str())
        );

        store.set("pear.daily_quests.last_reset", "yesterday").unwrap();
        let tracker = tracker_with(store, Arc::new(ManualClock::at_millis(START + 9)));
        assert_eq!(tracker.time_until_reset(), Duration::hours(24));
    }

    #[test]
    fn test_catalog_rejects_duplicates() {
        let result = QuestCatalog::new(vec![
            Quest::new("a", "A", "", 1, QuestCategory::Cleanup),
            Quest::new("a", "A again", "", 1, QuestCategory::Social),
        ]);
        assert_eq!(result, Err(QuestCatalogError::DuplicateId("a".into())));
    }

    #[test]
    fn test_catalog_clears_completed_flags() {
        let done = Quest { completed: true, ..Quest::new("a", "A", "", 1, QuestCategory::Reporting) };
        let catalog = QuestCatalog::new(vec![done]).unwrap();
        assert!(!catalog.quests()[0].completed);
        assert_eq!(catalog.by_category(QuestCategory::Reporting).len(), 1);
        assert!(catalog.find("a").is_some());
    }

    #[test]
    fn test_default_catalog_exceeds_cap() {
        let total: u32 = QuestCatalog::default().quests().iter().map(|q| q.xp_value).sum();
        assert!(total > EngineConfig::default().daily_xp_cap);
    }
}

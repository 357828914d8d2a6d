//! Progression systems

pub mod levels;
pub mod badges;
pub mod ledger;
pub mod quests;
pub mod session;

pub use levels::{Level, LevelTable, LevelTableError, LevelProgress, default_levels};
pub use badges::{Badge, BadgeRequirement, default_badges};
pub use ledger::{XpLedger, XpState, XpOutcome, RewardEntry, Period};
pub use quests::{Quest, QuestCategory, QuestCatalog, QuestCatalogError, DailyQuestTracker, DailyQuestState, default_quests};
pub use session::{ProgressSession, ProgressSnapshot};

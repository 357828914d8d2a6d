//! PEAR - XP and leveling engine
//!
//! Cleanup missions and daily quests earn XP, XP unlocks levels and badges,
//! and everything persists to local key-value storage.

pub mod clock;
pub mod config;
pub mod data;
pub mod events;
pub mod progression;
pub mod save;

// Re-export commonly used types
pub use config::EngineConfig;
pub use data::DataManager;
pub use events::{EventSink, ProgressEvent};
pub use progression::{ProgressSession, LevelTable, Level, Quest};

//! Progression events
//!
//! The engine reports level-ups, badge unlocks and quest completions through
//! an [`EventSink`]. Delivery is fire-and-forget.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::progression::{Badge, Level};

/// Something the notification layer may want to surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    XpAwarded { amount: u32, source: String, total_xp: u32 },
    LevelUp { level: Level },
    BadgeUnlocked { badge: Badge },
    QuestCompleted { quest_id: String, xp: u32 },
}

impl ProgressEvent {
    /// Short human-readable line for logs and notifications
    pub fn message(&self) -> String {
        match self {
            ProgressEvent::XpAwarded { amount, source, .. } => format!("+{} XP ({})", amount, source),
            ProgressEvent::LevelUp { level } => {
                format!("Level up! You are now level {}: {}", level.level, level.title)
            }
            ProgressEvent::BadgeUnlocked { badge } => format!("Badge unlocked: {}", badge.name),
            ProgressEvent::QuestCompleted { quest_id, xp } => {
                format!("Quest {} complete, +{} XP", quest_id, xp)
            }
        }
    }
}

/// Receiver for progression events
pub trait EventSink: Send {
    fn emit(&mut self, event: ProgressEvent);
}

/// Writes events to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&mut self, event: ProgressEvent) {
        log::info!("{}", event.message());
    }
}

/// Buffers events until the presentation layer drains them
#[derive(Debug, Default, Clone)]
pub struct EventQueue {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all buffered events, oldest first
    pub fn drain(&self) -> Vec<ProgressEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for EventQueue {
    fn emit(&mut self, event: ProgressEvent) {
        log::debug!("Queued event: {}", event.message());
        self.events.lock().push(event);
    }
}

//! Data loading and external content
//!
//! Level tiers, the daily quest catalog and badges are loaded from RON files
//! so they can be tuned without a rebuild.

pub mod loader;

pub use loader::{DataManager, export_default_data};

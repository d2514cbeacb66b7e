//! Feature extraction
//!
//! Converts historical match outcomes into model-ready features.

pub mod history;
pub mod match_repr;
pub mod team_stats;

pub use history::{TeamHistoryIndex, TeamKey};
pub use match_repr::MatchFeatures;
pub use team_stats::{HeadToHead, PerformanceStats, WinRecord, NEUTRAL_WIN_RATE};

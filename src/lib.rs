//! Cadence: a local activity-tracking engine.
//!
//! A background collector feeds per-minute usage counters and a focus
//! session lifecycle into an embedded SQLite store; the engine derives
//! daily rollups, focus/productivity scores and achievement unlocks
//! from them. One logical writer at a time, snapshot reads, and
//! idempotent operations throughout.

pub mod categorize;
pub mod constants;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod time;

#[cfg(test)]
mod test_utils;

pub use crate::categorize::Category;
pub use crate::engine::{
    AchievementDef, AchievementEvaluator, AchievementStatus, AppRegistry, CounterStore, Engine,
    Requirement, RollupAggregator, SampleStore, SessionManager, TopApp, CATALOG,
};
pub use crate::error::EngineError;
pub use crate::models::{
    App, ClickPoint, CounterDeltas, CounterTotals, DailyRollup, EarnedAchievement, FocusSession,
    KeycodeCount, MinuteCounter, SampleItem, SampleKind, SamplePayload,
};

use crate::db::{safe_lock, SharedDatabase};
use crate::error::EngineError;
use crate::models::{CounterDeltas, CounterTotals, MinuteCounter};
use crate::time::align_to_minute;

/// Per-minute, per-app usage counters. All writes funnel through
/// [`CounterStore::merge`], a single atomic upsert.
pub struct CounterStore {
    db: SharedDatabase,
}

impl CounterStore {
    pub(crate) fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    /// Add deltas to the row for the minute containing `timestamp`,
    /// creating it if absent. Deltas are trusted non-negative.
    pub fn merge(&self, timestamp: i64, app_id: i64, deltas: &CounterDeltas) -> Result<(), EngineError> {
        let minute = align_to_minute(timestamp);
        let db = safe_lock(&self.db, "counter store");
        MinuteCounter::merge(db.connection(), minute, app_id, deltas)?;
        Ok(())
    }

    /// Element-wise totals over `[start, end)`, optionally filtered by
    /// app. An inverted range yields zero totals, not an error.
    pub fn sum_range(
        &self,
        start: i64,
        end: i64,
        app_id: Option<i64>,
    ) -> Result<CounterTotals, EngineError> {
        let db = safe_lock(&self.db, "counter store");
        Ok(MinuteCounter::sum_range(db.connection(), start, end, app_id)?)
    }

    /// Per-minute rows ordered by timestamp, for timeline reconstruction.
    pub fn rows_between(&self, start: i64, end: i64) -> Result<Vec<MinuteCounter>, EngineError> {
        let db = safe_lock(&self.db, "counter store");
        Ok(MinuteCounter::rows_between(db.connection(), start, end)?)
    }
}

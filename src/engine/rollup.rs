use chrono::{Local, NaiveDate, TimeZone, Timelike};
use log::debug;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::constants::TOP_APPS_LIMIT;
use crate::db::{safe_lock, SharedDatabase};
use crate::error::EngineError;
use crate::models::{App, DailyRollup, FocusSession, MinuteCounter};
use crate::time::{datetime_in, day_bounds_in};

/// One entry of a rollup's serialized top-app summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopApp {
    pub bundle_id: String,
    pub display_name: String,
    pub active_secs: i64,
}

/// Recomputes full daily summaries from the counter and session tables.
/// The rollup row is a deterministic function of that state: aggregating
/// the same date twice with no intervening writes produces byte-identical
/// rows, and the write always replaces the whole row.
pub struct RollupAggregator {
    db: SharedDatabase,
}

impl RollupAggregator {
    pub(crate) fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    /// Aggregate one local calendar day.
    pub fn aggregate(&self, date: NaiveDate) -> Result<DailyRollup, EngineError> {
        self.aggregate_in(date, &Local)
    }

    /// Aggregate one calendar day in an explicit timezone. The compute
    /// and the replace-write share a transaction, so the row reflects a
    /// single consistent snapshot.
    pub fn aggregate_in<Tz: TimeZone>(
        &self,
        date: NaiveDate,
        tz: &Tz,
    ) -> Result<DailyRollup, EngineError> {
        let mut db = safe_lock(&self.db, "rollup aggregator");
        let tx = db.connection_mut().transaction()?;
        let rollup = build_rollup(&tx, date, tz)?;
        DailyRollup::replace(&tx, &rollup)?;
        tx.commit()?;
        debug!("aggregated rollup for {date}");
        Ok(rollup)
    }

    /// Aggregate every date in `[first, last]`, for backfill after
    /// retention pruning or a timezone move.
    pub fn aggregate_range(
        &self,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Vec<DailyRollup>, EngineError> {
        self.aggregate_range_in(first, last, &Local)
    }

    pub fn aggregate_range_in<Tz: TimeZone>(
        &self,
        first: NaiveDate,
        last: NaiveDate,
        tz: &Tz,
    ) -> Result<Vec<DailyRollup>, EngineError> {
        let mut rollups = Vec::new();
        let mut date = first;
        while date <= last {
            rollups.push(self.aggregate_in(date, tz)?);
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
        Ok(rollups)
    }

    pub fn find_by_date(&self, date: NaiveDate) -> Result<Option<DailyRollup>, EngineError> {
        let db = safe_lock(&self.db, "rollup aggregator");
        Ok(DailyRollup::find_by_date(db.connection(), &date.to_string())?)
    }

    /// Stored rollup rows for `[first, last]`; dates never aggregated
    /// are absent, not zero.
    pub fn find_range(
        &self,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Vec<DailyRollup>, EngineError> {
        let db = safe_lock(&self.db, "rollup aggregator");
        Ok(DailyRollup::find_range(
            db.connection(),
            &first.to_string(),
            &last.to_string(),
        )?)
    }
}

fn build_rollup<Tz: TimeZone>(
    conn: &Connection,
    date: NaiveDate,
    tz: &Tz,
) -> Result<DailyRollup, EngineError> {
    let (day_start, day_end) = day_bounds_in(date, tz);

    let totals = MinuteCounter::sum_range(conn, day_start, day_end, None)?;
    let bounds = MinuteCounter::activity_bounds(conn, day_start, day_end)?;
    let focus_secs = focus_secs_within(conn, day_start, day_end)?;
    let non_distraction = MinuteCounter::non_distraction_active_secs(conn, day_start, day_end)?;

    // zero-guards: a day without activity scores 0, never NaN
    let focus_score = if totals.active_secs > 0 {
        (100 * focus_secs / totals.active_secs).min(100)
    } else {
        0
    };
    let productivity_score = if totals.active_secs > 0 {
        100 * non_distraction / totals.active_secs
    } else {
        0
    };

    let top_apps = top_apps(conn, day_start, day_end)?;
    let hourly = hourly_histogram(conn, day_start, day_end, tz)?;

    Ok(DailyRollup {
        date: date.to_string(),
        active_secs: totals.active_secs,
        focus_secs,
        keystrokes: totals.keystrokes,
        clicks: totals.clicks,
        scroll_units: totals.scroll_units,
        first_activity: bounds.map(|(first, _)| first),
        last_activity: bounds.map(|(_, last)| last),
        focus_score,
        productivity_score,
        top_apps: serde_json::to_string(&top_apps)?,
        hourly: serde_json::to_string(&hourly)?,
    })
}

/// Sum the overlap of every closed session intersecting the day. A
/// session spanning midnight contributes only the portion inside the
/// bounds. Open sessions are excluded: their contribution would depend
/// on when the aggregation ran.
fn focus_secs_within(conn: &Connection, day_start: i64, day_end: i64) -> Result<i64, EngineError> {
    let mut focus_secs = 0;
    for session in FocusSession::overlapping(conn, day_start, day_end)? {
        let Some(ended_at) = session.ended_at else { continue };
        let overlap = ended_at.min(day_end) - session.started_at.max(day_start);
        focus_secs += overlap.max(0);
    }
    Ok(focus_secs)
}

fn top_apps(conn: &Connection, day_start: i64, day_end: i64) -> Result<Vec<TopApp>, EngineError> {
    let per_app = MinuteCounter::active_secs_by_app(conn, day_start, day_end)?;
    let mut top = Vec::with_capacity(TOP_APPS_LIMIT);
    for (app_id, active_secs) in per_app.into_iter().take(TOP_APPS_LIMIT) {
        let Some(app) = App::find_by_id(conn, app_id)? else { continue };
        top.push(TopApp {
            bundle_id: app.bundle_id,
            display_name: app.display_name,
            active_secs,
        });
    }
    Ok(top)
}

fn hourly_histogram<Tz: TimeZone>(
    conn: &Connection,
    day_start: i64,
    day_end: i64,
    tz: &Tz,
) -> Result<[i64; 24], EngineError> {
    let mut histogram = [0i64; 24];
    for row in MinuteCounter::rows_between(conn, day_start, day_end)? {
        let hour = datetime_in(row.minute, tz).hour() as usize;
        if let Some(slot) = histogram.get_mut(hour) {
            *slot += row.active_secs;
        }
    }
    Ok(histogram)
}

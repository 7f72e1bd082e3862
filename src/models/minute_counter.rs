use rusqlite::{params, Connection, Result, Row};

/// Non-negative increments supplied by the capture source. Negative
/// values are a caller bug; the engine does not validate them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterDeltas {
    pub keystrokes: i64,
    pub clicks: i64,
    pub scroll_units: i64,
    pub pointer_distance: i64,
    pub active_secs: i64,
    pub idle_secs: i64,
}

/// Element-wise sums over a range of counter rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterTotals {
    pub keystrokes: i64,
    pub clicks: i64,
    pub scroll_units: i64,
    pub pointer_distance: i64,
    pub active_secs: i64,
    pub idle_secs: i64,
}

/// Usage-metric row keyed by (minute-aligned timestamp, app id).
/// Fields only ever grow; merge adds, nothing subtracts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinuteCounter {
    pub minute: i64,
    pub app_id: i64,
    pub keystrokes: i64,
    pub clicks: i64,
    pub scroll_units: i64,
    pub pointer_distance: i64,
    pub active_secs: i64,
    pub idle_secs: i64,
}

impl MinuteCounter {
    fn from_row(row: &Row<'_>) -> Result<Self> {
        Ok(Self {
            minute: row.get(0)?,
            app_id: row.get(1)?,
            keystrokes: row.get(2)?,
            clicks: row.get(3)?,
            scroll_units: row.get(4)?,
            pointer_distance: row.get(5)?,
            active_secs: row.get(6)?,
            idle_secs: row.get(7)?,
        })
    }

    /// Atomically add deltas to the row for `(minute, app_id)`, creating
    /// it if absent. A single upsert statement, so concurrent merges
    /// cannot lose increments to a read-then-write race.
    pub fn merge(conn: &Connection, minute: i64, app_id: i64, deltas: &CounterDeltas) -> Result<()> {
        conn.execute(
            "INSERT INTO minute_counters
                 (minute, app_id, keystrokes, clicks, scroll_units,
                  pointer_distance, active_secs, idle_secs)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(minute, app_id) DO UPDATE SET
                 keystrokes = keystrokes + excluded.keystrokes,
                 clicks = clicks + excluded.clicks,
                 scroll_units = scroll_units + excluded.scroll_units,
                 pointer_distance = pointer_distance + excluded.pointer_distance,
                 active_secs = active_secs + excluded.active_secs,
                 idle_secs = idle_secs + excluded.idle_secs",
            params![
                minute,
                app_id,
                deltas.keystrokes,
                deltas.clicks,
                deltas.scroll_units,
                deltas.pointer_distance,
                deltas.active_secs,
                deltas.idle_secs,
            ],
        )?;
        Ok(())
    }

    /// Element-wise sums over `[start, end)`, optionally filtered by app.
    /// An empty or inverted range yields all-zero totals.
    pub fn sum_range(
        conn: &Connection,
        start: i64,
        end: i64,
        app_id: Option<i64>,
    ) -> Result<CounterTotals> {
        let sql = "SELECT COALESCE(SUM(keystrokes), 0), COALESCE(SUM(clicks), 0),
                          COALESCE(SUM(scroll_units), 0), COALESCE(SUM(pointer_distance), 0),
                          COALESCE(SUM(active_secs), 0), COALESCE(SUM(idle_secs), 0)
                   FROM minute_counters
                   WHERE minute >= ?1 AND minute < ?2
                     AND (?3 IS NULL OR app_id = ?3)";
        conn.query_row(sql, params![start, end, app_id], |row| {
            Ok(CounterTotals {
                keystrokes: row.get(0)?,
                clicks: row.get(1)?,
                scroll_units: row.get(2)?,
                pointer_distance: row.get(3)?,
                active_secs: row.get(4)?,
                idle_secs: row.get(5)?,
            })
        })
    }

    /// Per-minute rows in `[start, end)` ordered by timestamp, for
    /// timeline reconstruction and hour bucketing.
    pub fn rows_between(conn: &Connection, start: i64, end: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT minute, app_id, keystrokes, clicks, scroll_units,
                    pointer_distance, active_secs, idle_secs
             FROM minute_counters
             WHERE minute >= ?1 AND minute < ?2
             ORDER BY minute, app_id",
        )?;
        let rows = stmt.query_map(params![start, end], Self::from_row)?;
        rows.collect()
    }

    /// First and last row minute in `[start, end)`, if any rows exist.
    pub fn activity_bounds(conn: &Connection, start: i64, end: i64) -> Result<Option<(i64, i64)>> {
        conn.query_row(
            "SELECT MIN(minute), MAX(minute) FROM minute_counters
             WHERE minute >= ?1 AND minute < ?2",
            params![start, end],
            |row| {
                let first: Option<i64> = row.get(0)?;
                let last: Option<i64> = row.get(1)?;
                Ok(first.zip(last))
            },
        )
    }

    /// Presence check: any counter row at all in `[start, end)`.
    pub fn has_activity_between(conn: &Connection, start: i64, end: i64) -> Result<bool> {
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM minute_counters WHERE minute >= ?1 AND minute < ?2)",
            params![start, end],
            |row| row.get(0),
        )
    }

    /// Count of distinct minutes in `[start, end)` with nonzero active time.
    pub fn active_minute_count(conn: &Connection, start: i64, end: i64) -> Result<i64> {
        conn.query_row(
            "SELECT COUNT(DISTINCT minute) FROM minute_counters
             WHERE minute >= ?1 AND minute < ?2 AND active_secs > 0",
            params![start, end],
            |row| row.get(0),
        )
    }

    /// Distinct row minutes in `[start, end)`, ascending.
    pub fn distinct_minutes_between(conn: &Connection, start: i64, end: i64) -> Result<Vec<i64>> {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT minute FROM minute_counters
             WHERE minute >= ?1 AND minute < ?2 ORDER BY minute",
        )?;
        let rows = stmt.query_map(params![start, end], |row| row.get(0))?;
        rows.collect()
    }

    /// Active seconds per app over `[start, end)`, most active first.
    /// Ties break on app id so the ordering is deterministic.
    pub fn active_secs_by_app(conn: &Connection, start: i64, end: i64) -> Result<Vec<(i64, i64)>> {
        let mut stmt = conn.prepare(
            "SELECT app_id, SUM(active_secs) AS total
             FROM minute_counters
             WHERE minute >= ?1 AND minute < ?2
             GROUP BY app_id
             ORDER BY total DESC, app_id",
        )?;
        let rows = stmt.query_map(params![start, end], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect()
    }

    /// Active seconds in `[start, end)` attributed to apps not flagged
    /// as distractions.
    pub fn non_distraction_active_secs(conn: &Connection, start: i64, end: i64) -> Result<i64> {
        conn.query_row(
            "SELECT COALESCE(SUM(mc.active_secs), 0)
             FROM minute_counters mc
             JOIN apps a ON a.id = mc.app_id
             WHERE mc.minute >= ?1 AND mc.minute < ?2 AND a.is_distraction = 0",
            params![start, end],
            |row| row.get(0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorize::Category;
    use crate::models::App;
    use crate::test_utils::setup_test_db;

    fn deltas(keystrokes: i64, clicks: i64, active_secs: i64) -> CounterDeltas {
        CounterDeltas { keystrokes, clicks, active_secs, ..CounterDeltas::default() }
    }

    fn test_app(conn: &Connection, bundle_id: &str) -> App {
        App::insert(conn, bundle_id, bundle_id, Category::Other, false).unwrap()
    }

    #[test]
    fn test_merge_creates_then_adds() {
        let db = setup_test_db();
        let conn = db.connection();
        let app = test_app(conn, "com.example.a");
        let minute = 1_700_000_040;

        MinuteCounter::merge(conn, minute, app.id, &deltas(10, 2, 30)).unwrap();
        MinuteCounter::merge(conn, minute, app.id, &deltas(5, 1, 30)).unwrap();

        let rows = MinuteCounter::rows_between(conn, minute, minute + 60).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].keystrokes, 15);
        assert_eq!(rows[0].clicks, 3);
        assert_eq!(rows[0].active_secs, 60);
    }

    #[test]
    fn test_merge_is_commutative() {
        let db = setup_test_db();
        let conn = db.connection();
        let a = test_app(conn, "com.example.a");
        let b = test_app(conn, "com.example.b");
        let minute = 1_700_000_040;

        let sequence = [(3, 0, 10), (7, 2, 20), (1, 1, 5)];
        for (k, c, s) in sequence {
            MinuteCounter::merge(conn, minute, a.id, &deltas(k, c, s)).unwrap();
        }
        for (k, c, s) in sequence.iter().rev() {
            MinuteCounter::merge(conn, minute, b.id, &deltas(*k, *c, *s)).unwrap();
        }

        let rows = MinuteCounter::rows_between(conn, minute, minute + 60).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].keystrokes, rows[1].keystrokes);
        assert_eq!(rows[0].clicks, rows[1].clicks);
        assert_eq!(rows[0].active_secs, rows[1].active_secs);
    }

    #[test]
    fn test_sum_range_with_app_filter() {
        let db = setup_test_db();
        let conn = db.connection();
        let a = test_app(conn, "com.example.a");
        let b = test_app(conn, "com.example.b");
        let minute = 1_700_000_040;

        MinuteCounter::merge(conn, minute, a.id, &deltas(10, 0, 60)).unwrap();
        MinuteCounter::merge(conn, minute, b.id, &deltas(4, 0, 30)).unwrap();

        let all = MinuteCounter::sum_range(conn, minute, minute + 60, None).unwrap();
        assert_eq!(all.keystrokes, 14);
        assert_eq!(all.active_secs, 90);

        let only_a = MinuteCounter::sum_range(conn, minute, minute + 60, Some(a.id)).unwrap();
        assert_eq!(only_a.keystrokes, 10);
    }

    #[test]
    fn test_inverted_range_yields_zero_totals() {
        let db = setup_test_db();
        let conn = db.connection();
        let app = test_app(conn, "com.example.a");
        MinuteCounter::merge(conn, 1_700_000_040, app.id, &deltas(10, 0, 60)).unwrap();

        let totals = MinuteCounter::sum_range(conn, 2_000_000_000, 1_000_000_000, None).unwrap();
        assert_eq!(totals, CounterTotals::default());
        assert!(MinuteCounter::rows_between(conn, 2_000_000_000, 1_000_000_000)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_activity_bounds() {
        let db = setup_test_db();
        let conn = db.connection();
        let app = test_app(conn, "com.example.a");

        assert!(MinuteCounter::activity_bounds(conn, 0, i64::MAX).unwrap().is_none());

        MinuteCounter::merge(conn, 1_700_000_040, app.id, &deltas(1, 0, 10)).unwrap();
        MinuteCounter::merge(conn, 1_700_003_640, app.id, &deltas(1, 0, 10)).unwrap();

        let bounds = MinuteCounter::activity_bounds(conn, 0, i64::MAX).unwrap();
        assert_eq!(bounds, Some((1_700_000_040, 1_700_003_640)));
    }

    #[test]
    fn test_presence_and_active_minute_count() {
        let db = setup_test_db();
        let conn = db.connection();
        let app = test_app(conn, "com.example.a");
        let minute = 1_700_000_040;

        assert!(!MinuteCounter::has_activity_between(conn, minute, minute + 60).unwrap());

        MinuteCounter::merge(conn, minute, app.id, &deltas(0, 0, 0)).unwrap();
        MinuteCounter::merge(conn, minute + 60, app.id, &deltas(0, 0, 45)).unwrap();

        assert!(MinuteCounter::has_activity_between(conn, minute, minute + 120).unwrap());
        // only the second minute has nonzero active time
        assert_eq!(MinuteCounter::active_minute_count(conn, minute, minute + 120).unwrap(), 1);
    }

    #[test]
    fn test_active_secs_by_app_orders_most_active_first() {
        let db = setup_test_db();
        let conn = db.connection();
        let a = test_app(conn, "com.example.a");
        let b = test_app(conn, "com.example.b");
        let minute = 1_700_000_040;

        MinuteCounter::merge(conn, minute, a.id, &deltas(0, 0, 30)).unwrap();
        MinuteCounter::merge(conn, minute, b.id, &deltas(0, 0, 60)).unwrap();

        let per_app = MinuteCounter::active_secs_by_app(conn, minute, minute + 60).unwrap();
        assert_eq!(per_app, vec![(b.id, 60), (a.id, 30)]);
    }

    #[test]
    fn test_non_distraction_active_secs() {
        let db = setup_test_db();
        let conn = db.connection();
        let work = test_app(conn, "com.example.work");
        let play = App::insert(conn, "com.example.play", "Play", Category::Entertainment, true)
            .unwrap();
        let minute = 1_700_000_040;

        MinuteCounter::merge(conn, minute, work.id, &deltas(0, 0, 40)).unwrap();
        MinuteCounter::merge(conn, minute, play.id, &deltas(0, 0, 20)).unwrap();

        let secs =
            MinuteCounter::non_distraction_active_secs(conn, minute, minute + 60).unwrap();
        assert_eq!(secs, 40);
    }
}

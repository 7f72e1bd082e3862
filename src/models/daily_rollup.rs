use rusqlite::{params, Connection, OptionalExtension, Result, Row};

/// Full-day derived summary keyed by local calendar date (`YYYY-MM-DD`).
/// Always written whole with replace semantics, never patched, so the
/// row is a pure function of the counters and sessions for its date.
/// `top_apps` and `hourly` are serialized JSON payloads the engine
/// treats as opaque once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyRollup {
    pub date: String,
    pub active_secs: i64,
    pub focus_secs: i64,
    pub keystrokes: i64,
    pub clicks: i64,
    pub scroll_units: i64,
    pub first_activity: Option<i64>,
    pub last_activity: Option<i64>,
    pub focus_score: i64,
    pub productivity_score: i64,
    pub top_apps: String,
    pub hourly: String,
}

impl DailyRollup {
    fn from_row(row: &Row<'_>) -> Result<Self> {
        Ok(Self {
            date: row.get(0)?,
            active_secs: row.get(1)?,
            focus_secs: row.get(2)?,
            keystrokes: row.get(3)?,
            clicks: row.get(4)?,
            scroll_units: row.get(5)?,
            first_activity: row.get(6)?,
            last_activity: row.get(7)?,
            focus_score: row.get(8)?,
            productivity_score: row.get(9)?,
            top_apps: row.get(10)?,
            hourly: row.get(11)?,
        })
    }

    pub fn replace(conn: &Connection, rollup: &Self) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO daily_rollups
                 (date, active_secs, focus_secs, keystrokes, clicks, scroll_units,
                  first_activity, last_activity, focus_score, productivity_score,
                  top_apps, hourly)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                rollup.date,
                rollup.active_secs,
                rollup.focus_secs,
                rollup.keystrokes,
                rollup.clicks,
                rollup.scroll_units,
                rollup.first_activity,
                rollup.last_activity,
                rollup.focus_score,
                rollup.productivity_score,
                rollup.top_apps,
                rollup.hourly,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_date(conn: &Connection, date: &str) -> Result<Option<Self>> {
        conn.query_row(
            "SELECT date, active_secs, focus_secs, keystrokes, clicks, scroll_units,
                    first_activity, last_activity, focus_score, productivity_score,
                    top_apps, hourly
             FROM daily_rollups WHERE date = ?1",
            params![date],
            Self::from_row,
        )
        .optional()
    }

    /// Rollup rows for dates in `[first, last]`, ascending. Dates never
    /// aggregated are simply absent.
    pub fn find_range(conn: &Connection, first: &str, last: &str) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT date, active_secs, focus_secs, keystrokes, clicks, scroll_units,
                    first_activity, last_activity, focus_score, productivity_score,
                    top_apps, hourly
             FROM daily_rollups WHERE date >= ?1 AND date <= ?2 ORDER BY date",
        )?;
        let rows = stmt.query_map(params![first, last], Self::from_row)?;
        rows.collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    fn zero_rollup(date: &str) -> DailyRollup {
        DailyRollup {
            date: date.to_string(),
            active_secs: 0,
            focus_secs: 0,
            keystrokes: 0,
            clicks: 0,
            scroll_units: 0,
            first_activity: None,
            last_activity: None,
            focus_score: 0,
            productivity_score: 0,
            top_apps: "[]".to_string(),
            hourly: "[0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0]".to_string(),
        }
    }

    #[test]
    fn test_replace_inserts_then_overwrites() {
        let db = setup_test_db();
        let conn = db.connection();

        let mut rollup = zero_rollup("2024-03-15");
        DailyRollup::replace(conn, &rollup).unwrap();

        rollup.active_secs = 90;
        rollup.focus_score = 50;
        DailyRollup::replace(conn, &rollup).unwrap();

        let found = DailyRollup::find_by_date(conn, "2024-03-15").unwrap().unwrap();
        assert_eq!(found, rollup);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM daily_rollups", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_find_by_date_absent_returns_none() {
        let db = setup_test_db();
        assert!(DailyRollup::find_by_date(db.connection(), "1999-01-01").unwrap().is_none());
    }

    #[test]
    fn test_find_range_is_inclusive_and_ordered() {
        let db = setup_test_db();
        let conn = db.connection();

        for date in ["2024-03-14", "2024-03-15", "2024-03-17"] {
            DailyRollup::replace(conn, &zero_rollup(date)).unwrap();
        }

        let rows = DailyRollup::find_range(conn, "2024-03-14", "2024-03-16").unwrap();
        let dates: Vec<&str> = rows.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-03-14", "2024-03-15"]);
    }
}

use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use crate::constants::{DEEP_WORK_MAX_INTERRUPTIONS, DEEP_WORK_MIN_SECS};

/// A user-delimited deep-work interval. `ended_at` is null while the
/// session is open; at most one open row exists at any time, enforced
/// by the manager's transaction discipline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusSession {
    pub id: i64,
    pub started_at: i64,
    pub ended_at: Option<i64>,
    pub primary_app_id: Option<i64>,
    pub keystrokes: i64,
    pub clicks: i64,
    pub interruptions: i64,
}

impl FocusSession {
    fn from_row(row: &Row<'_>) -> Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            started_at: row.get(1)?,
            ended_at: row.get(2)?,
            primary_app_id: row.get(3)?,
            keystrokes: row.get(4)?,
            clicks: row.get(5)?,
            interruptions: row.get(6)?,
        })
    }

    pub fn duration_secs(&self) -> Option<i64> {
        self.ended_at.map(|end| end - self.started_at)
    }

    /// Deep work: at least 25 minutes with fewer than 3 interruptions.
    /// Open sessions are never deep work; the classification is post-hoc.
    pub fn is_deep_work(&self) -> bool {
        match self.duration_secs() {
            Some(duration) => {
                duration >= DEEP_WORK_MIN_SECS
                    && self.interruptions < DEEP_WORK_MAX_INTERRUPTIONS
            }
            None => false,
        }
    }

    pub fn insert_open(
        conn: &Connection,
        started_at: i64,
        primary_app_id: Option<i64>,
    ) -> Result<Self> {
        conn.execute(
            "INSERT INTO focus_sessions (started_at, primary_app_id) VALUES (?1, ?2)",
            params![started_at, primary_app_id],
        )?;
        Ok(Self {
            id: conn.last_insert_rowid(),
            started_at,
            ended_at: None,
            primary_app_id,
            keystrokes: 0,
            clicks: 0,
            interruptions: 0,
        })
    }

    pub fn find_active(conn: &Connection) -> Result<Option<Self>> {
        conn.query_row(
            "SELECT id, started_at, ended_at, primary_app_id, keystrokes, clicks, interruptions
             FROM focus_sessions WHERE ended_at IS NULL
             ORDER BY started_at DESC LIMIT 1",
            [],
            Self::from_row,
        )
        .optional()
    }

    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        conn.query_row(
            "SELECT id, started_at, ended_at, primary_app_id, keystrokes, clicks, interruptions
             FROM focus_sessions WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .optional()
    }

    /// Close the session, back-filling the derived input totals.
    pub fn close(
        conn: &Connection,
        id: i64,
        ended_at: i64,
        keystrokes: i64,
        clicks: i64,
    ) -> Result<()> {
        conn.execute(
            "UPDATE focus_sessions SET ended_at = ?1, keystrokes = ?2, clicks = ?3
             WHERE id = ?4",
            params![ended_at, keystrokes, clicks, id],
        )?;
        Ok(())
    }

    pub fn add_interruption(conn: &Connection, id: i64) -> Result<()> {
        conn.execute(
            "UPDATE focus_sessions SET interruptions = interruptions + 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    pub fn recent(conn: &Connection, limit: usize) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, started_at, ended_at, primary_app_id, keystrokes, clicks, interruptions
             FROM focus_sessions ORDER BY started_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], Self::from_row)?;
        rows.collect()
    }

    /// Closed sessions whose interval intersects `[start, end)`.
    pub fn overlapping(conn: &Connection, start: i64, end: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, started_at, ended_at, primary_app_id, keystrokes, clicks, interruptions
             FROM focus_sessions
             WHERE ended_at IS NOT NULL AND started_at < ?2 AND ended_at > ?1
             ORDER BY started_at",
        )?;
        let rows = stmt.query_map(params![start, end], Self::from_row)?;
        rows.collect()
    }

    pub fn completed_count(conn: &Connection) -> Result<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM focus_sessions WHERE ended_at IS NOT NULL",
            [],
            |row| row.get(0),
        )
    }

    pub fn longest_duration_secs(conn: &Connection) -> Result<i64> {
        conn.query_row(
            "SELECT COALESCE(MAX(ended_at - started_at), 0)
             FROM focus_sessions WHERE ended_at IS NOT NULL",
            [],
            |row| row.get(0),
        )
    }

    pub fn deep_work_count(conn: &Connection) -> Result<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM focus_sessions
             WHERE ended_at IS NOT NULL
               AND ended_at - started_at >= ?1
               AND interruptions < ?2",
            params![DEEP_WORK_MIN_SECS, DEEP_WORK_MAX_INTERRUPTIONS],
            |row| row.get(0),
        )
    }
}

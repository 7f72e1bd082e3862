use rusqlite::{params, Connection, OptionalExtension, Result};

/// Append-only unlock record. Existence of a row is the one-way gate:
/// an id present here is never evaluated or surfaced as new again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EarnedAchievement {
    pub achievement_id: String,
    pub earned_at: i64,
}

impl EarnedAchievement {
    pub fn exists(conn: &Connection, achievement_id: &str) -> Result<bool> {
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM earned_achievements WHERE achievement_id = ?1)",
            params![achievement_id],
            |row| row.get(0),
        )
    }

    pub fn insert(conn: &Connection, achievement_id: &str, earned_at: i64) -> Result<Self> {
        conn.execute(
            "INSERT INTO earned_achievements (achievement_id, earned_at) VALUES (?1, ?2)",
            params![achievement_id, earned_at],
        )?;
        Ok(Self { achievement_id: achievement_id.to_string(), earned_at })
    }

    pub fn find(conn: &Connection, achievement_id: &str) -> Result<Option<Self>> {
        conn.query_row(
            "SELECT achievement_id, earned_at FROM earned_achievements WHERE achievement_id = ?1",
            params![achievement_id],
            |row| Ok(Self { achievement_id: row.get(0)?, earned_at: row.get(1)? }),
        )
        .optional()
    }

    pub fn find_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT achievement_id, earned_at FROM earned_achievements ORDER BY earned_at",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Self { achievement_id: row.get(0)?, earned_at: row.get(1)? })
        })?;
        rows.collect()
    }
}

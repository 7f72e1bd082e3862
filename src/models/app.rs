use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use crate::categorize::Category;

/// Registered application: one row per bundle identifier, created on
/// first observation and never deleted. The rowid is the internal key
/// the counter and session tables reference.
#[derive(Debug, Clone, PartialEq)]
pub struct App {
    pub id: i64,
    pub bundle_id: String,
    pub display_name: String,
    pub category: Category,
    pub is_distraction: bool,
}

impl App {
    fn from_row(row: &Row<'_>) -> Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            bundle_id: row.get(1)?,
            display_name: row.get(2)?,
            category: Category::from_str_lossy(&row.get::<_, String>(3)?),
            is_distraction: row.get::<_, i64>(4)? != 0,
        })
    }

    pub fn insert(
        conn: &Connection,
        bundle_id: &str,
        display_name: &str,
        category: Category,
        is_distraction: bool,
    ) -> Result<Self> {
        conn.execute(
            "INSERT INTO apps (bundle_id, display_name, category, is_distraction)
             VALUES (?1, ?2, ?3, ?4)",
            params![bundle_id, display_name, category.as_str(), is_distraction as i64],
        )?;
        Ok(Self {
            id: conn.last_insert_rowid(),
            bundle_id: bundle_id.to_string(),
            display_name: display_name.to_string(),
            category,
            is_distraction,
        })
    }

    pub fn find_by_bundle_id(conn: &Connection, bundle_id: &str) -> Result<Option<Self>> {
        conn.query_row(
            "SELECT id, bundle_id, display_name, category, is_distraction
             FROM apps WHERE bundle_id = ?1",
            params![bundle_id],
            Self::from_row,
        )
        .optional()
    }

    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        conn.query_row(
            "SELECT id, bundle_id, display_name, category, is_distraction
             FROM apps WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .optional()
    }

    pub fn find_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, bundle_id, display_name, category, is_distraction
             FROM apps ORDER BY display_name",
        )?;
        let rows = stmt.query_map([], Self::from_row)?;
        rows.collect()
    }

    /// User override of the auto-assigned category and distraction flag.
    /// Returns false when no row with that id exists.
    pub fn set_category(
        conn: &Connection,
        id: i64,
        category: Category,
        is_distraction: bool,
    ) -> Result<bool> {
        let updated = conn.execute(
            "UPDATE apps SET category = ?1, is_distraction = ?2 WHERE id = ?3",
            params![category.as_str(), is_distraction as i64, id],
        )?;
        Ok(updated > 0)
    }
}

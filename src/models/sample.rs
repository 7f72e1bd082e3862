use rusqlite::{params, Connection, Result};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Auxiliary payload families stored by the capture side. The engine
/// stores payloads opaque and only decodes them on the bounded
/// retrieval path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    ClickPositions,
    KeycodeHistogram,
}

impl SampleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleKind::ClickPositions => "click_positions",
            SampleKind::KeycodeHistogram => "keycode_histogram",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickPoint {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeycodeCount {
    pub code: u32,
    pub count: u64,
}

/// One decoded payload, tagged by the row's kind column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SamplePayload {
    ClickPositions(Vec<ClickPoint>),
    KeycodeHistogram(Vec<KeycodeCount>),
}

/// A single item out of a decoded payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleItem {
    Click(ClickPoint),
    Keycode(KeycodeCount),
}

impl SamplePayload {
    /// Decode a raw payload as the item list its kind tags it as.
    pub fn decode(kind: SampleKind, timestamp: i64, raw: &str) -> std::result::Result<Self, EngineError> {
        let decoded = match kind {
            SampleKind::ClickPositions => {
                serde_json::from_str::<Vec<ClickPoint>>(raw).map(SamplePayload::ClickPositions)
            }
            SampleKind::KeycodeHistogram => {
                serde_json::from_str::<Vec<KeycodeCount>>(raw).map(SamplePayload::KeycodeHistogram)
            }
        };
        decoded.map_err(|source| EngineError::Decode { kind: kind.as_str(), timestamp, source })
    }

    pub fn len(&self) -> usize {
        match self {
            SamplePayload::ClickPositions(items) => items.len(),
            SamplePayload::KeycodeHistogram(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_items(self) -> Vec<SampleItem> {
        match self {
            SamplePayload::ClickPositions(items) => {
                items.into_iter().map(SampleItem::Click).collect()
            }
            SamplePayload::KeycodeHistogram(items) => {
                items.into_iter().map(SampleItem::Keycode).collect()
            }
        }
    }
}

/// Raw sample row: `(kind, timestamp, payload)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRow {
    pub id: i64,
    pub timestamp: i64,
    pub payload: String,
}

impl SampleRow {
    pub fn insert(conn: &Connection, kind: SampleKind, timestamp: i64, payload: &str) -> Result<i64> {
        conn.execute(
            "INSERT INTO event_samples (kind, timestamp, payload) VALUES (?1, ?2, ?3)",
            params![kind.as_str(), timestamp, payload],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Rows of one kind in `[start, end)` ordered by timestamp.
    pub fn rows_between(
        conn: &Connection,
        kind: SampleKind,
        start: i64,
        end: i64,
    ) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, payload FROM event_samples
             WHERE kind = ?1 AND timestamp >= ?2 AND timestamp < ?3
             ORDER BY timestamp, id",
        )?;
        let rows = stmt.query_map(params![kind.as_str(), start, end], |row| {
            Ok(Self { id: row.get(0)?, timestamp: row.get(1)?, payload: row.get(2)? })
        })?;
        rows.collect()
    }
}

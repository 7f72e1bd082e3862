use log::warn;

use crate::db::{safe_lock, SharedDatabase};
use crate::error::EngineError;
use crate::models::{SampleItem, SampleKind, SamplePayload, SampleRow};

/// Capped-memory retrieval over the auxiliary payload table. Payloads
/// are stored opaque; only `fetch` decodes them, and a malformed row is
/// skipped rather than aborting the whole range query.
pub struct SampleStore {
    db: SharedDatabase,
}

impl SampleStore {
    pub(crate) fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    /// Store a raw payload as written by the capture side. Not decoded
    /// or validated here.
    pub fn insert(&self, kind: SampleKind, timestamp: i64, payload: &str) -> Result<i64, EngineError> {
        let db = safe_lock(&self.db, "sample store");
        Ok(SampleRow::insert(db.connection(), kind, timestamp, payload)?)
    }

    /// Decode and accumulate items from every payload row of `kind` in
    /// `[start, end)`, never returning more than `limit` items. When a
    /// single payload would push past the cap it is stride-sampled:
    /// every `max(1, item_count / remaining)`-th item is taken, which
    /// keeps even coverage over the payload instead of truncating one
    /// end.
    pub fn fetch(
        &self,
        kind: SampleKind,
        start: i64,
        end: i64,
        limit: usize,
    ) -> Result<Vec<SampleItem>, EngineError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let db = safe_lock(&self.db, "sample store");
        let rows = SampleRow::rows_between(db.connection(), kind, start, end)?;

        let mut items = Vec::new();
        for row in rows {
            let remaining = limit - items.len();
            if remaining == 0 {
                break;
            }
            let payload = match SamplePayload::decode(kind, row.timestamp, &row.payload) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!("skipping sample row {}: {err}", row.id);
                    continue;
                }
            };
            let decoded = payload.into_items();
            if decoded.len() <= remaining {
                items.extend(decoded);
            } else {
                let stride = (decoded.len() / remaining).max(1);
                items.extend(decoded.into_iter().step_by(stride).take(remaining));
            }
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClickPoint;
    use crate::test_utils::setup_shared_db;

    fn click_payload(count: usize) -> String {
        let points: Vec<ClickPoint> =
            (0..count).map(|i| ClickPoint { x: i as i32, y: 0 }).collect();
        serde_json::to_string(&points).unwrap()
    }

    fn store() -> SampleStore {
        SampleStore::new(setup_shared_db())
    }

    #[test]
    fn test_fetch_under_limit_returns_everything() {
        let store = store();
        store.insert(SampleKind::ClickPositions, 100, &click_payload(3)).unwrap();
        store.insert(SampleKind::ClickPositions, 200, &click_payload(4)).unwrap();

        let items = store.fetch(SampleKind::ClickPositions, 0, 1_000, 100).unwrap();
        assert_eq!(items.len(), 7);
    }

    #[test]
    fn test_fetch_never_exceeds_limit() {
        let store = store();
        for ts in 0..10 {
            store.insert(SampleKind::ClickPositions, ts, &click_payload(50)).unwrap();
        }

        for limit in [0, 1, 7, 99, 500, 1_000] {
            let items = store.fetch(SampleKind::ClickPositions, 0, 1_000, limit).unwrap();
            assert!(items.len() <= limit, "limit {limit} returned {}", items.len());
        }
    }

    #[test]
    fn test_stride_sampling_keeps_even_coverage() {
        let store = store();
        // one payload of 100 points, room for 10
        store.insert(SampleKind::ClickPositions, 100, &click_payload(100)).unwrap();

        let items = store.fetch(SampleKind::ClickPositions, 0, 1_000, 10).unwrap();
        assert_eq!(items.len(), 10);

        // stride 10: x values 0, 10, 20, ... 90
        let xs: Vec<i32> = items
            .iter()
            .map(|item| match item {
                SampleItem::Click(p) => p.x,
                SampleItem::Keycode(_) => panic!("wrong kind"),
            })
            .collect();
        assert_eq!(xs, (0..100).step_by(10).collect::<Vec<i32>>());
    }

    #[test]
    fn test_zero_limit_returns_empty() {
        let store = store();
        store.insert(SampleKind::ClickPositions, 100, &click_payload(5)).unwrap();
        assert!(store.fetch(SampleKind::ClickPositions, 0, 1_000, 0).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_rows_are_skipped_not_fatal() {
        let store = store();
        store.insert(SampleKind::ClickPositions, 100, &click_payload(2)).unwrap();
        store.insert(SampleKind::ClickPositions, 200, "{broken").unwrap();
        store.insert(SampleKind::ClickPositions, 300, &click_payload(3)).unwrap();

        let items = store.fetch(SampleKind::ClickPositions, 0, 1_000, 100).unwrap();
        assert_eq!(items.len(), 5);
    }

    #[test]
    fn test_fetch_respects_range_and_kind() {
        let store = store();
        store.insert(SampleKind::ClickPositions, 100, &click_payload(2)).unwrap();
        store.insert(SampleKind::ClickPositions, 900, &click_payload(2)).unwrap();
        store.insert(SampleKind::KeycodeHistogram, 100, r#"[{"code":1,"count":2}]"#).unwrap();

        let items = store.fetch(SampleKind::ClickPositions, 0, 500, 100).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_cap_spanning_multiple_payloads() {
        let store = store();
        store.insert(SampleKind::ClickPositions, 100, &click_payload(8)).unwrap();
        store.insert(SampleKind::ClickPositions, 200, &click_payload(8)).unwrap();

        // 8 fit whole, the second payload gets stride-sampled into the
        // remaining 4 slots
        let items = store.fetch(SampleKind::ClickPositions, 0, 1_000, 12).unwrap();
        assert_eq!(items.len(), 12);
    }
}

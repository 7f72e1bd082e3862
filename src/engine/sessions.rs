use log::info;

use crate::db::{safe_lock, SharedDatabase};
use crate::error::EngineError;
use crate::models::{FocusSession, MinuteCounter};
use crate::time::now_ts;

/// Lifecycle manager for focus sessions. Start and end are both
/// idempotent; the single-open-session invariant is held by running
/// each state change inside one write transaction.
pub struct SessionManager {
    db: SharedDatabase,
}

impl SessionManager {
    pub(crate) fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    /// Start a session, or return the already-open one unchanged. The
    /// check and the insert share a transaction so duplicate
    /// UI-triggered starts cannot create a second open row.
    pub fn start(&self, primary_app_id: Option<i64>) -> Result<FocusSession, EngineError> {
        let mut db = safe_lock(&self.db, "session manager");
        let tx = db.connection_mut().transaction()?;

        let session = match FocusSession::find_active(&tx)? {
            Some(open) => open,
            None => {
                let session = FocusSession::insert_open(&tx, now_ts(), primary_app_id)?;
                info!("focus session {} started", session.id);
                session
            }
        };

        tx.commit()?;
        Ok(session)
    }

    /// End a session: set the end time and back-fill keystroke/click
    /// totals from the counter rows inside `[started_at, ended_at]`,
    /// filtered to the primary app when one was set. Ending an
    /// already-closed session returns it unchanged; an unknown id
    /// returns `None`. The whole read-compute-write runs in one
    /// transaction so no concurrent caller observes the session open
    /// mid-computation.
    pub fn end(&self, id: i64) -> Result<Option<FocusSession>, EngineError> {
        let mut db = safe_lock(&self.db, "session manager");
        let tx = db.connection_mut().transaction()?;

        let Some(session) = FocusSession::find_by_id(&tx, id)? else {
            tx.commit()?;
            return Ok(None);
        };
        if session.ended_at.is_some() {
            tx.commit()?;
            return Ok(Some(session));
        }

        let ended_at = now_ts();
        // counter minutes within [started_at, ended_at] inclusive
        let totals = MinuteCounter::sum_range(
            &tx,
            session.started_at,
            ended_at + 1,
            session.primary_app_id,
        )?;
        FocusSession::close(&tx, id, ended_at, totals.keystrokes, totals.clicks)?;
        let closed = FocusSession::find_by_id(&tx, id)?;

        tx.commit()?;
        info!("focus session {id} ended");
        Ok(closed)
    }

    /// Bump the open session's interruption count. No-op on closed or
    /// unknown sessions.
    pub fn record_interruption(&self, id: i64) -> Result<Option<FocusSession>, EngineError> {
        let mut db = safe_lock(&self.db, "session manager");
        let tx = db.connection_mut().transaction()?;

        let Some(session) = FocusSession::find_by_id(&tx, id)? else {
            tx.commit()?;
            return Ok(None);
        };
        if session.ended_at.is_some() {
            tx.commit()?;
            return Ok(None);
        }

        FocusSession::add_interruption(&tx, id)?;
        let updated = FocusSession::find_by_id(&tx, id)?;
        tx.commit()?;
        Ok(updated)
    }

    pub fn active(&self) -> Result<Option<FocusSession>, EngineError> {
        let db = safe_lock(&self.db, "session manager");
        Ok(FocusSession::find_active(db.connection())?)
    }

    pub fn recent(&self, limit: usize) -> Result<Vec<FocusSession>, EngineError> {
        let db = safe_lock(&self.db, "session manager");
        Ok(FocusSession::recent(db.connection(), limit)?)
    }
}

use log::info;
use rusqlite::Connection;

use crate::categorize::{self, Category};
use crate::db::{safe_lock, SharedDatabase};
use crate::error::{is_unique_violation, EngineError};
use crate::models::App;

/// Maps opaque bundle identifiers to registered app rows. Apps are
/// created on first observation and never deleted.
pub struct AppRegistry {
    db: SharedDatabase,
}

impl AppRegistry {
    pub(crate) fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    /// Return the app for `bundle_id`, creating it with an
    /// auto-assigned category on first observation.
    pub fn find_or_create(&self, bundle_id: &str, display_name: &str) -> Result<App, EngineError> {
        let db = safe_lock(&self.db, "app registry");
        Ok(Self::find_or_create_on(db.connection(), bundle_id, display_name)?)
    }

    /// Race-safe find-or-create against the unique bundle_id column: a
    /// losing concurrent insert falls back to reading the winner's row.
    pub(crate) fn find_or_create_on(
        conn: &Connection,
        bundle_id: &str,
        display_name: &str,
    ) -> rusqlite::Result<App> {
        if let Some(app) = App::find_by_bundle_id(conn, bundle_id)? {
            return Ok(app);
        }

        let category = categorize::assign(bundle_id);
        match App::insert(conn, bundle_id, display_name, category, category.default_distraction()) {
            Ok(app) => {
                info!("registered app {} as {}", app.bundle_id, app.category);
                Ok(app)
            }
            Err(err) if is_unique_violation(&err) => {
                match App::find_by_bundle_id(conn, bundle_id)? {
                    Some(app) => Ok(app),
                    None => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }

    pub fn get(&self, bundle_id: &str) -> Result<Option<App>, EngineError> {
        let db = safe_lock(&self.db, "app registry");
        Ok(App::find_by_bundle_id(db.connection(), bundle_id)?)
    }

    pub fn find_all(&self) -> Result<Vec<App>, EngineError> {
        let db = safe_lock(&self.db, "app registry");
        Ok(App::find_all(db.connection())?)
    }

    /// User override of category and distraction flag. Returns the
    /// updated row, or `None` when the id is unknown.
    pub fn set_category(
        &self,
        app_id: i64,
        category: Category,
        is_distraction: bool,
    ) -> Result<Option<App>, EngineError> {
        let db = safe_lock(&self.db, "app registry");
        let conn = db.connection();
        if !App::set_category(conn, app_id, category, is_distraction)? {
            return Ok(None);
        }
        Ok(App::find_by_id(conn, app_id)?)
    }
}

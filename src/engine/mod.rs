//! The engine facade: one store handle at process start, handed to each
//! component explicitly. No ambient globals.

mod achievements;
mod counters;
mod registry;
mod rollup;
mod samples;
mod sessions;

pub use achievements::{
    AchievementDef, AchievementEvaluator, AchievementStatus, Requirement, CATALOG,
};
pub use counters::CounterStore;
pub use registry::AppRegistry;
pub use rollup::{RollupAggregator, TopApp};
pub use samples::SampleStore;
pub use sessions::SessionManager;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use directories::ProjectDirs;
use log::error;

use crate::db::{migrations, safe_lock, Database, SharedDatabase};
use crate::error::EngineError;
use crate::models::{App, CounterDeltas, MinuteCounter};
use crate::time::align_to_minute;

pub struct Engine {
    db: SharedDatabase,
    registry: AppRegistry,
    counters: CounterStore,
    sessions: SessionManager,
    rollups: RollupAggregator,
    achievements: AchievementEvaluator,
    samples: SampleStore,
}

impl Engine {
    /// Open (or create) the store at `path`, run migrations, and wire
    /// up every component.
    pub fn open(path: &Path) -> Result<Self, EngineError> {
        let db = Database::open(path).map_err(|e| {
            error!("failed to open database at {}: {e}", path.display());
            e
        })?;
        Self::from_database(db)
    }

    /// In-memory engine, for tests and throwaway tooling.
    pub fn open_in_memory() -> Result<Self, EngineError> {
        Self::from_database(Database::open_in_memory()?)
    }

    fn from_database(db: Database) -> Result<Self, EngineError> {
        migrations::run(db.connection())?;
        let db: SharedDatabase = Arc::new(Mutex::new(db));
        Ok(Self {
            registry: AppRegistry::new(Arc::clone(&db)),
            counters: CounterStore::new(Arc::clone(&db)),
            sessions: SessionManager::new(Arc::clone(&db)),
            rollups: RollupAggregator::new(Arc::clone(&db)),
            achievements: AchievementEvaluator::new(Arc::clone(&db)),
            samples: SampleStore::new(Arc::clone(&db)),
            db,
        })
    }

    /// Default store location under the per-user data directory.
    pub fn default_db_path() -> Result<PathBuf, EngineError> {
        let proj_dirs =
            ProjectDirs::from("com", "cadence", "Cadence").ok_or(EngineError::NoProjectDirs)?;
        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;
        Ok(data_dir.join("cadence.db"))
    }

    /// Capture entrypoint: register the app if it is new and merge the
    /// deltas into its minute counter, in one transaction. Deltas are
    /// trusted non-negative.
    pub fn record(
        &self,
        timestamp: i64,
        bundle_id: &str,
        display_name: &str,
        deltas: &CounterDeltas,
    ) -> Result<App, EngineError> {
        let mut db = safe_lock(&self.db, "engine record");
        let tx = db.connection_mut().transaction()?;
        let app = AppRegistry::find_or_create_on(&tx, bundle_id, display_name)?;
        MinuteCounter::merge(&tx, align_to_minute(timestamp), app.id, deltas)?;
        tx.commit()?;
        Ok(app)
    }

    pub fn registry(&self) -> &AppRegistry {
        &self.registry
    }

    pub fn counters(&self) -> &CounterStore {
        &self.counters
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn rollups(&self) -> &RollupAggregator {
        &self.rollups
    }

    pub fn achievements(&self) -> &AchievementEvaluator {
        &self.achievements
    }

    pub fn samples(&self) -> &SampleStore {
        &self.samples
    }
}

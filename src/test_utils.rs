//! Shared test utilities.

#![cfg(test)]

use std::sync::{Arc, Mutex};

use crate::db::{migrations, Database, SharedDatabase};

/// Create an in-memory test database with migrations applied.
pub fn setup_test_db() -> Database {
    let db = Database::open_in_memory().expect("Failed to open test database");
    migrations::run(db.connection()).expect("Failed to run migrations on test DB");
    db
}

/// Same, wrapped in the shared handle the engine components take.
pub fn setup_shared_db() -> SharedDatabase {
    Arc::new(Mutex::new(setup_test_db()))
}

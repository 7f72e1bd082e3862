use thiserror::Error;

/// Engine error type
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Database error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Malformed {kind} payload at {timestamp}")]
    Decode {
        kind: &'static str,
        timestamp: i64,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Could not determine project directories")]
    NoProjectDirs,

    #[error("Could not create data directory: {0}")]
    DataDir(#[from] std::io::Error),
}

/// Check if a rusqlite error is a UNIQUE constraint violation
pub fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(err, _)
        if err.code == rusqlite::ffi::ErrorCode::ConstraintViolation)
}

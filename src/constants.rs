// src/constants.rs

/// Seconds in one day (24 * 60 * 60)
pub const SECS_PER_DAY: i64 = 86_400;

/// Seconds in one minute
pub const SECS_PER_MINUTE: i64 = 60;

/// Minimum duration for a closed session to count as deep work (25 minutes)
pub const DEEP_WORK_MIN_SECS: i64 = 25 * 60;

/// A session with this many interruptions or more is not deep work
pub const DEEP_WORK_MAX_INTERRUPTIONS: i64 = 3;

/// Apps kept in a rollup's serialized top-app summary
pub const TOP_APPS_LIMIT: usize = 5;

/// How far back day-walking achievement checks scan
pub const DAY_SCAN_LIMIT: u32 = 365;

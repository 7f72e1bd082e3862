pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS apps (
    id INTEGER PRIMARY KEY,
    bundle_id TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    category TEXT NOT NULL,
    is_distraction INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS minute_counters (
    minute INTEGER NOT NULL,
    app_id INTEGER NOT NULL REFERENCES apps(id),
    keystrokes INTEGER NOT NULL DEFAULT 0,
    clicks INTEGER NOT NULL DEFAULT 0,
    scroll_units INTEGER NOT NULL DEFAULT 0,
    pointer_distance INTEGER NOT NULL DEFAULT 0,
    active_secs INTEGER NOT NULL DEFAULT 0,
    idle_secs INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (minute, app_id)
);

CREATE TABLE IF NOT EXISTS focus_sessions (
    id INTEGER PRIMARY KEY,
    started_at INTEGER NOT NULL,
    ended_at INTEGER,
    primary_app_id INTEGER REFERENCES apps(id),
    keystrokes INTEGER NOT NULL DEFAULT 0,
    clicks INTEGER NOT NULL DEFAULT 0,
    interruptions INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS daily_rollups (
    date TEXT PRIMARY KEY,
    active_secs INTEGER NOT NULL,
    focus_secs INTEGER NOT NULL,
    keystrokes INTEGER NOT NULL,
    clicks INTEGER NOT NULL,
    scroll_units INTEGER NOT NULL,
    first_activity INTEGER,
    last_activity INTEGER,
    focus_score INTEGER NOT NULL,
    productivity_score INTEGER NOT NULL,
    top_apps TEXT NOT NULL,
    hourly TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS earned_achievements (
    achievement_id TEXT PRIMARY KEY,
    earned_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS event_samples (
    id INTEGER PRIMARY KEY,
    kind TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    payload TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_minute_counters_minute ON minute_counters(minute);
CREATE INDEX IF NOT EXISTS idx_focus_sessions_active ON focus_sessions(ended_at) WHERE ended_at IS NULL;
CREATE INDEX IF NOT EXISTS idx_focus_sessions_started ON focus_sessions(started_at);
CREATE INDEX IF NOT EXISTS idx_event_samples_kind_ts ON event_samples(kind, timestamp);
"#;

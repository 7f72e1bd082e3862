use std::collections::HashSet;

use chrono::{Local, NaiveDate, TimeZone};
use log::info;
use rusqlite::Connection;

use crate::constants::DAY_SCAN_LIMIT;
use crate::db::{safe_lock, SharedDatabase};
use crate::error::EngineError;
use crate::models::{EarnedAchievement, FocusSession, MinuteCounter};
use crate::time::{date_in, datetime_in, day_bounds_in, now_ts};
use chrono::Timelike;

/// One threshold rule out of the fixed catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Completed sessions, all time
    Sessions(i64),
    /// Longest single closed session, seconds
    LongestSessionSecs(i64),
    /// Closed deep-work sessions, all time
    DeepWorkSessions(i64),
    /// Distinct minutes with active time today
    ActiveMinutesInDay(i64),
    /// Keystrokes today
    KeystrokesInDay(i64),
    /// Clicks today
    ClicksInDay(i64),
    /// Consecutive local-calendar days with any activity, ending today
    StreakDays(i64),
    /// Activity before `before_hour` local time on `days` distinct days
    EarlyStarts { before_hour: u32, days: i64 },
    /// Activity at or after `from_hour` local time on `days` distinct days
    LateNights { from_hour: u32, days: i64 },
}

#[derive(Debug)]
pub struct AchievementDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub requirement: Requirement,
}

/// A catalog entry together with its unlock state, for the UI.
#[derive(Debug)]
pub struct AchievementStatus {
    pub def: &'static AchievementDef,
    pub earned_at: Option<i64>,
}

pub const CATALOG: &[AchievementDef] = &[
    AchievementDef {
        id: "first-session",
        name: "First Steps",
        description: "Complete your first focus session",
        requirement: Requirement::Sessions(1),
    },
    AchievementDef {
        id: "ten-sessions",
        name: "Regular",
        description: "Complete 10 focus sessions",
        requirement: Requirement::Sessions(10),
    },
    AchievementDef {
        id: "marathon",
        name: "Marathon",
        description: "Hold a single focus session for 2 hours",
        requirement: Requirement::LongestSessionSecs(2 * 3600),
    },
    AchievementDef {
        id: "deep-five",
        name: "Deep Diver",
        description: "Finish 5 deep-work sessions",
        requirement: Requirement::DeepWorkSessions(5),
    },
    AchievementDef {
        id: "busy-day",
        name: "Full Plate",
        description: "Stay active for 4 hours in one day",
        requirement: Requirement::ActiveMinutesInDay(240),
    },
    AchievementDef {
        id: "keys-10k",
        name: "Wordsmith",
        description: "Type 10,000 keystrokes in one day",
        requirement: Requirement::KeystrokesInDay(10_000),
    },
    AchievementDef {
        id: "clicks-1k",
        name: "Trigger Finger",
        description: "Click 1,000 times in one day",
        requirement: Requirement::ClicksInDay(1_000),
    },
    AchievementDef {
        id: "streak-7",
        name: "One Week In",
        description: "Be active 7 days in a row",
        requirement: Requirement::StreakDays(7),
    },
    AchievementDef {
        id: "streak-30",
        name: "Habit Formed",
        description: "Be active 30 days in a row",
        requirement: Requirement::StreakDays(30),
    },
    AchievementDef {
        id: "early-bird",
        name: "Early Bird",
        description: "Start before 7am on 5 different days",
        requirement: Requirement::EarlyStarts { before_hour: 7, days: 5 },
    },
    AchievementDef {
        id: "night-owl",
        name: "Night Owl",
        description: "Work past 11pm on 5 different days",
        requirement: Requirement::LateNights { from_hour: 23, days: 5 },
    },
];

/// Evaluates the catalog against the stores and records first-time
/// unlocks. The existence check before each insert makes `check_all`
/// re-entrant: an id is surfaced as newly earned exactly once, ever.
pub struct AchievementEvaluator {
    db: SharedDatabase,
}

impl AchievementEvaluator {
    pub(crate) fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    /// Evaluate every not-yet-earned catalog entry; returns the newly
    /// unlocked definitions.
    pub fn check_all(&self) -> Result<Vec<&'static AchievementDef>, EngineError> {
        self.check_all_at(now_ts(), &Local)
    }

    /// Evaluation pinned to an explicit "now" and timezone.
    pub fn check_all_at<Tz: TimeZone>(
        &self,
        now: i64,
        tz: &Tz,
    ) -> Result<Vec<&'static AchievementDef>, EngineError> {
        let today = date_in(now, tz);
        let mut db = safe_lock(&self.db, "achievement evaluator");
        let tx = db.connection_mut().transaction()?;

        let mut unlocked = Vec::new();
        for def in CATALOG {
            if EarnedAchievement::exists(&tx, def.id)? {
                continue;
            }
            if requirement_met(&tx, &def.requirement, today, tz)? {
                EarnedAchievement::insert(&tx, def.id, now)?;
                info!("achievement unlocked: {}", def.id);
                unlocked.push(def);
            }
        }

        tx.commit()?;
        Ok(unlocked)
    }

    /// Every catalog entry with its earned timestamp, catalog order.
    pub fn catalog_with_status(&self) -> Result<Vec<AchievementStatus>, EngineError> {
        let db = safe_lock(&self.db, "achievement evaluator");
        let conn = db.connection();
        let mut statuses = Vec::with_capacity(CATALOG.len());
        for def in CATALOG {
            let earned_at = EarnedAchievement::find(conn, def.id)?.map(|row| row.earned_at);
            statuses.push(AchievementStatus { def, earned_at });
        }
        Ok(statuses)
    }
}

fn requirement_met<Tz: TimeZone>(
    conn: &Connection,
    requirement: &Requirement,
    today: NaiveDate,
    tz: &Tz,
) -> rusqlite::Result<bool> {
    let (today_start, today_end) = day_bounds_in(today, tz);
    let met = match *requirement {
        Requirement::Sessions(n) => FocusSession::completed_count(conn)? >= n,
        Requirement::LongestSessionSecs(n) => FocusSession::longest_duration_secs(conn)? >= n,
        Requirement::DeepWorkSessions(n) => FocusSession::deep_work_count(conn)? >= n,
        Requirement::ActiveMinutesInDay(n) => {
            MinuteCounter::active_minute_count(conn, today_start, today_end)? >= n
        }
        Requirement::KeystrokesInDay(n) => {
            MinuteCounter::sum_range(conn, today_start, today_end, None)?.keystrokes >= n
        }
        Requirement::ClicksInDay(n) => {
            MinuteCounter::sum_range(conn, today_start, today_end, None)?.clicks >= n
        }
        Requirement::StreakDays(n) => streak_days(conn, today, tz)? >= n,
        Requirement::EarlyStarts { before_hour, days } => {
            distinct_days_matching(conn, today, tz, |hour| hour < before_hour)? >= days
        }
        Requirement::LateNights { from_hour, days } => {
            distinct_days_matching(conn, today, tz, |hour| hour >= from_hour)? >= days
        }
    };
    Ok(met)
}

/// Consecutive active days ending today: walk backward one local
/// calendar day at a time, stopping at the first day with no counter
/// row or at the scan bound. The raw presence query is authoritative;
/// cached rollup totals are not consulted.
fn streak_days<Tz: TimeZone>(conn: &Connection, today: NaiveDate, tz: &Tz) -> rusqlite::Result<i64> {
    let mut streak = 0;
    let mut day = today;
    for _ in 0..DAY_SCAN_LIMIT {
        let (start, end) = day_bounds_in(day, tz);
        if !MinuteCounter::has_activity_between(conn, start, end)? {
            break;
        }
        streak += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    Ok(streak)
}

/// Distinct local-calendar days, within the scan window ending today,
/// with at least one counter minute whose local hour satisfies the
/// predicate.
fn distinct_days_matching<Tz: TimeZone>(
    conn: &Connection,
    today: NaiveDate,
    tz: &Tz,
    hour_matches: impl Fn(u32) -> bool,
) -> rusqlite::Result<i64> {
    let window_start = today
        .checked_sub_days(chrono::Days::new(u64::from(DAY_SCAN_LIMIT - 1)))
        .map(|first| day_bounds_in(first, tz).0)
        .unwrap_or(0);
    let window_end = day_bounds_in(today, tz).1;

    let mut days: HashSet<NaiveDate> = HashSet::new();
    for minute in MinuteCounter::distinct_minutes_between(conn, window_start, window_end)? {
        let local = datetime_in(minute, tz);
        if hour_matches(local.hour()) {
            days.insert(local.date_naive());
        }
    }
    Ok(days.len() as i64)
}

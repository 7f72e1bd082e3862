//! Calendar arithmetic for the aggregation paths.
//!
//! Every calendar-sensitive operation is generic over [`chrono::TimeZone`]
//! so the public surface can fix [`chrono::Local`] while tests pin `Utc`
//! and fixed timestamps.

use chrono::{DateTime, Days, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::constants::{SECS_PER_DAY, SECS_PER_MINUTE};

/// Current Unix timestamp in seconds.
pub fn now_ts() -> i64 {
    Utc::now().timestamp()
}

/// Align a timestamp down to the start of its minute.
pub fn align_to_minute(ts: i64) -> i64 {
    ts - ts.rem_euclid(SECS_PER_MINUTE)
}

/// Convert a Unix timestamp into the given timezone.
pub fn datetime_in<Tz: TimeZone>(ts: i64, tz: &Tz) -> DateTime<Tz> {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .with_timezone(tz)
}

/// Calendar date of a Unix timestamp in the given timezone.
pub fn date_in<Tz: TimeZone>(ts: i64, tz: &Tz) -> NaiveDate {
    datetime_in(ts, tz).date_naive()
}

/// Half-open `[start, end)` Unix-timestamp bounds of a calendar day in
/// the given timezone.
pub fn day_bounds_in<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> (i64, i64) {
    let start = local_midnight(date, tz);
    let end = date
        .checked_add_days(Days::new(1))
        .map(|next| local_midnight(next, tz))
        .unwrap_or(start + SECS_PER_DAY);
    (start, end)
}

fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> i64 {
    let naive = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.timestamp(),
        // Fall-back transition: the earlier of the two midnights starts the day
        LocalResult::Ambiguous(earliest, _) => earliest.timestamp(),
        // Spring-forward transition skipped midnight; the day starts an hour in
        LocalResult::None => tz
            .from_local_datetime(&(naive + chrono::Duration::hours(1)))
            .earliest()
            .map(|dt| dt.timestamp())
            .unwrap_or_else(|| naive.and_utc().timestamp()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_align_to_minute() {
        assert_eq!(align_to_minute(1_700_000_059), align_to_minute(1_700_000_000));
        assert_eq!(align_to_minute(1_700_000_040) % 60, 0);
        assert_eq!(align_to_minute(-1), -60);
    }

    #[test]
    fn test_day_bounds_utc() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let (start, end) = day_bounds_in(date, &Utc);
        assert_eq!(end - start, SECS_PER_DAY);
        assert_eq!(datetime_in(start, &Utc).hour(), 0);
        assert_eq!(date_in(start, &Utc), date);
        assert_eq!(date_in(end - 1, &Utc), date);
    }

    #[test]
    fn test_day_bounds_cover_adjacent_days() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let next = date.succ_opt().unwrap();
        let (_, end) = day_bounds_in(date, &Utc);
        let (next_start, _) = day_bounds_in(next, &Utc);
        assert_eq!(end, next_start);
    }

    #[test]
    fn test_date_in_offset_zone() {
        use chrono::FixedOffset;
        // 23:30 UTC on the 15th is already the 16th at UTC+5
        let tz = FixedOffset::east_opt(5 * 3600).unwrap();
        let ts = Utc
            .with_ymd_and_hms(2024, 3, 15, 23, 30, 0)
            .single()
            .unwrap()
            .timestamp();
        assert_eq!(date_in(ts, &Utc), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(date_in(ts, &tz), NaiveDate::from_ymd_opt(2024, 3, 16).unwrap());
    }
}

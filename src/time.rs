//! Relative Time Formatting
//!
//! Turns a past timestamp into a short human-readable string ("4 min ago").

use chrono::{DateTime, Utc};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 365 * DAY;

/// Relative time between `past` and the current wall clock.
pub fn time_ago(past: DateTime<Utc>) -> String {
    relative_time(past, Utc::now())
}

/// Relative time between `past` and `now`.
///
/// Timestamps at or ahead of `now` (clock skew, bad input) collapse to
/// "just now".
pub fn relative_time(past: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = now.signed_duration_since(past).num_seconds();

    if secs < 20 {
        return "just now".to_string();
    }
    if secs < MINUTE {
        return "less than 1 min ago".to_string();
    }
    if secs < HOUR {
        return format!("{} min ago", round_div(secs, MINUTE));
    }
    if secs < DAY {
        return format!("{} h ago", round_div(secs, HOUR));
    }
    if secs < MONTH {
        return format!("{} days ago", round_div(secs, DAY));
    }
    if secs < YEAR {
        return format!("{} mo ago", round_div(secs, MONTH));
    }
    format!("{} years ago", round_div(secs, YEAR))
}

/// Nearest-integer division, rounding half away from zero.
fn round_div(value: i64, unit: i64) -> i64 {
    (value as f64 / unit as f64).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(secs_ago: i64) -> (DateTime<Utc>, DateTime<Utc>) {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        (now - Duration::seconds(secs_ago), now)
    }

    #[test]
    fn test_just_now() {
        let (past, now) = at(5);
        assert_eq!(relative_time(past, now), "just now");
    }

    #[test]
    fn test_future_timestamp_is_just_now() {
        let (past, now) = at(-120);
        assert_eq!(relative_time(past, now), "just now");
    }

    #[test]
    fn test_under_a_minute() {
        let (past, now) = at(45);
        assert_eq!(relative_time(past, now), "less than 1 min ago");
    }

    #[test]
    fn test_minutes() {
        let (past, now) = at(90);
        assert_eq!(relative_time(past, now), "2 min ago");
        let (past, now) = at(14 * 60);
        assert_eq!(relative_time(past, now), "14 min ago");
    }

    #[test]
    fn test_hours() {
        let (past, now) = at(3 * HOUR + 10 * MINUTE);
        assert_eq!(relative_time(past, now), "3 h ago");
    }

    #[test]
    fn test_days() {
        let (past, now) = at(6 * DAY);
        assert_eq!(relative_time(past, now), "6 days ago");
    }

    #[test]
    fn test_months() {
        let (past, now) = at(3 * MONTH + DAY);
        assert_eq!(relative_time(past, now), "3 mo ago");
    }

    #[test]
    fn test_years() {
        let (past, now) = at(2 * YEAR);
        assert_eq!(relative_time(past, now), "2 years ago");
    }
}

//! Spaced repetition review scheduler.
//!
//! A simplified SM-2 variant driven only by the latest recall quality:
//! - Quality 0-2: the streak resets and the item is due again tomorrow
//! - Quality 3-5: the streak grows; intervals go 1 day → 3 days → previous interval × ease factor
//! - The ease factor is derived from the current quality alone (1.3 at 3, up to 1.9 at 5)
//!   and is not carried between reviews
//! - Intervals are not capped; due dates saturate at the latest date chrono can represent

use chrono::{DateTime, Days, Duration, Local, LocalResult, NaiveDate, NaiveTime, TimeZone};

pub const MIN_QUALITY: i32 = 0;
pub const MAX_QUALITY: i32 = 5;
/// Lowest quality that counts as a successful recall.
pub const PASSING_QUALITY: i32 = 3;

/// Interval and streak produced by one review.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReviewResult {
    pub next_interval_days: u32,
    pub new_consecutive_correct: u32,
}

/// Ease factor for a clamped passing quality: 1.3 for 3, 1.6 for 4, 1.9 for 5.
fn ease_factor(quality: i32) -> f64 {
    1.3 + f64::from(quality - PASSING_QUALITY) * 0.3
}

/// Calculates the next interval and streak for a review.
/// quality_level is clamped to 0-5, anything outside is tolerated.
pub fn calculate_next_review(
    quality_level: i32,
    previous_interval_days: u32,
    consecutive_correct: u32,
) -> ReviewResult {
    let quality = quality_level.clamp(MIN_QUALITY, MAX_QUALITY);

    if quality < PASSING_QUALITY {
        return ReviewResult {
            next_interval_days: 1,
            new_consecutive_correct: 0,
        };
    }

    let ease = ease_factor(quality);
    let new_consecutive_correct = consecutive_correct.saturating_add(1);
    let next_interval_days = match new_consecutive_correct {
        1 => 1,
        2 => 3,
        // `as` saturates, so huge histories top out at u32::MAX days
        _ => (f64::from(previous_interval_days) * ease).round() as u32,
    };

    ReviewResult {
        next_interval_days,
        new_consecutive_correct,
    }
}

/// Review of an item with no history.
pub fn calculate_first_review(quality_level: i32) -> ReviewResult {
    calculate_next_review(quality_level, 0, 0)
}

/// Adds `interval_days` calendar days to `base`.
///
/// Calendar arithmetic keeps the wall-clock time, so across a DST change the
/// elapsed time is not a multiple of 24h. When the target wall-clock time is
/// repeated (DST fall-back) the earlier instant wins; when it does not exist
/// (DST gap) the fixed 24h step is used instead. Results past chrono's range
/// saturate at the latest representable date.
pub fn next_review_date_from<Tz: TimeZone>(base: DateTime<Tz>, interval_days: u32) -> DateTime<Tz> {
    let tz = base.timezone();
    let Some(target) = base
        .naive_local()
        .checked_add_days(Days::new(u64::from(interval_days)))
    else {
        return latest_review_date(&tz);
    };

    match tz.from_local_datetime(&target) {
        LocalResult::Single(date) => date,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => base
            .checked_add_signed(Duration::days(i64::from(interval_days)))
            .unwrap_or_else(|| latest_review_date(&tz)),
    }
}

/// Midnight UTC on the last date chrono supports; any real offset keeps it in range.
fn latest_review_date<Tz: TimeZone>(tz: &Tz) -> DateTime<Tz> {
    tz.from_utc_datetime(&NaiveDate::MAX.and_time(NaiveTime::MIN))
}

/// Local date-time `interval_days` calendar days from now.
pub fn get_next_review_date(interval_days: u32) -> DateTime<Local> {
    next_review_date_from(Local::now(), interval_days)
}

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, Timelike, Utc, Weekday};

use crate::errors::AppError;

/// Canonical storage offset: all timestamps are salon wall time, UTC+2.
pub const SALON_UTC_OFFSET_HOURS: i32 = 2;

/// Slots sit on a fixed half-hour grid.
pub const SLOT_MINUTES: u32 = 30;

pub fn salon_offset() -> FixedOffset {
    FixedOffset::east_opt(SALON_UTC_OFFSET_HOURS * 3600).unwrap()
}

/// Current salon-local wall time, for past-date comparisons.
pub fn now_local() -> NaiveDateTime {
    Utc::now().with_timezone(&salon_offset()).naive_local()
}

/// Parse caller input and normalize it to salon wall time.
///
/// Offset-bearing input (RFC 3339) is converted to UTC+2; naive input is
/// taken as already salon-local. Anything unparseable, and anything off
/// the half-hour grid, is rejected outright rather than defaulted.
pub fn normalize(raw: &str) -> Result<NaiveDateTime, AppError> {
    let trimmed = raw.trim();

    let local = if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        dt.with_timezone(&salon_offset()).naive_local()
    } else {
        parse_naive(trimmed).ok_or(AppError::InvalidTimestamp)?
    };

    if !on_slot_grid(&local) {
        return Err(AppError::InvalidTimestamp);
    }

    Ok(local)
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn on_slot_grid(local: &NaiveDateTime) -> bool {
    local.second() == 0 && local.minute() % SLOT_MINUTES == 0
}

/// Whether the salon is open at the given salon-local time.
///
/// Sunday and Monday: closed. Tuesday-Friday: 9:00-19:00.
/// Saturday: 8:00-17:00. End hours are exclusive.
pub fn is_business_open(local: &NaiveDateTime) -> bool {
    let hour = local.hour();
    match local.weekday() {
        Weekday::Sun | Weekday::Mon => false,
        Weekday::Sat => (8..17).contains(&hour),
        _ => (9..19).contains(&hour),
    }
}

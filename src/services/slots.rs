use chrono::{Duration, NaiveDate, NaiveDateTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;

/// Ordered `HH:MM` times of active appointments on a salon-local day,
/// for graying out the slot grid. Advisory only; the booking engine
/// re-checks at commit time.
pub fn list_booked_times(conn: &Connection, date: NaiveDate) -> Result<Vec<String>, AppError> {
    let day_start = date.and_hms_opt(0, 0, 0).ok_or(AppError::InvalidTimestamp)?;
    let day_end = day_start + Duration::days(1);

    let times = queries::active_times_in_range(conn, &day_start, &day_end)?;
    Ok(times.iter().map(|t| t.format("%H:%M").to_string()).collect())
}

/// True iff no active appointment occupies the exact normalized slot.
pub fn is_slot_free(conn: &Connection, ts: &NaiveDateTime) -> Result<bool, AppError> {
    Ok(!queries::active_appointment_exists_at(conn, ts, None)?)
}

/// Same check, ignoring one appointment id (the one being rescheduled).
pub fn is_slot_free_excluding(
    conn: &Connection,
    ts: &NaiveDateTime,
    exclude_id: &str,
) -> Result<bool, AppError> {
    Ok(!queries::active_appointment_exists_at(conn, ts, Some(exclude_id))?)
}

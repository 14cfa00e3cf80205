use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::Identity;
use crate::db::queries;
use crate::errors::{map_slot_constraint, AppError};
use crate::models::{Appointment, AppointmentStatus, Clientele, Service, ServiceFlags};
use crate::services::{hours, matcher, slots};

/// The engine is the sole writer of appointment rows. Every entry point
/// validates in one canonical order: parse, normalize, conflict,
/// business hours, service flags, service match, then a transactional
/// commit that re-checks the slot and maps a violated unique index back
/// to the conflict error.
pub struct BookRequest {
    pub timestamp: String,
    pub clientele: Clientele,
    pub flags: ServiceFlags,
    pub notes: Option<String>,
    /// Admin-only: book on behalf of another account.
    pub for_user_id: Option<String>,
    /// Admin-only walk-in customer details.
    pub walk_in_name: Option<String>,
    pub walk_in_phone: Option<String>,
    pub staff_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelMode {
    /// Flip status to cancelled, keeping the row for history.
    Soft,
    /// Remove the row entirely.
    Hard,
}

#[derive(Debug, Serialize)]
pub struct BulkOutcome {
    pub id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BulkOutcome {
    fn ok(id: &str) -> Self {
        Self { id: id.to_string(), ok: true, error: None }
    }

    fn failed(id: &str, err: &AppError) -> Self {
        Self {
            id: id.to_string(),
            ok: false,
            error: Some(err.to_string()),
        }
    }
}

pub fn book(
    conn: &mut Connection,
    actor: &Identity,
    req: &BookRequest,
) -> Result<(Appointment, Service), AppError> {
    let ts = hours::normalize(&req.timestamp)?;

    if !slots::is_slot_free(conn, &ts)? {
        return Err(AppError::SlotConflict);
    }
    if !hours::is_business_open(&ts) {
        return Err(AppError::OutsideBusinessHours);
    }
    if req.flags.none_requested() {
        return Err(AppError::NoServiceSelected);
    }

    let service = matcher::find_service(conn, req.clientele, &req.flags)?;

    let is_admin = actor.role.is_admin();
    let owner_id = match (&req.for_user_id, is_admin) {
        (Some(user_id), true) => {
            queries::get_user_by_id(conn, user_id)?
                .ok_or_else(|| AppError::BadRequest("unknown user for booking".to_string()))?
                .id
        }
        _ => actor.user_id.clone(),
    };

    let now = Utc::now().naive_utc();
    let appt = Appointment {
        id: Uuid::new_v4().to_string(),
        user_id: owner_id,
        service_id: service.id.clone(),
        scheduled_at: ts,
        status: AppointmentStatus::Scheduled,
        notes: req.notes.clone(),
        walk_in_name: if is_admin { req.walk_in_name.clone() } else { None },
        walk_in_phone: if is_admin { req.walk_in_phone.clone() } else { None },
        staff_name: if is_admin { req.staff_name.clone() } else { None },
        reminder_sent: false,
        created_at: now,
        updated_at: now,
    };

    let tx = conn.transaction()?;
    // The pre-check above is the fast path with the friendly error; this
    // re-check plus the unique index closes the check-then-act window.
    if queries::active_appointment_exists_at(&tx, &ts, None)? {
        return Err(AppError::SlotConflict);
    }
    queries::insert_appointment(&tx, &appt).map_err(map_slot_constraint)?;
    tx.commit()?;

    Ok((appt, service))
}

pub fn reschedule(
    conn: &mut Connection,
    actor: &Identity,
    id: &str,
    new_timestamp: &str,
    now_local: NaiveDateTime,
) -> Result<Appointment, AppError> {
    let appt = load_owned(conn, actor, id)?;

    let ts = hours::normalize(new_timestamp)?;

    if !slots::is_slot_free_excluding(conn, &ts, id)? {
        return Err(AppError::SlotConflict);
    }
    if !hours::is_business_open(&ts) {
        return Err(AppError::OutsideBusinessHours);
    }
    if ts == appt.scheduled_at {
        return Err(AppError::NoChange);
    }
    if ts < now_local {
        return Err(AppError::PastDate);
    }

    let tx = conn.transaction()?;
    if queries::active_appointment_exists_at(&tx, &ts, Some(id))? {
        return Err(AppError::SlotConflict);
    }
    queries::update_appointment_time(&tx, id, &ts).map_err(map_slot_constraint)?;
    tx.commit()?;

    queries::get_appointment_by_id(conn, id)?.ok_or(AppError::NotFoundOrForbidden)
}

pub fn cancel(
    conn: &mut Connection,
    actor: &Identity,
    id: &str,
    mode: CancelMode,
) -> Result<(), AppError> {
    load_owned(conn, actor, id)?;

    let changed = match mode {
        CancelMode::Soft => {
            queries::update_appointment_status(conn, id, AppointmentStatus::Cancelled)?
        }
        CancelMode::Hard => queries::delete_appointment(conn, id)?,
    };

    if !changed {
        return Err(AppError::NotFoundOrForbidden);
    }
    Ok(())
}

/// Admin status edit; `completed` is only reachable here. Reactivating a
/// cancelled row can collide with a newer booking on the same slot, which
/// the unique index reports as a conflict.
pub fn set_status(
    conn: &mut Connection,
    id: &str,
    status: AppointmentStatus,
) -> Result<Appointment, AppError> {
    if queries::get_appointment_by_id(conn, id)?.is_none() {
        return Err(AppError::NotFoundOrForbidden);
    }

    queries::update_appointment_status(conn, id, status).map_err(map_slot_constraint)?;
    queries::get_appointment_by_id(conn, id)?.ok_or(AppError::NotFoundOrForbidden)
}

/// Best-effort cancellation across ids; one failed id does not stop the
/// rest. Admin bulk cancels keep rows for history (soft).
pub fn bulk_cancel(conn: &mut Connection, actor: &Identity, ids: &[String]) -> Vec<BulkOutcome> {
    ids.iter()
        .map(|id| match cancel(conn, actor, id, CancelMode::Soft) {
            Ok(()) => BulkOutcome::ok(id),
            Err(err) => BulkOutcome::failed(id, &err),
        })
        .collect()
}

/// Move each appointment to `new_date`, keeping its time-of-day. Hours
/// and conflicts are validated per id; partial success is expected.
pub fn bulk_reschedule(
    conn: &mut Connection,
    actor: &Identity,
    ids: &[String],
    new_date: NaiveDate,
) -> Vec<BulkOutcome> {
    ids.iter()
        .map(|id| match reschedule_to_date(conn, actor, id, new_date) {
            Ok(()) => BulkOutcome::ok(id),
            Err(err) => BulkOutcome::failed(id, &err),
        })
        .collect()
}

fn reschedule_to_date(
    conn: &mut Connection,
    actor: &Identity,
    id: &str,
    new_date: NaiveDate,
) -> Result<(), AppError> {
    let appt = load_owned(conn, actor, id)?;
    let ts = new_date.and_time(appt.scheduled_at.time());

    if !slots::is_slot_free_excluding(conn, &ts, id)? {
        return Err(AppError::SlotConflict);
    }
    if !hours::is_business_open(&ts) {
        return Err(AppError::OutsideBusinessHours);
    }

    let tx = conn.transaction()?;
    if queries::active_appointment_exists_at(&tx, &ts, Some(id))? {
        return Err(AppError::SlotConflict);
    }
    queries::update_appointment_time(&tx, id, &ts).map_err(map_slot_constraint)?;
    tx.commit()?;
    Ok(())
}

/// Ownership is folded into the lookup: a foreign appointment id looks
/// exactly like a missing one to the caller.
fn load_owned(conn: &Connection, actor: &Identity, id: &str) -> Result<Appointment, AppError> {
    let appt = queries::get_appointment_by_id(conn, id)?.ok_or(AppError::NotFoundOrForbidden)?;
    if !actor.can_act_on(&appt.user_id) {
        return Err(AppError::NotFoundOrForbidden);
    }
    Ok(appt)
}

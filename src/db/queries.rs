use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{Appointment, AppointmentStatus, Clientele, Role, Service, ServiceFlags, User};

pub const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

fn parse_ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TS_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Users ──

pub fn create_user(conn: &Connection, user: &User) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO users (id, email, name, role, api_token) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user.id, user.email, user.name, user.role.as_str(), user.api_token],
    )?;
    Ok(())
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT id, email, name, role, api_token FROM users WHERE id = ?1",
        params![id],
        parse_user_row,
    )
    .optional()
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT id, email, name, role, api_token FROM users WHERE email = ?1",
        params![email],
        parse_user_row,
    )
    .optional()
}

pub fn get_user_by_token(conn: &Connection, token: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT id, email, name, role, api_token FROM users WHERE api_token = ?1",
        params![token],
        parse_user_row,
    )
    .optional()
}

fn parse_user_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
    let role_str: String = row.get(3)?;
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        role: Role::parse(&role_str),
        api_token: row.get(4)?,
    })
}

// ── Services ──

pub fn get_all_services(conn: &Connection) -> rusqlite::Result<Vec<Service>> {
    let mut stmt = conn.prepare(
        "SELECT id, clientele, washing, cutting, coloring FROM services
         ORDER BY clientele, cutting DESC, washing DESC, coloring DESC",
    )?;
    let rows = stmt.query_map([], parse_service_row)?;
    rows.collect()
}

pub fn get_services_for_clientele(
    conn: &Connection,
    clientele: Clientele,
) -> rusqlite::Result<Vec<Service>> {
    let mut stmt = conn.prepare(
        "SELECT id, clientele, washing, cutting, coloring FROM services WHERE clientele = ?1",
    )?;
    let rows = stmt.query_map(params![clientele.as_str()], parse_service_row)?;
    rows.collect()
}

pub fn get_service_exact(
    conn: &Connection,
    clientele: Clientele,
    flags: &ServiceFlags,
) -> rusqlite::Result<Option<Service>> {
    conn.query_row(
        "SELECT id, clientele, washing, cutting, coloring FROM services
         WHERE clientele = ?1 AND washing = ?2 AND cutting = ?3 AND coloring = ?4",
        params![clientele.as_str(), flags.washing, flags.cutting, flags.coloring],
        parse_service_row,
    )
    .optional()
}

pub fn get_service_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Service>> {
    conn.query_row(
        "SELECT id, clientele, washing, cutting, coloring FROM services WHERE id = ?1",
        params![id],
        parse_service_row,
    )
    .optional()
}

fn parse_service_row(row: &rusqlite::Row) -> rusqlite::Result<Service> {
    let clientele_str: String = row.get(1)?;
    Ok(Service {
        id: row.get(0)?,
        clientele: Clientele::parse(&clientele_str).unwrap_or(Clientele::Unisex),
        washing: row.get(2)?,
        cutting: row.get(3)?,
        coloring: row.get(4)?,
    })
}

// ── Appointments ──

const APPOINTMENT_COLS: &str = "id, user_id, service_id, scheduled_at, status, notes, \
     walk_in_name, walk_in_phone, staff_name, reminder_sent, created_at, updated_at";

/// Raw insert; the caller maps a unique-index violation on the slot to
/// the conflict error.
pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO appointments (id, user_id, service_id, scheduled_at, status, notes,
             walk_in_name, walk_in_phone, staff_name, reminder_sent, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            appt.id,
            appt.user_id,
            appt.service_id,
            fmt_ts(&appt.scheduled_at),
            appt.status.as_str(),
            appt.notes,
            appt.walk_in_name,
            appt.walk_in_phone,
            appt.staff_name,
            appt.reminder_sent,
            fmt_ts(&appt.created_at),
            fmt_ts(&appt.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_appointment_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Appointment>> {
    conn.query_row(
        &format!("SELECT {APPOINTMENT_COLS} FROM appointments WHERE id = ?1"),
        params![id],
        parse_appointment_row,
    )
    .optional()
}

pub fn get_appointments_for_user(
    conn: &Connection,
    user_id: &str,
) -> rusqlite::Result<Vec<Appointment>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLS} FROM appointments
         WHERE user_id = ?1 AND status != 'cancelled' ORDER BY scheduled_at ASC"
    ))?;
    let rows = stmt.query_map(params![user_id], parse_appointment_row)?;
    rows.collect()
}

pub fn get_all_appointments(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> rusqlite::Result<Vec<Appointment>> {
    match status_filter {
        Some(status) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {APPOINTMENT_COLS} FROM appointments
                 WHERE status = ?1 ORDER BY scheduled_at DESC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![status, limit], parse_appointment_row)?;
            rows.collect()
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {APPOINTMENT_COLS} FROM appointments
                 ORDER BY scheduled_at DESC LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![limit], parse_appointment_row)?;
            rows.collect()
        }
    }
}

/// Scheduled times of active appointments in [start, end), ascending.
pub fn active_times_in_range(
    conn: &Connection,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> rusqlite::Result<Vec<NaiveDateTime>> {
    let mut stmt = conn.prepare(
        "SELECT scheduled_at FROM appointments
         WHERE scheduled_at >= ?1 AND scheduled_at < ?2 AND status != 'cancelled'
         ORDER BY scheduled_at ASC",
    )?;
    let rows = stmt.query_map(params![fmt_ts(start), fmt_ts(end)], |row| {
        let s: String = row.get(0)?;
        Ok(parse_ts(&s))
    })?;
    rows.collect()
}

pub fn active_appointment_exists_at(
    conn: &Connection,
    ts: &NaiveDateTime,
    exclude_id: Option<&str>,
) -> rusqlite::Result<bool> {
    let count: i64 = match exclude_id {
        Some(id) => conn.query_row(
            "SELECT COUNT(*) FROM appointments
             WHERE scheduled_at = ?1 AND status != 'cancelled' AND id != ?2",
            params![fmt_ts(ts), id],
            |row| row.get(0),
        )?,
        None => conn.query_row(
            "SELECT COUNT(*) FROM appointments
             WHERE scheduled_at = ?1 AND status != 'cancelled'",
            params![fmt_ts(ts)],
            |row| row.get(0),
        )?,
    };
    Ok(count > 0)
}

/// Raw update; unique-index violations are the caller's to map, same as
/// inserts.
pub fn update_appointment_time(
    conn: &Connection,
    id: &str,
    new_ts: &NaiveDateTime,
) -> rusqlite::Result<bool> {
    let now = Utc::now().naive_utc();
    let count = conn.execute(
        "UPDATE appointments SET scheduled_at = ?1, updated_at = ?2 WHERE id = ?3",
        params![fmt_ts(new_ts), fmt_ts(&now), id],
    )?;
    Ok(count > 0)
}

pub fn update_appointment_status(
    conn: &Connection,
    id: &str,
    status: AppointmentStatus,
) -> rusqlite::Result<bool> {
    let now = Utc::now().naive_utc();
    let count = conn.execute(
        "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), fmt_ts(&now), id],
    )?;
    Ok(count > 0)
}

pub fn delete_appointment(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let count = conn.execute("DELETE FROM appointments WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_appointment_row(row: &rusqlite::Row) -> rusqlite::Result<Appointment> {
    let scheduled_at_str: String = row.get(3)?;
    let status_str: String = row.get(4)?;
    let created_at_str: String = row.get(10)?;
    let updated_at_str: String = row.get(11)?;

    Ok(Appointment {
        id: row.get(0)?,
        user_id: row.get(1)?,
        service_id: row.get(2)?,
        scheduled_at: parse_ts(&scheduled_at_str),
        status: AppointmentStatus::parse(&status_str),
        notes: row.get(5)?,
        walk_in_name: row.get(6)?,
        walk_in_phone: row.get(7)?,
        staff_name: row.get(8)?,
        reminder_sent: row.get(9)?,
        created_at: parse_ts(&created_at_str),
        updated_at: parse_ts(&updated_at_str),
    })
}

// ── Reminders ──

/// Active appointments in [start, end) whose reminder flag is unset,
/// joined to the owner's email.
pub fn due_reminders(
    conn: &Connection,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> rusqlite::Result<Vec<(Appointment, Option<String>)>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.user_id, a.service_id, a.scheduled_at, a.status, a.notes,
                a.walk_in_name, a.walk_in_phone, a.staff_name, a.reminder_sent,
                a.created_at, a.updated_at, u.email
         FROM appointments a
         JOIN users u ON u.id = a.user_id
         WHERE a.scheduled_at >= ?1 AND a.scheduled_at < ?2
           AND a.status != 'cancelled' AND a.reminder_sent = 0
         ORDER BY a.scheduled_at ASC",
    )?;
    let rows = stmt.query_map(params![fmt_ts(start), fmt_ts(end)], |row| {
        let appt = parse_appointment_row(row)?;
        let email: Option<String> = row.get(12)?;
        Ok((appt, email))
    })?;
    rows.collect()
}

/// Compare-and-set: flips the flag only if still unset, so overlapping
/// sweep runs cannot both claim the same appointment.
pub fn mark_reminder_sent(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE appointments SET reminder_sent = 1 WHERE id = ?1 AND reminder_sent = 0",
        params![id],
    )?;
    Ok(count > 0)
}

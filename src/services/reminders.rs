use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::services::notify::{AppointmentSummary, NotificationProvider};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReminderSummary {
    pub considered: usize,
    pub sent: usize,
    pub failed: usize,
}

/// One reminder sweep over the current salon-local day.
///
/// Finds active appointments in today's [00:00, 24:00) window whose flag
/// is unset, dispatches each reminder, and flips the flag only after a
/// successful send, via a conditional update so an overlapping run never
/// claims the same appointment twice. Failures are counted and skipped;
/// there is no in-run retry. Zero due appointments is a normal no-op.
pub async fn run_once(
    db: &Arc<Mutex<Connection>>,
    notifier: &dyn NotificationProvider,
    now_local: NaiveDateTime,
) -> ReminderSummary {
    let day_start = now_local.date().and_hms_opt(0, 0, 0).unwrap_or(now_local);
    let day_end = day_start + Duration::days(1);

    let due = {
        let conn = db.lock().unwrap();
        match collect_due(&conn, &day_start, &day_end) {
            Ok(due) => due,
            Err(err) => {
                tracing::error!("reminder sweep query failed: {err}");
                return ReminderSummary::default();
            }
        }
    };

    let considered = due.len();
    let mut sent = 0;
    let mut failed = 0;

    for item in due {
        let Some(email) = item.email.filter(|e| !e.trim().is_empty()) else {
            tracing::warn!("no notification address for appointment {}", item.id);
            failed += 1;
            continue;
        };

        match notifier.send_appointment_reminder(&email, &item.summary).await {
            Ok(()) => {
                let conn = db.lock().unwrap();
                match queries::mark_reminder_sent(&conn, &item.id) {
                    Ok(true) => sent += 1,
                    // Flag already set: a concurrent run claimed it.
                    Ok(false) => {}
                    Err(err) => {
                        tracing::warn!("failed to flag reminder for {}: {err}", item.id);
                        failed += 1;
                    }
                }
            }
            Err(err) => {
                tracing::warn!("reminder notification failed for {}: {err}", item.id);
                failed += 1;
            }
        }
    }

    tracing::info!(considered, sent, failed, "reminder sweep complete");
    ReminderSummary { considered, sent, failed }
}

struct DueReminder {
    id: String,
    email: Option<String>,
    summary: AppointmentSummary,
}

fn collect_due(
    conn: &Connection,
    day_start: &NaiveDateTime,
    day_end: &NaiveDateTime,
) -> rusqlite::Result<Vec<DueReminder>> {
    let due = queries::due_reminders(conn, day_start, day_end)?;

    let mut out = Vec::with_capacity(due.len());
    for (appt, email) in due {
        let service = queries::get_service_by_id(conn, &appt.service_id)?;
        let service_label = service
            .map(|s| s.label())
            .unwrap_or_else(|| "appointment".to_string());

        out.push(DueReminder {
            id: appt.id.clone(),
            email,
            summary: AppointmentSummary {
                when: appt.scheduled_at.format("%A %H:%M").to_string(),
                service: service_label,
                notes: appt.notes.clone(),
            },
        });
    }
    Ok(out)
}

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Appointment, Clientele, Service, ServiceFlags};
use crate::services::booking::{self, BookRequest, CancelMode};
use crate::services::notify::AppointmentSummary;
use crate::services::{calendar, hours, slots};
use crate::state::AppState;

#[derive(Serialize)]
pub struct AppointmentResponse {
    pub id: String,
    pub user_id: String,
    pub service_id: String,
    pub scheduled_at: String,
    pub status: String,
    pub notes: Option<String>,
    pub walk_in_name: Option<String>,
    pub walk_in_phone: Option<String>,
    pub staff_name: Option<String>,
    pub reminder_sent: bool,
}

impl From<Appointment> for AppointmentResponse {
    fn from(a: Appointment) -> Self {
        Self {
            id: a.id,
            user_id: a.user_id,
            service_id: a.service_id,
            scheduled_at: queries::fmt_ts(&a.scheduled_at),
            status: a.status.as_str().to_string(),
            notes: a.notes,
            walk_in_name: a.walk_in_name,
            walk_in_phone: a.walk_in_phone,
            staff_name: a.staff_name,
            reminder_sent: a.reminder_sent,
        }
    }
}

fn summary_for(appt: &Appointment, service: &Service) -> AppointmentSummary {
    AppointmentSummary {
        when: appt.scheduled_at.format("%A, %d %B %Y at %H:%M").to_string(),
        service: service.label(),
        notes: appt.notes.clone(),
    }
}

// GET /api/services
pub async fn list_services(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Service>>, AppError> {
    let conn = state.db.lock().unwrap();
    Ok(Json(queries::get_all_services(&conn)?))
}

// GET /api/slots?date=YYYY-MM-DD
#[derive(Deserialize)]
pub struct SlotsQuery {
    pub date: String,
}

#[derive(Serialize)]
pub struct SlotsResponse {
    pub date: String,
    pub booked: Vec<String>,
}

pub async fn get_slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, AppError> {
    let date = NaiveDate::parse_from_str(&query.date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("date must be YYYY-MM-DD".to_string()))?;

    let booked = {
        let conn = state.db.lock().unwrap();
        slots::list_booked_times(&conn, date)?
    };

    Ok(Json(SlotsResponse { date: query.date, booked }))
}

// POST /api/book
#[derive(Deserialize)]
pub struct BookBody {
    pub timestamp: String,
    pub clientele: String,
    #[serde(default)]
    pub washing: bool,
    #[serde(default)]
    pub cutting: bool,
    #[serde(default)]
    pub coloring: bool,
    pub notes: Option<String>,
}

pub async fn book(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<BookBody>,
) -> Result<(StatusCode, Json<AppointmentResponse>), AppError> {
    let clientele = Clientele::parse(&body.clientele)
        .ok_or_else(|| AppError::BadRequest("clientele must be male, female or unisex".to_string()))?;

    let req = BookRequest {
        timestamp: body.timestamp,
        clientele,
        flags: ServiceFlags {
            washing: body.washing,
            cutting: body.cutting,
            coloring: body.coloring,
        },
        notes: body.notes,
        for_user_id: None,
        walk_in_name: None,
        walk_in_phone: None,
        staff_name: None,
    };

    let (appt, service, email) = {
        let mut conn = state.db.lock().unwrap();
        let actor = auth::authenticate(&conn, &headers)?;
        let (appt, service) = booking::book(&mut conn, &actor, &req)?;
        let email = queries::get_user_by_id(&conn, &appt.user_id)?.map(|u| u.email);
        (appt, service, email)
    };

    // Fire-and-forget: a failed confirmation never fails the booking.
    if let Some(email) = email {
        let summary = summary_for(&appt, &service);
        if let Err(err) = state.notifier.send_booking_confirmation(&email, &summary).await {
            tracing::warn!("booking confirmation failed for {}: {err}", appt.id);
        }
    }

    Ok((StatusCode::CREATED, Json(appt.into())))
}

// GET /api/my-appointments
pub async fn my_appointments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<AppointmentResponse>>, AppError> {
    let conn = state.db.lock().unwrap();
    let actor = auth::authenticate(&conn, &headers)?;
    let appointments = queries::get_appointments_for_user(&conn, &actor.user_id)?;
    Ok(Json(appointments.into_iter().map(Into::into).collect()))
}

// PUT /api/appointments/:id/reschedule
#[derive(Deserialize)]
pub struct RescheduleBody {
    pub timestamp: String,
}

pub async fn reschedule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<RescheduleBody>,
) -> Result<Json<AppointmentResponse>, AppError> {
    let mut conn = state.db.lock().unwrap();
    let actor = auth::authenticate(&conn, &headers)?;
    let appt = booking::reschedule(&mut conn, &actor, &id, &body.timestamp, hours::now_local())?;
    Ok(Json(appt.into()))
}

// DELETE /api/appointments/:id
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut conn = state.db.lock().unwrap();
    let actor = auth::authenticate(&conn, &headers)?;
    booking::cancel(&mut conn, &actor, &id, CancelMode::Soft)?;
    Ok(Json(serde_json::json!({ "cancelled": true })))
}

// GET /api/appointments/:id/calendar.ics
pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let ics = {
        let conn = state.db.lock().unwrap();
        let actor = auth::authenticate(&conn, &headers)?;

        let appt =
            queries::get_appointment_by_id(&conn, &id)?.ok_or(AppError::NotFoundOrForbidden)?;
        if !actor.can_act_on(&appt.user_id) {
            return Err(AppError::NotFoundOrForbidden);
        }

        let label = queries::get_service_by_id(&conn, &appt.service_id)?
            .map(|s| s.label())
            .unwrap_or_else(|| "appointment".to_string());
        calendar::generate_ics(&appt, &label)
    };

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"appointment.ics\"",
            ),
        ],
        ics,
    )
        .into_response())
}

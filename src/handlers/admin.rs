use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::appointments::AppointmentResponse;
use crate::models::{AppointmentStatus, Clientele, ServiceFlags};
use crate::services::booking::{self, BookRequest, BulkOutcome, CancelMode};
use crate::services::{hours, reminders};
use crate::state::AppState;

// GET /api/admin/appointments?status=&limit=
#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<AppointmentResponse>>, AppError> {
    let conn = state.db.lock().unwrap();
    let actor = auth::authenticate(&conn, &headers)?;
    auth::require_admin(&actor)?;

    let limit = query.limit.unwrap_or(100);
    let appointments = queries::get_all_appointments(&conn, query.status.as_deref(), limit)?;
    Ok(Json(appointments.into_iter().map(Into::into).collect()))
}

// POST /api/admin/appointments
#[derive(Deserialize)]
pub struct WalkInBody {
    pub timestamp: String,
    pub clientele: String,
    #[serde(default)]
    pub washing: bool,
    #[serde(default)]
    pub cutting: bool,
    #[serde(default)]
    pub coloring: bool,
    pub notes: Option<String>,
    pub user_id: Option<String>,
    pub walk_in_name: Option<String>,
    pub walk_in_phone: Option<String>,
    pub staff_name: Option<String>,
}

pub async fn book_walk_in(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<WalkInBody>,
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
        for_user_id: body.user_id,
        walk_in_name: body.walk_in_name,
        walk_in_phone: body.walk_in_phone,
        staff_name: body.staff_name,
    };

    let mut conn = state.db.lock().unwrap();
    let actor = auth::authenticate(&conn, &headers)?;
    auth::require_admin(&actor)?;

    let (appt, _service) = booking::book(&mut conn, &actor, &req)?;
    Ok((StatusCode::CREATED, Json(appt.into())))
}

// PUT /api/admin/appointments/:id/reschedule
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
    auth::require_admin(&actor)?;

    let appt = booking::reschedule(&mut conn, &actor, &id, &body.timestamp, hours::now_local())?;
    Ok(Json(appt.into()))
}

// DELETE /api/admin/appointments/:id
pub async fn delete_appointment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut conn = state.db.lock().unwrap();
    let actor = auth::authenticate(&conn, &headers)?;
    auth::require_admin(&actor)?;

    booking::cancel(&mut conn, &actor, &id, CancelMode::Hard)?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

// POST /api/admin/appointments/:id/status
#[derive(Deserialize)]
pub struct StatusBody {
    pub status: String,
}

pub async fn set_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> Result<Json<AppointmentResponse>, AppError> {
    let status = AppointmentStatus::try_parse(&body.status).ok_or_else(|| {
        AppError::BadRequest("status must be scheduled, pending, completed or cancelled".to_string())
    })?;

    let mut conn = state.db.lock().unwrap();
    let actor = auth::authenticate(&conn, &headers)?;
    auth::require_admin(&actor)?;

    let appt = booking::set_status(&mut conn, &id, status)?;
    Ok(Json(appt.into()))
}

// POST /api/admin/bulk/cancel
#[derive(Deserialize)]
pub struct BulkCancelBody {
    pub ids: Vec<String>,
}

pub async fn bulk_cancel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<BulkCancelBody>,
) -> Result<Json<Vec<BulkOutcome>>, AppError> {
    let mut conn = state.db.lock().unwrap();
    let actor = auth::authenticate(&conn, &headers)?;
    auth::require_admin(&actor)?;

    Ok(Json(booking::bulk_cancel(&mut conn, &actor, &body.ids)))
}

// POST /api/admin/bulk/reschedule
#[derive(Deserialize)]
pub struct BulkRescheduleBody {
    pub ids: Vec<String>,
    pub new_date: String,
}

pub async fn bulk_reschedule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<BulkRescheduleBody>,
) -> Result<Json<Vec<BulkOutcome>>, AppError> {
    let new_date = NaiveDate::parse_from_str(&body.new_date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("new_date must be YYYY-MM-DD".to_string()))?;

    let mut conn = state.db.lock().unwrap();
    let actor = auth::authenticate(&conn, &headers)?;
    auth::require_admin(&actor)?;

    Ok(Json(booking::bulk_reschedule(&mut conn, &actor, &body.ids, new_date)))
}

// POST /api/admin/reminders/run
pub async fn run_reminders(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    {
        let conn = state.db.lock().unwrap();
        let actor = auth::authenticate(&conn, &headers)?;
        auth::require_admin(&actor)?;
    }

    let summary = reminders::run_once(&state.db, state.notifier.as_ref(), hours::now_local()).await;
    Ok(Json(serde_json::json!({
        "considered": summary.considered,
        "sent": summary.sent,
        "failed": summary.failed,
    })))
}

pub mod admin;
pub mod appointments;
pub mod auth;
pub mod health;

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/services", get(appointments::list_services))
        .route("/api/slots", get(appointments::get_slots))
        .route("/api/book", post(appointments::book))
        .route("/api/my-appointments", get(appointments::my_appointments))
        .route(
            "/api/appointments/:id/reschedule",
            put(appointments::reschedule),
        )
        .route("/api/appointments/:id", delete(appointments::cancel))
        .route(
            "/api/appointments/:id/calendar.ics",
            get(appointments::download_ics),
        )
        .route(
            "/api/admin/appointments",
            get(admin::list_appointments).post(admin::book_walk_in),
        )
        .route(
            "/api/admin/appointments/:id/reschedule",
            put(admin::reschedule),
        )
        .route("/api/admin/appointments/:id", delete(admin::delete_appointment))
        .route("/api/admin/appointments/:id/status", post(admin::set_status))
        .route("/api/admin/bulk/cancel", post(admin::bulk_cancel))
        .route("/api/admin/bulk/reschedule", post(admin::bulk_reschedule))
        .route("/api/admin/reminders/run", post(admin::run_reminders))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

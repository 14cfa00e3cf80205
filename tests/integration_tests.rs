use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use salonbook::config::AppConfig;
use salonbook::db;
use salonbook::handlers;
use salonbook::services::notify::{AppointmentSummary, NotificationProvider};
use salonbook::state::AppState;

// ── Mock Notifier ──

struct MockNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl NotificationProvider for MockNotifier {
    async fn send_booking_confirmation(
        &self,
        to: &str,
        summary: &AppointmentSummary,
    ) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), summary.confirmation_text()));
        Ok(())
    }

    async fn send_appointment_reminder(
        &self,
        to: &str,
        summary: &AppointmentSummary,
    ) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), summary.reminder_text()));
        Ok(())
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        mail_api_url: "http://localhost:0".to_string(),
        mail_api_key: "".to_string(),
        mail_from: "salon@example.com".to_string(),
        reminder_interval_secs: 3600,
    }
}

fn test_state() -> (Arc<AppState>, Arc<Mutex<Vec<(String, String)>>>) {
    let conn = db::init_db(":memory:").unwrap();
    // One admin account, known token.
    conn.execute(
        "INSERT INTO users (id, email, name, role, api_token)
         VALUES ('boss', 'boss@example.com', 'Boss', 'admin', 'admin-token')",
        [],
    )
    .unwrap();

    let sent = Arc::new(Mutex::new(vec![]));
    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: test_config(),
        notifier: Box::new(MockNotifier { sent: Arc::clone(&sent) }),
    });
    (state, sent)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn register(state: &Arc<AppState>, email: &str) -> String {
    let app = handlers::router(Arc::clone(state));
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            serde_json::json!({ "email": email, "name": "Test Customer" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["token"].as_str().unwrap().to_string()
}

fn book_body(timestamp: &str) -> serde_json::Value {
    serde_json::json!({
        "timestamp": timestamp,
        "clientele": "male",
        "cutting": true,
    })
}

// All booked timestamps below are Tuesdays (or the named day) in 2030,
// safely in the future for the reschedule past-date check.

#[tokio::test]
async fn register_then_duplicate_email_conflicts() {
    let (state, _) = test_state();
    register(&state, "cust@example.com").await;

    let app = handlers::router(Arc::clone(&state));
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            serde_json::json!({ "email": "cust@example.com", "name": "Again" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn booking_requires_authentication() {
    let (state, _) = test_state();
    let app = handlers::router(state);
    let response = app
        .oneshot(json_request("POST", "/api/book", None, book_body("2030-06-18 10:00")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn book_flow_with_confirmation_and_slot_listing() {
    let (state, sent) = test_state();
    let token = register(&state, "cust@example.com").await;

    let app = handlers::router(Arc::clone(&state));
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/book",
            Some(&token),
            book_body("2030-06-18 10:00"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["status"], "scheduled");
    assert_eq!(json["scheduled_at"], "2030-06-18 10:00:00");

    // Confirmation went to the registered address.
    {
        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "cust@example.com");
    }

    // The slot grid now reports the time as booked.
    let app = handlers::router(Arc::clone(&state));
    let response = app
        .oneshot(get_request("/api/slots?date=2030-06-18", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["booked"], serde_json::json!(["10:00"]));
}

#[tokio::test]
async fn double_booking_returns_conflict() {
    let (state, _) = test_state();
    let token = register(&state, "cust@example.com").await;

    let app = handlers::router(Arc::clone(&state));
    let response = app
        .oneshot(json_request("POST", "/api/book", Some(&token), book_body("2030-06-18 10:00")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let app = handlers::router(Arc::clone(&state));
    let response = app
        .oneshot(json_request("POST", "/api/book", Some(&token), book_body("2030-06-18 10:00")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn booking_on_a_closed_day_is_rejected() {
    let (state, _) = test_state();
    let token = register(&state, "cust@example.com").await;

    // 2030-06-16 is a Sunday.
    let app = handlers::router(state);
    let response = app
        .oneshot(json_request("POST", "/api/book", Some(&token), book_body("2030-06-16 10:00")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reschedule_and_cancel_free_slots_over_http() {
    let (state, _) = test_state();
    let token = register(&state, "cust@example.com").await;

    let app = handlers::router(Arc::clone(&state));
    let response = app
        .oneshot(json_request("POST", "/api/book", Some(&token), book_body("2030-06-18 10:00")))
        .await
        .unwrap();
    let id = body_json(response).await["id"].as_str().unwrap().to_string();

    let app = handlers::router(Arc::clone(&state));
    let response = app
        .oneshot(json_request(
            "PUT",
            &format!("/api/appointments/{id}/reschedule"),
            Some(&token),
            serde_json::json!({ "timestamp": "2030-06-18 14:00" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The old slot is bookable again.
    let app = handlers::router(Arc::clone(&state));
    let response = app
        .oneshot(json_request("POST", "/api/book", Some(&token), book_body("2030-06-18 10:00")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Cancel and re-book the rescheduled slot.
    let app = handlers::router(Arc::clone(&state));
    let response = app
        .oneshot(json_request(
            "DELETE",
            &format!("/api/appointments/{id}"),
            Some(&token),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let app = handlers::router(Arc::clone(&state));
    let response = app
        .oneshot(json_request("POST", "/api/book", Some(&token), book_body("2030-06-18 14:00")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn admin_routes_reject_plain_users() {
    let (state, _) = test_state();
    let token = register(&state, "cust@example.com").await;

    let app = handlers::router(state);
    let response = app
        .oneshot(get_request("/api/admin/appointments", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_bulk_cancel_reports_partial_success() {
    let (state, _) = test_state();
    let token = register(&state, "cust@example.com").await;

    let app = handlers::router(Arc::clone(&state));
    let response = app
        .oneshot(json_request("POST", "/api/book", Some(&token), book_body("2030-06-18 10:00")))
        .await
        .unwrap();
    let id = body_json(response).await["id"].as_str().unwrap().to_string();

    let app = handlers::router(Arc::clone(&state));
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/admin/bulk/cancel",
            Some("admin-token"),
            serde_json::json!({ "ids": [id, "missing"] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json[0]["ok"], true);
    assert_eq!(json[1]["ok"], false);
}

#[tokio::test]
async fn admin_walk_in_booking_carries_customer_details() {
    let (state, _) = test_state();

    let app = handlers::router(Arc::clone(&state));
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/admin/appointments",
            Some("admin-token"),
            serde_json::json!({
                "timestamp": "2030-06-18 11:00",
                "clientele": "female",
                "cutting": true,
                "washing": true,
                "walk_in_name": "Ana",
                "walk_in_phone": "+38640111222",
                "staff_name": "Maja",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["walk_in_name"], "Ana");
    assert_eq!(json["staff_name"], "Maja");
}

#[tokio::test]
async fn manual_reminder_run_reports_a_summary() {
    let (state, _) = test_state();

    let app = handlers::router(state);
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/admin/reminders/run",
            Some("admin-token"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["considered"], 0);
    assert_eq!(json["sent"], 0);
    assert_eq!(json["failed"], 0);
}

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Role, User};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub token: String,
}

// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let email = req.email.trim().to_lowercase();
    let name = req.name.trim().to_string();

    if email.is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest("a valid email is required".to_string()));
    }
    if name.is_empty() {
        return Err(AppError::BadRequest("a name is required".to_string()));
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        email,
        name,
        role: Role::User,
        api_token: Uuid::new_v4().to_string(),
    };

    {
        let conn = state.db.lock().unwrap();
        if queries::get_user_by_email(&conn, &user.email)?.is_some() {
            return Err(AppError::EmailTaken);
        }
        // The UNIQUE constraint backstops a raced duplicate registration.
        queries::create_user(&conn, &user).map_err(|e| {
            if crate::errors::is_unique_violation(&e) {
                AppError::EmailTaken
            } else {
                AppError::Database(e)
            }
        })?;
    }

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role.as_str().to_string(),
            token: user.api_token,
        }),
    ))
}

use axum::http::HeaderMap;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Role;

/// The resolved caller: all the booking engine needs is an id and a role.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

impl Identity {
    pub fn can_act_on(&self, owner_id: &str) -> bool {
        self.role.is_admin() || self.user_id == owner_id
    }
}

/// Resolve `Authorization: Bearer <token>` against the users table.
pub fn authenticate(conn: &Connection, headers: &HeaderMap) -> Result<Identity, AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() {
        return Err(AppError::Unauthorized);
    }

    let user = queries::get_user_by_token(conn, token)?.ok_or(AppError::Unauthorized)?;

    Ok(Identity {
        user_id: user.id,
        role: user.role,
    })
}

pub fn require_admin(identity: &Identity) -> Result<(), AppError> {
    if identity.role.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

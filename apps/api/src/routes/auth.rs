//! Staff login.

use axum::extract::State;
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};
use stayhub_db::Staff;
use tracing::{info, warn};

use super::ApiJson;
use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub staff: Staff,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::InvalidRequest(
            "username and password are required".to_string(),
        ));
    }

    let staff = match state.db.staff().authenticate(req.username.trim(), &req.password).await? {
        Some(staff) => staff,
        None => {
            warn!(username = %req.username, "Login failed");
            return Err(ApiError::Unauthorized("Invalid username or password".to_string()));
        }
    };

    let token = state.jwt.generate_token(&staff)?;
    info!(staff_id = %staff.id, role = %staff.role, "Staff logged in");

    Ok(ApiResponse::ok(LoginResponse {
        token,
        token_type: "Bearer",
        expires_in: state.jwt.lifetime_secs(),
        staff,
    }))
}

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use crate::error::ApiResponse;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub database: bool,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<AppState>) -> ApiResponse<Health> {
    let database = state.db.health_check().await;
    ApiResponse::ok(Health {
        status: if database { "ok" } else { "degraded" },
        database,
    })
}

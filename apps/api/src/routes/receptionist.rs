//! Front desk transitions: check-in, check-out, cancel.

use axum::extract::{Path, State};
use axum::routing::post;
use axum::Router;
use serde::Deserialize;
use stayhub_core::Booking;
use stayhub_db::{CheckInRequest, CheckOutRequest};

use super::ApiJson;
use crate::auth::CurrentActor;
use crate::error::{ApiResponse, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CancelBody {
    pub reason: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/receptionist/check-in/{booking_id}", post(check_in))
        .route("/receptionist/check-out/{booking_id}", post(check_out))
        .route("/receptionist/cancel/{booking_id}", post(cancel))
}

async fn check_in(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(booking_id): Path<String>,
    ApiJson(req): ApiJson<CheckInRequest>,
) -> ApiResult<Booking> {
    let booking = state.lifecycle.check_in(&actor, &booking_id, req).await?;
    Ok(ApiResponse::ok(booking).with_message("Guest checked in"))
}

async fn check_out(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(booking_id): Path<String>,
    ApiJson(req): ApiJson<CheckOutRequest>,
) -> ApiResult<Booking> {
    let booking = state.lifecycle.check_out(&actor, &booking_id, req).await?;
    Ok(ApiResponse::ok(booking).with_message("Guest checked out"))
}

async fn cancel(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(booking_id): Path<String>,
    ApiJson(body): ApiJson<CancelBody>,
) -> ApiResult<Booking> {
    let booking = state.lifecycle.cancel(&actor, &booking_id, &body.reason).await?;
    Ok(ApiResponse::ok(booking).with_message("Booking cancelled"))
}

//! Booking intake, lookup and the simple status transitions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use stayhub_core::{Booking, BookingModification, Capability, CoreError, PaymentStatus};
use stayhub_db::{BookingDetails, Invoice, ModificationRequest, NewBooking};

use super::ApiJson;
use crate::auth::CurrentActor;
use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PaymentStatusBody {
    pub payment_status: PaymentStatus,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/{id}", get(get_booking))
        .route("/bookings/{id}/invoice", get(invoice))
        .route("/bookings/{id}/confirm", post(confirm))
        .route("/bookings/{id}/payment-status", post(payment_status))
        .route("/bookings/{id}/complete", post(complete))
        .route(
            "/bookings/{id}/modifications",
            get(list_modifications).post(request_modification),
        )
}

async fn create_booking(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(req): ApiJson<NewBooking>,
) -> Result<(StatusCode, ApiResponse<BookingDetails>), ApiError> {
    let details = state.reservations.create_booking(&actor, req).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(details).with_message("Booking created"),
    ))
}

async fn get_booking(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<BookingDetails> {
    actor.require(Capability::PaymentStatus)?;
    let details = state
        .db
        .bookings()
        .details(&id)
        .await?
        .ok_or_else(|| CoreError::not_found("Booking", id))?;
    Ok(ApiResponse::ok(details))
}

async fn invoice(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Invoice> {
    Ok(ApiResponse::ok(state.lifecycle.invoice(&actor, &id).await?))
}

async fn confirm(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Booking> {
    let booking = state.lifecycle.confirm(&actor, &id).await?;
    Ok(ApiResponse::ok(booking).with_message("Booking confirmed"))
}

async fn payment_status(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<PaymentStatusBody>,
) -> ApiResult<Booking> {
    let booking = state
        .reservations
        .update_payment_status(&actor, &id, body.payment_status)
        .await?;
    Ok(ApiResponse::ok(booking))
}

async fn complete(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Booking> {
    let booking = state.lifecycle.complete(&actor, &id).await?;
    Ok(ApiResponse::ok(booking).with_message("Booking completed"))
}

async fn request_modification(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ModificationRequest>,
) -> Result<(StatusCode, ApiResponse<BookingModification>), ApiError> {
    let modification = state.modifications.request(&actor, &id, req).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(modification).with_message("Modification requested"),
    ))
}

async fn list_modifications(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Vec<BookingModification>> {
    actor.require(Capability::PaymentStatus)?;
    Ok(ApiResponse::ok(state.modifications.for_booking(&id).await?))
}

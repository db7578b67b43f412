//! Admin surface: checkout overrides, rate confirmation, reversal, history
//! and modification review.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use stayhub_core::{
    AdminOverride, AuditLogEntry, BookingModification, CheckoutConfirmation, Money,
    OverrideStatus, OverrideType,
};
use stayhub_db::{
    AuditFilter, OverrideFilter, OverrideOutcome, OverrideRequest, Page, PageRequest,
    ReversalOutcome,
};

use super::{ApiJson, ApiQuery};
use crate::auth::CurrentActor;
use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ConfirmRateBody {
    pub booking_id: String,
    pub final_amount: Money,
    pub confirmation_note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReverseBody {
    pub reversal_reason: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewBody {
    pub review_note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectBody {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct OverrideQuery {
    pub status: Option<OverrideStatus>,
    pub override_type: Option<OverrideType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmationQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub action: Option<String>,
    pub entity_id: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/checkout/override", post(apply_override))
        .route("/admin/checkout/confirm-rate", post(confirm_rate))
        .route("/admin/overrides", get(list_overrides))
        .route("/admin/overrides/{override_id}/reverse", post(reverse_override))
        .route("/admin/confirmations", get(list_confirmations))
        .route("/admin/audit-logs", get(list_audit_logs))
        .route("/admin/modifications/{modification_id}/approve", post(approve_modification))
        .route("/admin/modifications/{modification_id}/reject", post(reject_modification))
}

async fn apply_override(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(req): ApiJson<OverrideRequest>,
) -> Result<(StatusCode, ApiResponse<OverrideOutcome>), ApiError> {
    let outcome = state.overrides.apply_override(&actor, req).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(outcome).with_message("Checkout amount overridden"),
    ))
}

async fn confirm_rate(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(body): ApiJson<ConfirmRateBody>,
) -> ApiResult<CheckoutConfirmation> {
    let confirmation = state
        .overrides
        .confirm_rate(
            &actor,
            &body.booking_id,
            body.final_amount,
            body.confirmation_note.as_deref(),
        )
        .await?;
    Ok(ApiResponse::ok(confirmation).with_message("Rate confirmed"))
}

async fn reverse_override(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(override_id): Path<String>,
    ApiJson(body): ApiJson<ReverseBody>,
) -> ApiResult<ReversalOutcome> {
    let outcome = state
        .overrides
        .reverse_override(&actor, &override_id, &body.reversal_reason)
        .await?;
    Ok(ApiResponse::ok(outcome).with_message("Override reversed"))
}

async fn list_overrides(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(q): ApiQuery<OverrideQuery>,
) -> ApiResult<Page<AdminOverride>> {
    let filter = OverrideFilter {
        status: q.status,
        override_type: q.override_type,
        from: q.from,
        to: q.to,
    };
    let page = PageRequest {
        page: q.page,
        per_page: q.per_page,
    };
    Ok(ApiResponse::ok(state.history.list_overrides(&actor, &filter, page).await?))
}

async fn list_confirmations(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(q): ApiQuery<ConfirmationQuery>,
) -> ApiResult<Page<CheckoutConfirmation>> {
    let page = PageRequest {
        page: q.page,
        per_page: q.per_page,
    };
    let confirmations = state
        .history
        .list_confirmations(&actor, q.from, q.to, page)
        .await?;
    Ok(ApiResponse::ok(confirmations))
}

async fn list_audit_logs(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(q): ApiQuery<AuditQuery>,
) -> ApiResult<Page<AuditLogEntry>> {
    let filter = AuditFilter {
        action: q.action,
        entity_id: q.entity_id,
    };
    let page = PageRequest {
        page: q.page,
        per_page: q.per_page,
    };
    Ok(ApiResponse::ok(state.history.list_audit_logs(&actor, &filter, page).await?))
}

async fn approve_modification(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(modification_id): Path<String>,
    ApiJson(body): ApiJson<ReviewBody>,
) -> ApiResult<BookingModification> {
    let modification = state
        .modifications
        .approve(&actor, &modification_id, body.review_note.as_deref())
        .await?;
    Ok(ApiResponse::ok(modification).with_message("Modification approved"))
}

async fn reject_modification(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(modification_id): Path<String>,
    ApiJson(body): ApiJson<RejectBody>,
) -> ApiResult<BookingModification> {
    let modification = state
        .modifications
        .reject(&actor, &modification_id, &body.reason)
        .await?;
    Ok(ApiResponse::ok(modification).with_message("Modification rejected"))
}

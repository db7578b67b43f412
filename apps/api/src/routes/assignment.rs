//! Manual and automatic room assignment.

use axum::extract::State;
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};
use stayhub_core::{Room, RoomBookingWithRoom};
use stayhub_db::{AssignRequest, AutoAssignPreferences, UnassignOutcome};

use super::ApiJson;
use crate::auth::CurrentActor;
use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AutoAssignBody {
    pub booking_id: String,
    #[serde(default)]
    pub preferences: AutoAssignPreferences,
}

#[derive(Debug, Serialize)]
pub struct AutoAssigned {
    pub inventory_id: String,
    pub room: Room,
    pub room_booking: RoomBookingWithRoom,
}

#[derive(Debug, Deserialize)]
pub struct UnassignBody {
    pub booking_id: String,
    pub reason: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/room-assignment/assign", post(assign))
        .route("/room-assignment/auto-assign", post(auto_assign))
        .route("/room-assignment/unassign", post(unassign))
}

async fn assign(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(req): ApiJson<AssignRequest>,
) -> ApiResult<RoomBookingWithRoom> {
    let assigned = state.assignments.assign(&actor, req).await?;
    Ok(ApiResponse::ok(assigned).with_message("Room assigned"))
}

async fn auto_assign(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(body): ApiJson<AutoAssignBody>,
) -> ApiResult<AutoAssigned> {
    let assigned = state
        .assignments
        .auto_assign(&actor, &body.booking_id, body.preferences)
        .await?;
    let room = assigned
        .room
        .clone()
        .ok_or_else(|| ApiError::Internal("assigned room booking has no room".to_string()))?;

    Ok(ApiResponse::ok(AutoAssigned {
        inventory_id: room.id.clone(),
        room,
        room_booking: assigned,
    })
    .with_message("Room assigned"))
}

async fn unassign(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(body): ApiJson<UnassignBody>,
) -> ApiResult<UnassignOutcome> {
    let outcome = state
        .assignments
        .unassign(&actor, &body.booking_id, body.reason.as_deref())
        .await?;
    Ok(ApiResponse::ok(outcome).with_message("Room unassigned"))
}

//! Availability search.

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use chrono::NaiveDate;
use serde::Deserialize;
use stayhub_core::validation::validate_uuid;
use stayhub_core::{Capability, Room, StayRange};

use super::ApiQuery;
use crate::auth::CurrentActor;
use crate::error::{ApiResponse, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub room_type_id: Option<String>,
    pub floor: Option<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/rooms/available", get(available_rooms))
}

async fn available_rooms(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(query): ApiQuery<AvailabilityQuery>,
) -> ApiResult<Vec<Room>> {
    actor.require(Capability::FrontDesk)?;
    let range = StayRange::new(query.check_in, query.check_out)?;
    if let Some(room_type_id) = &query.room_type_id {
        validate_uuid("room_type_id", room_type_id)?;
    }

    let rooms = state
        .availability
        .available_rooms(&range, query.room_type_id.as_deref(), query.floor)
        .await?;
    Ok(ApiResponse::ok(rooms))
}

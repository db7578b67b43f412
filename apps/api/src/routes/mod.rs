//! HTTP routes, one module per surface.
//!
//! Handlers stay thin: extract, call one manager, wrap the result in
//! [`ApiResponse`](crate::ApiResponse). Capability checks live in the managers.

pub mod admin;
pub mod assignment;
pub mod auth;
pub mod bookings;
pub mod health;
pub mod receptionist;
pub mod rooms;

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// `Json` whose rejection uses the error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query` whose rejection uses the error envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

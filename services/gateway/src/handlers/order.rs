use crate::error::AppError;
use crate::models::CreateOrderRequest;
use crate::state::AppState;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use types::order::Order;

/// Accept a limit order and rest it as `OPEN`
///
/// Submission never matches; crossing happens in `/trades/match`.
pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let Json(payload) = payload?;
    let order = state.engine.submit_order(payload.into()).await?;

    Ok((StatusCode::CREATED, Json(order)))
}

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use matching_engine::BookSnapshot;
use types::ids::PairId;

pub async fn get_order_book(
    State(state): State<AppState>,
    Path(pair): Path<String>,
) -> Result<Json<BookSnapshot>, AppError> {
    let pair = PairId::try_new(pair).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let snapshot = state.book.snapshot(&pair, state.config.book_depth).await?;

    Ok(Json(snapshot))
}

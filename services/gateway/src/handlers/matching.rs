use crate::error::AppError;
use crate::models::MatchQuery;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use matching_engine::{EngineError, MatchResult};
use types::ids::PairId;

/// Run one match attempt on a pair
///
/// No cross and a skipped contended attempt both answer 200 with zero trades.
pub async fn match_orders(
    State(state): State<AppState>,
    query: Result<Query<MatchQuery>, QueryRejection>,
) -> Result<Json<MatchResult>, AppError> {
    let Query(query) = query?;
    let pair = match query.pair.filter(|p| !p.is_empty()) {
        Some(raw) => PairId::try_new(raw).map_err(|e| AppError::BadRequest(e.to_string()))?,
        None => state.config.default_pair.clone(),
    };

    let outcome = state.engine.attempt_match(&pair).await?;
    let result = MatchResult::try_from(&outcome).map_err(EngineError::from)?;
    Ok(Json(result))
}

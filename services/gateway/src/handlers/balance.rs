use crate::error::AppError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use types::ids::UserId;
use types::wallet::Balances;

pub async fn get_balance(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Balances>, AppError> {
    let user_id: UserId = user_id
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid user id: {user_id}")))?;
    let balances = state.ledger.balances_of(user_id).await?;

    Ok(Json(balances))
}

use serde::{Deserialize, Serialize};
use types::ids::{PairId, UserId};
use types::numeric::{Price, Quantity};
use types::order::{NewOrder, Side};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: UserId,
    pub pair: PairId,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
}

impl From<CreateOrderRequest> for NewOrder {
    fn from(req: CreateOrderRequest) -> Self {
        NewOrder {
            user_id: req.user_id,
            pair: req.pair,
            side: req.side,
            price: req.price,
            quantity: req.quantity,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchQuery {
    pub pair: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

use crate::error::AppError;
use crate::handlers::{balance, book, health, matching, order};
use crate::state::AppState;
use axum::{
    Router,
    http::Uri,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/orders", post(order::create_order))
        .route("/orderbook/{pair}", get(book::get_order_book))
        .route("/balance/{user_id}", get(balance::get_balance))
        .route("/trades/match", post(matching::match_orders))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use matching_engine::MemoryStore;
    use rust_decimal::Decimal;
    use serde_json::{Value, json};
    use std::str::FromStr;
    use std::sync::Arc;
    use tower::ServiceExt;
    use types::ids::UserId;

    fn app() -> (Router, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let config = GatewayConfig::from_lookup(|_| None).unwrap();
        (create_router(AppState::new(store.clone(), config)), store)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response: Response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn post_empty(uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn decimal(value: &Value) -> Decimal {
        Decimal::from_str(value.to_string().trim_matches('"')).unwrap()
    }

    fn order_body(side: &str, price: &str, quantity: &str) -> Value {
        json!({
            "user_id": UserId::new(),
            "pair": "BTCUSDT",
            "side": side,
            "price": price,
            "quantity": quantity,
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let (status, body) = send(&app, get_req("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok", "service": "gateway"}));
    }

    #[tokio::test]
    async fn test_create_order() {
        let (app, _) = app();
        let (status, body) = send(&app, post_json("/orders", order_body("BUY", "50000", "1.5"))).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "OPEN");
        assert_eq!(body["side"], "BUY");
        assert_eq!(body["pair"], "BTCUSDT");
        assert_eq!(decimal(&body["remaining_quantity"]), Decimal::from_str("1.5").unwrap());
        assert!(body["id"].is_string());
    }

    #[tokio::test]
    async fn test_create_order_rejects_bad_input() {
        let (app, _) = app();

        let (status, body) = send(&app, post_json("/orders", order_body("BUY", "0", "1"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "BAD_REQUEST");

        let (status, _) = send(&app, post_json("/orders", order_body("HOLD", "1", "1"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, post_json("/orders", json!({"pair": "BTCUSDT"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, post_json("/orders", order_body("BUY", "1000000000001", "1"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, post_json("/orders", order_body("BUY", "100", "0.0000000000001"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, book) = send(&app, get_req("/orderbook/BTCUSDT")).await;
        assert_eq!(book["bids"], json!([]));
    }

    #[tokio::test]
    async fn test_order_book_levels() {
        let (app, _) = app();
        for (side, price, qty) in [
            ("BUY", "100", "1"),
            ("BUY", "100", "2"),
            ("BUY", "99", "1"),
            ("SELL", "101", "4"),
        ] {
            let (status, _) = send(&app, post_json("/orders", order_body(side, price, qty))).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) = send(&app, get_req("/orderbook/BTCUSDT")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pair"], "BTCUSDT");

        let bids = body["bids"].as_array().unwrap();
        assert_eq!(bids.len(), 2);
        assert_eq!(decimal(&bids[0]["price"]), Decimal::from(100));
        assert_eq!(decimal(&bids[0]["quantity"]), Decimal::from(3));
        assert_eq!(decimal(&bids[1]["price"]), Decimal::from(99));

        let asks = body["asks"].as_array().unwrap();
        assert_eq!(asks.len(), 1);
        assert_eq!(decimal(&asks[0]["quantity"]), Decimal::from(4));
    }

    #[tokio::test]
    async fn test_order_book_rejects_bad_pair() {
        let (app, _) = app();
        let (status, _) = send(&app, get_req("/orderbook/BTC!USDT")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_balance() {
        let (app, store) = app();
        let user = UserId::new();
        store.seed_wallet(user, "USDT", Decimal::from(5000));
        store.seed_wallet(user, "BTC", Decimal::from_str("0.25").unwrap());

        let uri = format!("/balance/{user}");
        let (status, body) = send(&app, get_req(&uri)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(decimal(&body["balances"]["USDT"]), Decimal::from(5000));
        assert_eq!(decimal(&body["balances"]["BTC"]), Decimal::from_str("0.25").unwrap());
    }

    #[tokio::test]
    async fn test_balance_rejects_bad_user_id() {
        let (app, _) = app();
        let (status, body) = send(&app, get_req("/balance/not-a-uuid")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_match_defaults_pair() {
        let (app, _) = app();
        send(&app, post_json("/orders", order_body("SELL", "100", "1"))).await;
        send(&app, post_json("/orders", order_body("BUY", "105", "0.4"))).await;

        let (status, body) = send(&app, post_empty("/trades/match")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["trades_executed"], 1);
        // Volume is notional at the ask price
        assert_eq!(decimal(&body["volume_matched"]), Decimal::from(40));

        let (status, body) = send(&app, post_empty("/trades/match?pair=BTCUSDT")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["trades_executed"], 0);
        assert_eq!(decimal(&body["volume_matched"]), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_match_other_pair_is_isolated() {
        let (app, _) = app();
        send(&app, post_json("/orders", order_body("SELL", "100", "1"))).await;
        send(&app, post_json("/orders", order_body("BUY", "100", "1"))).await;

        let (status, body) = send(&app, post_empty("/trades/match?pair=ETHUSDT")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["trades_executed"], 0);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (app, _) = app();
        let (status, body) = send(&app, get_req("/v1/accounts")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NOT_FOUND");
    }
}

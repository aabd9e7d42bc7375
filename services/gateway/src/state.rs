use crate::config::GatewayConfig;
use matching_engine::{Ledger, MatchEngine, OrderBook, OrderStore, WalletStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub engine: MatchEngine,
    pub book: OrderBook,
    pub ledger: Ledger,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    /// Wire the engine, book reader and balance view over one store
    pub fn new<S>(store: Arc<S>, config: GatewayConfig) -> Self
    where
        S: OrderStore + WalletStore + 'static,
    {
        let orders: Arc<dyn OrderStore> = store.clone();
        let wallets: Arc<dyn WalletStore> = store;

        Self {
            engine: MatchEngine::new(orders.clone()),
            book: OrderBook::new(orders),
            ledger: Ledger::new(wallets),
            config: Arc::new(config),
        }
    }
}

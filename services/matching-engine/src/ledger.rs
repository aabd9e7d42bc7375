//! Balance view
//!
//! Pure reads over the wallet store. Matching never touches balances.

use std::sync::Arc;
use types::ids::UserId;
use types::wallet::Balances;

use crate::store::{StoreError, WalletStore};

#[derive(Clone)]
pub struct Ledger {
    wallets: Arc<dyn WalletStore>,
}

impl Ledger {
    pub fn new(wallets: Arc<dyn WalletStore>) -> Self {
        Self { wallets }
    }

    /// Currency to balance mapping; empty for users without wallets
    pub async fn balances_of(&self, user_id: UserId) -> Result<Balances, StoreError> {
        let wallets = self.wallets.wallets_of(user_id).await?;
        Balances::from_wallets(user_id, wallets)
            .ok_or_else(|| StoreError::Corrupt(format!("balances of {user_id} are out of range")))
    }
}

//! Per-user, per-currency holdings
//!
//! Wallets are read-only from the venue's point of view: matching never
//! moves balances.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ids::{UserId, WalletId};

/// Balance of one currency for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub user_id: UserId,
    pub currency: String,
    pub balance: Decimal,
}

impl Wallet {
    pub fn new(user_id: UserId, currency: impl Into<String>, balance: Decimal) -> Self {
        Self {
            id: WalletId::new(),
            user_id,
            currency: currency.into(),
            balance,
        }
    }
}

/// Currency to balance mapping for a single user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    pub user_id: UserId,
    pub balances: BTreeMap<String, Decimal>,
}

impl Balances {
    /// Fold wallet rows into a mapping; duplicate currencies are summed
    ///
    /// None if a summed balance leaves `Decimal` range.
    pub fn from_wallets(
        user_id: UserId,
        wallets: impl IntoIterator<Item = Wallet>,
    ) -> Option<Self> {
        let mut balances = BTreeMap::new();
        for wallet in wallets {
            let total = balances.entry(wallet.currency).or_insert(Decimal::ZERO);
            *total = total.checked_add(wallet.balance)?;
        }
        Some(Self { user_id, balances })
    }

    /// Balance for `currency`, if the user holds a wallet in it
    pub fn get(&self, currency: &str) -> Option<Decimal> {
        self.balances.get(currency).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

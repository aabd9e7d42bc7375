//! Engine error taxonomy

use thiserror::Error;
use types::errors::{OrderError, TradeError};

use crate::store::StoreError;

/// Failures surfaced by `MatchEngine`
///
/// No-cross and contention are outcomes, not errors; see `MatchOutcome`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Malformed submission, rejected before reaching the store
    #[error("Validation failed: {0}")]
    Validation(#[from] OrderError),

    #[error("Trade error: {0}")]
    Trade(#[from] TradeError),

    /// Persistence failure; nothing from the attempt was applied
    #[error("Persistence failed: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Store(err) => err.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_store_errors_retry() {
        assert!(EngineError::from(StoreError::Unavailable("down".into())).is_retryable());
        assert!(!EngineError::from(StoreError::Backend("bad sql".into())).is_retryable());
        assert!(!EngineError::from(OrderError::InvalidPrice("0".into())).is_retryable());
    }
}

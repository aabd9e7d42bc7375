//! Match attempt results

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::errors::TradeError;
use types::trade::Trade;

/// What one `attempt_match` call did
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// One trade committed
    Executed(Trade),
    /// A side was empty or best bid < best ask
    NoCross,
    /// A best order was held by a concurrent attempt; nothing was tried
    Contended,
}

impl MatchOutcome {
    pub fn trade(&self) -> Option<&Trade> {
        match self {
            MatchOutcome::Executed(trade) => Some(trade),
            _ => None,
        }
    }

    pub fn is_executed(&self) -> bool {
        matches!(self, MatchOutcome::Executed(_))
    }
}

/// Wire summary of a match attempt
///
/// Contention and no-cross both report zero trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub trades_executed: u32,
    /// Executed quantity times executed price
    pub volume_matched: Decimal,
}

impl TryFrom<&MatchOutcome> for MatchResult {
    type Error = TradeError;

    fn try_from(outcome: &MatchOutcome) -> Result<Self, Self::Error> {
        let Some(trade) = outcome.trade() else {
            return Ok(Self {
                trades_executed: 0,
                volume_matched: Decimal::ZERO,
            });
        };

        let volume_matched = trade.notional().ok_or_else(|| TradeError::InvalidTrade {
            reason: format!("notional of trade {} is out of range", trade.id),
        })?;
        Ok(Self {
            trades_executed: 1,
            volume_matched,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use types::ids::{OrderId, PairId};
    use types::numeric::{Price, Quantity};

    #[test]
    fn test_result_from_executed() {
        let trade = Trade::new(
            PairId::try_new("BTCUSDT").unwrap(),
            OrderId::new(),
            OrderId::new(),
            Price::from_u64(95),
            Quantity::from_str("1.5").unwrap(),
            Utc::now(),
        );

        let result = MatchResult::try_from(&MatchOutcome::Executed(trade)).unwrap();
        assert_eq!(result.trades_executed, 1);
        assert_eq!(result.volume_matched, Decimal::new(1425, 1));
    }

    #[test]
    fn test_unrepresentable_volume_is_an_error() {
        let trade = Trade::new(
            PairId::try_new("BTCUSDT").unwrap(),
            OrderId::new(),
            OrderId::new(),
            Price::from_str("100000000000000000000").unwrap(),
            Quantity::from_str("10000000000").unwrap(),
            Utc::now(),
        );

        assert!(matches!(
            MatchResult::try_from(&MatchOutcome::Executed(trade)),
            Err(TradeError::InvalidTrade { .. })
        ));
    }

    #[test]
    fn test_skips_report_zero() {
        for outcome in [MatchOutcome::NoCross, MatchOutcome::Contended] {
            let result = MatchResult::try_from(&outcome).unwrap();
            assert_eq!(result.trades_executed, 0);
            assert_eq!(result.volume_matched, Decimal::ZERO);
        }
    }
}

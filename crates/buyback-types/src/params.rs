//! Governance-controlled parameters and the accepted payment tokens.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{BuybackError, Result};
use crate::ids::PoolId;

/// Module parameters, replaced wholesale by `UpdateParams`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// EMA smoothing factor α in `(0, 1)`.
    pub ema_smoothing: Decimal,
    /// Maximum distinct vesting entries per buyer per auction.
    pub max_purchase_number: u64,
    /// Smallest amount a single buy may request (base-token units).
    pub min_purchase_amount: u128,
    /// Smallest increase of `sold` that triggers an interval pump.
    pub min_sold_difference_to_pump: u128,
}

impl Params {
    #[must_use]
    pub fn new() -> Self {
        let (mantissa, scale) = constants::DEFAULT_EMA_SMOOTHING;
        Self {
            ema_smoothing: Decimal::new(mantissa, scale),
            max_purchase_number: constants::DEFAULT_MAX_PURCHASE_NUMBER,
            min_purchase_amount: constants::DEFAULT_MIN_PURCHASE_AMOUNT,
            min_sold_difference_to_pump: constants::DEFAULT_MIN_SOLD_DIFFERENCE_TO_PUMP,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.ema_smoothing <= Decimal::ZERO || self.ema_smoothing >= Decimal::ONE {
            return Err(BuybackError::InvalidParams {
                reason: format!("ema smoothing {} must be in (0, 1)", self.ema_smoothing),
            });
        }
        if self.max_purchase_number == 0 {
            return Err(BuybackError::InvalidParams {
                reason: "max purchase number must be positive".into(),
            });
        }
        Ok(())
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::new()
    }
}

/// A payment denomination accepted by auctions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedToken {
    /// AMM pool pairing this token with the base denomination.
    pub pool_id: PoolId,
    /// Exponential moving average of the spot price.
    pub last_average_price: Decimal,
}

/// One `(denom, pool)` pair submitted with `SetAcceptedTokens`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedTokenConfig {
    pub denom: String,
    pub pool_id: PoolId,
}

impl AcceptedTokenConfig {
    #[must_use]
    pub fn new(denom: impl Into<String>, pool_id: PoolId) -> Self {
        Self {
            denom: denom.into(),
            pool_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_module_defaults() {
        let p = Params::default();
        assert_eq!(p.ema_smoothing, Decimal::new(1, 1));
        assert_eq!(p.max_purchase_number, 20);
        assert_eq!(p.min_purchase_amount, 0);
        assert_eq!(p.min_sold_difference_to_pump, 0);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range() {
        let mut p = Params::default();
        p.ema_smoothing = Decimal::ONE;
        assert!(p.validate().is_err());
        p.ema_smoothing = Decimal::ZERO;
        assert!(p.validate().is_err());
        let mut p = Params::default();
        p.max_purchase_number = 0;
        assert!(matches!(
            p.validate(),
            Err(BuybackError::InvalidParams { .. })
        ));
    }

    #[test]
    fn params_serde_roundtrip() {
        let p = Params::default();
        let json = serde_json::to_string(&p).unwrap();
        let back: Params = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}

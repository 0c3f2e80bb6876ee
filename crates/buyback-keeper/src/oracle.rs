//! Price oracle adapter.
//!
//! ```text
//!   spot (AMM) ──┐
//!                ├─ max ──► base price ──× (1 − discount) ──► unit price
//!   EMA ─────────┘
//! ```
//!
//! The EMA is refreshed once per block by the scheduler and seeded with the
//! spot price when a token is accepted. Purchases and queries both use
//! [`base price`](Transaction::base_price), so a quoted price is the price
//! paid.

use std::collections::BTreeMap;

use buyback_types::constants::ONE;
use buyback_types::math::{complement, from_atto, mul_div_floor, mul_price, to_atto, truncate};
use buyback_types::{AcceptedToken, AcceptedTokenConfig, Auction, BuybackError, PoolId, Result};
use chrono::TimeDelta;
use rust_decimal::Decimal;

use crate::ledger::{Ledger, PriceSource};
use crate::transaction::Transaction;

/// A discounted price for one base token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Quote {
    pub price: Decimal,
    pub discount: Decimal,
    pub vesting_period: TimeDelta,
}

/// `α·spot + (1−α)·old`, each term truncated to 18 digits.
pub fn moving_average(alpha: Decimal, spot: Decimal, old: Decimal) -> Result<Decimal> {
    let alpha_atto = to_atto(alpha)?;
    let keep = ONE.checked_sub(alpha_atto).ok_or_else(|| BuybackError::InvalidParams {
        reason: format!("ema smoothing {alpha} exceeds one"),
    })?;
    let fresh = mul_div_floor(to_atto(spot)?, alpha_atto, ONE)?;
    let stale = mul_div_floor(to_atto(old)?, keep, ONE)?;
    let sum = fresh
        .checked_add(stale)
        .ok_or_else(|| BuybackError::Arithmetic("moving average overflow".into()))?;
    from_atto(sum)
}

impl<L: Ledger, P: PriceSource> Transaction<'_, L, P> {
    pub(crate) fn accepted_token(&self, denom: &str) -> Result<AcceptedToken> {
        self.store
            .accepted_token(denom)
            .ok_or_else(|| BuybackError::TokenNotAccepted(denom.to_string()))
    }

    /// AMM spot price of the base token quoted in `denom`.
    pub(crate) fn spot_price(&self, denom: &str) -> Result<Decimal> {
        let token = self.accepted_token(denom)?;
        self.pool_spot_price(token.pool_id, denom)
    }

    pub(crate) fn pool_spot_price(
        &self,
        pool_id: PoolId,
        denom: &str,
    ) -> Result<Decimal> {
        let spot = self
            .prices
            .spot_price(pool_id, denom, &self.config.base_denom)
            .map_err(|e| BuybackError::PriceUnavailable {
                denom: denom.to_string(),
                reason: e.to_string(),
            })?;
        let spot = truncate(spot);
        if spot <= Decimal::ZERO {
            return Err(BuybackError::PriceUnavailable {
                denom: denom.to_string(),
                reason: format!("non-positive spot price {spot} from {pool_id}"),
            });
        }
        Ok(spot)
    }

    /// `max(spot, EMA)`.
    pub(crate) fn base_price(&self, denom: &str) -> Result<Decimal> {
        let token = self.accepted_token(denom)?;
        let spot = self.pool_spot_price(token.pool_id, denom)?;
        Ok(spot.max(token.last_average_price))
    }

    /// Discounted price of one base token paid in `denom` at block time.
    pub(crate) fn unit_price(
        &self,
        auction: &Auction,
        denom: &str,
        requested: Option<TimeDelta>,
    ) -> Result<Quote> {
        let base = self.base_price(denom)?;
        let (discount, vesting_period) = auction.discount_at(self.now, requested)?;
        let price = mul_price(base, complement(discount)?)?;
        if price.is_zero() {
            return Err(BuybackError::PriceUnavailable {
                denom: denom.to_string(),
                reason: format!("discounted price of {base} at {discount} is zero"),
            });
        }
        tracing::debug!(
            auction_id = %auction.id,
            denom,
            base = %base,
            discount = %discount,
            price = %price,
            "Unit price computed"
        );
        Ok(Quote {
            price,
            discount,
            vesting_period,
        })
    }

    /// Fold the current spot price into the token's EMA and persist it.
    pub(crate) fn update_moving_average(&mut self, denom: &str) -> Result<Decimal> {
        let mut token = self.accepted_token(denom)?;
        let spot = self.pool_spot_price(token.pool_id, denom)?;
        let alpha = self.store.params().ema_smoothing;
        let updated = moving_average(alpha, spot, token.last_average_price)?;
        tracing::debug!(
            denom,
            spot = %spot,
            previous = %token.last_average_price,
            updated = %updated,
            "Moving average refreshed"
        );
        token.last_average_price = updated;
        self.store.set_accepted_token(denom, token);
        Ok(updated)
    }

    /// Replace the accepted-token set. Each pool must hold exactly the base
    /// denom and the token denom; each EMA starts at the current spot price.
    pub(crate) fn set_accepted_tokens(&mut self, tokens: &[AcceptedTokenConfig]) -> Result<()> {
        let base = self.config.base_denom.as_str();
        let mut accepted = BTreeMap::new();
        for token in tokens {
            if token.denom.trim().is_empty() {
                return Err(BuybackError::InvalidCoin {
                    reason: "accepted token denom must not be empty".into(),
                });
            }
            if token.denom == base {
                return Err(BuybackError::InvalidPool {
                    pool_id: token.pool_id,
                    reason: format!("cannot accept the base denom {base} as payment"),
                });
            }
            if accepted.contains_key(&token.denom) {
                return Err(BuybackError::InvalidParams {
                    reason: format!("duplicate accepted token {}", token.denom),
                });
            }
            let denoms = self.prices.pool_denoms(token.pool_id).map_err(|e| {
                BuybackError::InvalidPool {
                    pool_id: token.pool_id,
                    reason: e.to_string(),
                }
            })?;
            let pairs_token = denoms.len() == 2
                && denoms.iter().any(|d| d == base)
                && denoms.iter().any(|d| *d == token.denom);
            if !pairs_token {
                return Err(BuybackError::InvalidPool {
                    pool_id: token.pool_id,
                    reason: format!(
                        "pool must hold exactly {base} and {}, found [{}]",
                        token.denom,
                        denoms.join(", ")
                    ),
                });
            }
            let spot = self.pool_spot_price(token.pool_id, &token.denom)?;
            accepted.insert(
                token.denom.clone(),
                AcceptedToken {
                    pool_id: token.pool_id,
                    last_average_price: spot,
                },
            );
        }
        tracing::info!(count = accepted.len(), "Accepted tokens replaced");
        self.store.set_accepted_tokens(accepted);
        Ok(())
    }
}

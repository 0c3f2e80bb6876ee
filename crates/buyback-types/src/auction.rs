//! Auction model and status derivation.
//!
//! ## Lifecycle
//!
//! ```text
//!   Upcoming ──(now ≥ start)──► Active ──(sold out | terminated | end < now)──► Completed
//! ```
//!
//! Status is derived from block time plus a sticky `completed` flag. Between
//! `end_time` and the next scheduler tick an auction still reports `Active`;
//! the scheduler is the only place that closes expired auctions.

use std::fmt;

use chrono::TimeDelta;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::coins::{Coin, Coins};
use crate::discount::DiscountPolicy;
use crate::error::{BuybackError, Result};
use crate::ids::AuctionId;
use crate::purchase::VestingParams;
use crate::time::{Timestamp, checked_add, duration_serde};

/// Derived auction status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuctionStatus {
    Upcoming,
    Active,
    Completed,
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upcoming => write!(f, "UPCOMING"),
            Self::Active => write!(f, "ACTIVE"),
            Self::Completed => write!(f, "COMPLETED"),
        }
    }
}

/// How raised proceeds are handed to the pump scheduler.
///
/// The engine only reads `interval`; everything else is forwarded as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PumpParams {
    /// Time between interval pumps. Zero pumps only once, at completion.
    #[serde(with = "duration_serde")]
    pub interval: TimeDelta,
    /// Delay before a scheduled pump stream starts.
    #[serde(with = "duration_serde")]
    pub start_delay: TimeDelta,
    /// Epoch identifier the pump stream is distributed on.
    pub epoch_identifier: String,
    /// Number of epochs the pump stream lasts.
    pub num_epochs: u64,
    /// Number of pumps per epoch.
    pub num_pumps_per_epoch: u64,
}

impl PumpParams {
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| BuybackError::InvalidAuction {
            reason: format!("pump params: {reason}"),
        };
        if self.interval < TimeDelta::zero() {
            return Err(invalid("interval must not be negative"));
        }
        if self.start_delay < TimeDelta::zero() {
            return Err(invalid("start delay must not be negative"));
        }
        if self.epoch_identifier.trim().is_empty() {
            return Err(invalid("epoch identifier must not be empty"));
        }
        if self.num_epochs == 0 {
            return Err(invalid("number of epochs must be positive"));
        }
        if self.num_pumps_per_epoch == 0 {
            return Err(invalid("number of pumps per epoch must be positive"));
        }
        Ok(())
    }

    #[must_use]
    pub fn pumps_on_interval(&self) -> bool {
        self.interval > TimeDelta::zero()
    }
}

/// Progress of interval pumping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PumpInfo {
    pub last_pump_time: Timestamp,
    pub last_sold: u128,
    pub last_raised: Coins,
}

/// A Dutch auction selling `allocation` base tokens from escrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    pub id: AuctionId,
    pub allocation: u128,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub discount: DiscountPolicy,
    pub vesting: VestingParams,
    pub pump: PumpParams,
    pub sold: u128,
    pub raised: Coins,
    pub completed: bool,
    pub completed_at: Option<Timestamp>,
    pub completion_reason: Option<String>,
    /// Baseline for completion-anchored vesting; set once at completion.
    pub vesting_start: Option<Timestamp>,
    pub pump_info: PumpInfo,
}

impl Auction {
    /// A fresh, unsold auction. Pump progress starts at `start_time`.
    #[must_use]
    pub fn new(
        id: AuctionId,
        allocation: u128,
        start_time: Timestamp,
        end_time: Timestamp,
        discount: DiscountPolicy,
        vesting: VestingParams,
        pump: PumpParams,
    ) -> Self {
        Self {
            id,
            allocation,
            start_time,
            end_time,
            discount,
            vesting,
            pump,
            sold: 0,
            raised: Coins::new(),
            completed: false,
            completed_at: None,
            completion_reason: None,
            vesting_start: None,
            pump_info: PumpInfo {
                last_pump_time: start_time,
                last_sold: 0,
                last_raised: Coins::new(),
            },
        }
    }

    /// Static validation of creation parameters.
    pub fn validate(&self) -> Result<()> {
        if self.allocation == 0 {
            return Err(BuybackError::InvalidAuction {
                reason: "allocation must be positive".into(),
            });
        }
        if self.end_time < self.start_time {
            return Err(BuybackError::InvalidAuction {
                reason: format!(
                    "end time {} is before start time {}",
                    self.end_time, self.start_time
                ),
            });
        }
        if self.sold > self.allocation {
            return Err(BuybackError::InvalidAuction {
                reason: format!("sold {} exceeds allocation {}", self.sold, self.allocation),
            });
        }
        self.discount.validate()?;
        self.vesting.validate()?;
        self.pump.validate()
    }

    #[must_use]
    pub fn status(&self, now: Timestamp) -> AuctionStatus {
        if self.completed {
            AuctionStatus::Completed
        } else if now < self.start_time {
            AuctionStatus::Upcoming
        } else {
            AuctionStatus::Active
        }
    }

    #[must_use]
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.status(now) == AuctionStatus::Active
    }

    /// Unsold part of the allocation.
    #[must_use]
    pub fn remaining(&self) -> u128 {
        self.allocation.saturating_sub(self.sold)
    }

    /// Whether the auction should close after a sale.
    #[must_use]
    pub fn is_sold_out(&self, min_purchase_amount: u128) -> bool {
        self.sold >= self.allocation || self.remaining() < min_purchase_amount
    }

    /// Discount and vesting period a buyer gets at `now`.
    pub fn discount_at(
        &self,
        now: Timestamp,
        requested: Option<TimeDelta>,
    ) -> Result<(Decimal, TimeDelta)> {
        self.discount
            .discount(self.start_time, self.end_time, now, requested)
    }

    /// Live discount for linear policies.
    pub fn current_discount(&self, now: Timestamp) -> Result<Option<Decimal>> {
        self.discount
            .current_discount(self.start_time, self.end_time, now)
    }

    /// Book a sale of `amount` tokens for `payment`.
    pub fn record_sale(&mut self, amount: u128, payment: &Coin) -> Result<()> {
        let sold = self
            .sold
            .checked_add(amount)
            .filter(|s| *s <= self.allocation)
            .ok_or(BuybackError::InsufficientAllocation {
                requested: amount,
                remaining: self.remaining(),
            })?;
        self.raised.add(payment)?;
        self.sold = sold;
        Ok(())
    }

    /// Mark completed and fix the vesting baseline at `now + delay`.
    pub fn complete(&mut self, now: Timestamp, reason: &str) -> Result<()> {
        if self.completed {
            return Err(BuybackError::AuctionCompleted(self.id));
        }
        self.vesting_start = Some(checked_add(now, self.vesting.delay)?);
        self.completed = true;
        self.completed_at = Some(now);
        self.completion_reason = Some(reason.to_string());
        Ok(())
    }

    /// Raised coins not yet handed to the pump scheduler.
    pub fn unpumped(&self) -> Result<Coins> {
        self.raised.checked_sub(&self.pump_info.last_raised)
    }

    /// Record that everything raised so far has been pumped.
    pub fn mark_pumped(&mut self, now: Timestamp) {
        self.pump_info = PumpInfo {
            last_pump_time: now,
            last_sold: self.sold,
            last_raised: self.raised.clone(),
        };
    }

    /// Whether an interval pump is due at `now`.
    pub fn pump_due(&self, now: Timestamp) -> Result<bool> {
        if !self.pump.pumps_on_interval() {
            return Ok(false);
        }
        Ok(now >= checked_add(self.pump_info.last_pump_time, self.pump.interval)?)
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl PumpParams {
    /// Pump once at completion, streamed over 30 daily epochs.
    #[must_use]
    pub fn dummy() -> Self {
        Self {
            interval: TimeDelta::zero(),
            start_delay: TimeDelta::zero(),
            epoch_identifier: "day".into(),
            num_epochs: 30,
            num_pumps_per_epoch: 1,
        }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl Auction {
    /// A linear 5% → 50% auction over 24 hours with one-day vesting.
    #[must_use]
    pub fn dummy(id: u64, allocation: u128, start_time: Timestamp) -> Self {
        Self::new(
            AuctionId(id),
            allocation,
            start_time,
            start_time + TimeDelta::hours(24),
            DiscountPolicy::dummy_linear(Decimal::new(5, 2), Decimal::new(5, 1)),
            VestingParams::default(),
            PumpParams::dummy(),
        )
    }
}

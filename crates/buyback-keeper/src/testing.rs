//! In-memory fakes and fixtures for tests.
//!
//! Available to this crate's tests and, through the `test-helpers` feature,
//! to downstream integration tests.

use std::collections::BTreeMap;

use buyback_types::{
    AcceptedTokenConfig, Address, AuctionId, BuybackError, Coin, DiscountPolicy, ModuleConfig,
    Params, PoolId, PumpParams, Result, Timestamp, VestingParams,
};
use chrono::{TimeDelta, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::keeper::Keeper;
use crate::ledger::{InMemoryLedger, PriceSource, PumpRequest, PumpScheduler};
use crate::msgs::{MsgBuy, MsgCreateAuction, MsgSetAcceptedTokens};

/// Two-denom pools with a settable spot price.
#[derive(Debug, Clone, Default)]
pub struct FixedPriceSource {
    pools: BTreeMap<PoolId, (Vec<String>, Decimal)>,
    failing: bool,
}

impl FixedPriceSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool holding `quote` and `base`, pricing one `base` at `price` `quote`.
    pub fn add_pool(&mut self, pool_id: PoolId, quote: &str, base: &str, price: Decimal) {
        self.pools
            .insert(pool_id, (vec![quote.to_string(), base.to_string()], price));
    }

    pub fn set_price(&mut self, pool_id: PoolId, price: Decimal) {
        if let Some((_, p)) = self.pools.get_mut(&pool_id) {
            *p = price;
        }
    }

    /// Make every price lookup fail.
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }
}

impl PriceSource for FixedPriceSource {
    fn spot_price(&self, pool_id: PoolId, quote_denom: &str, base_denom: &str) -> Result<Decimal> {
        if self.failing {
            return Err(BuybackError::PriceUnavailable {
                denom: quote_denom.to_string(),
                reason: "price source offline".into(),
            });
        }
        let (denoms, price) = self.pools.get(&pool_id).ok_or(BuybackError::InvalidPool {
            pool_id,
            reason: "unknown pool".into(),
        })?;
        if !denoms.iter().any(|d| d == quote_denom) || !denoms.iter().any(|d| d == base_denom) {
            return Err(BuybackError::InvalidPool {
                pool_id,
                reason: format!("pool does not pair {quote_denom} with {base_denom}"),
            });
        }
        Ok(*price)
    }

    fn pool_denoms(&self, pool_id: PoolId) -> Result<Vec<String>> {
        self.pools
            .get(&pool_id)
            .map(|(denoms, _)| denoms.clone())
            .ok_or(BuybackError::InvalidPool {
                pool_id,
                reason: "unknown pool".into(),
            })
    }
}

/// Records every pump request; optionally rejects them all.
#[derive(Debug, Clone, Default)]
pub struct RecordingPumpScheduler {
    pub requests: Vec<PumpRequest>,
    pub reject: bool,
}

impl PumpScheduler for RecordingPumpScheduler {
    fn schedule(&mut self, request: PumpRequest) -> Result<()> {
        if self.reject {
            return Err(BuybackError::Internal("pump scheduler unavailable".into()));
        }
        self.requests.push(request);
        Ok(())
    }
}

pub type TestKeeper = Keeper<InMemoryLedger, FixedPriceSource, RecordingPumpScheduler>;

pub const TREASURY_FUNDING: u128 = 1_000_000 * buyback_types::constants::ONE;

/// 2024-06-01T00:00:00Z.
#[must_use]
pub fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

/// Keeper over [`ModuleConfig::dummy`] with a funded treasury and `usdc`
/// accepted through pool 1 at `price` usdc per adym.
#[must_use]
pub fn test_keeper(price: Decimal) -> TestKeeper {
    let config = ModuleConfig::dummy();
    let mut prices = FixedPriceSource::new();
    prices.add_pool(PoolId(1), "usdc", &config.base_denom, price);
    let mut ledger = InMemoryLedger::new();
    ledger
        .deposit(
            &config.treasury_account,
            &Coin::new(config.base_denom.clone(), TREASURY_FUNDING),
        )
        .unwrap();

    let authority = config.authority.clone();
    let mut keeper = Keeper::new(
        config,
        Params::default(),
        ledger,
        prices,
        RecordingPumpScheduler::default(),
    )
    .unwrap();
    keeper
        .set_accepted_tokens(
            t0(),
            MsgSetAcceptedTokens {
                authority,
                tokens: vec![AcceptedTokenConfig::new("usdc", PoolId(1))],
            },
        )
        .unwrap();
    keeper
}

/// 24-hour linear 5% → 50% auction with immediate one-day vesting.
#[must_use]
pub fn create_msg(allocation: u128, start: Timestamp) -> MsgCreateAuction {
    MsgCreateAuction {
        authority: ModuleConfig::dummy().authority,
        allocation,
        start_time: start,
        end_time: start + TimeDelta::hours(24),
        discount: DiscountPolicy::dummy_linear(Decimal::new(5, 2), Decimal::new(5, 1)),
        vesting: VestingParams::default(),
        pump: PumpParams::dummy(),
    }
}

/// Buy `amount` paying in usdc.
#[must_use]
pub fn buy_msg(buyer: &Address, auction_id: AuctionId, amount: u128) -> MsgBuy {
    MsgBuy {
        buyer: buyer.clone(),
        auction_id,
        amount,
        denom: "usdc".into(),
        vesting_period: None,
    }
}

impl TestKeeper {
    /// A buyer holding `usdc` payment units.
    pub fn funded_buyer(&mut self, name: &str, usdc: u128) -> Address {
        let buyer = Address::new(name);
        self.ledger_mut()
            .deposit(&buyer, &Coin::new("usdc", usdc))
            .unwrap();
        buyer
    }
}

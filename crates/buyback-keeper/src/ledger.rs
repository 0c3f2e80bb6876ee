//! Collaborator traits and the in-memory bank ledger.
//!
//! The engine never owns token balances. It reads and moves them through
//! [`Ledger`], prices payment tokens through [`PriceSource`], and hands
//! proceeds to a [`PumpScheduler`]. All three are injected once, at
//! [`Keeper`](crate::Keeper) construction.

use std::collections::BTreeMap;

use buyback_types::{
    Address, AuctionId, BuybackError, Coin, Coins, PoolId, PumpParams, Result, Timestamp,
};
use rust_decimal::Decimal;

/// Bank ledger: balances plus debit / credit of coin sets.
pub trait Ledger {
    /// Balance of `account` in `denom`.
    fn balance(&self, account: &Address, denom: &str) -> u128;

    /// Remove `coins` from `account`. Must leave the account untouched on error.
    fn debit(&mut self, account: &Address, coins: &Coins) -> Result<()>;

    /// Add `coins` to `account`.
    fn credit(&mut self, account: &Address, coins: &Coins) -> Result<()>;
}

/// AMM price feed.
pub trait PriceSource {
    /// Spot price of one unit of `base_denom`, quoted in `quote_denom`.
    fn spot_price(&self, pool_id: PoolId, quote_denom: &str, base_denom: &str) -> Result<Decimal>;

    /// Denominations held by the pool.
    fn pool_denoms(&self, pool_id: PoolId) -> Result<Vec<String>>;
}

/// A request to redistribute raised proceeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PumpRequest {
    pub auction_id: AuctionId,
    /// Account already holding the coins (the configured pump account).
    pub source: Address,
    pub coin: Coin,
    /// Pool pairing the coin with the base denomination, if still accepted.
    pub pool_id: Option<PoolId>,
    pub start_time: Timestamp,
    pub params: PumpParams,
}

/// Downstream proceeds-redistribution subsystem.
pub trait PumpScheduler {
    fn schedule(&mut self, request: PumpRequest) -> Result<()>;
}

/// A transfer between two accounts, replayed on commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    pub coins: Coins,
}

// ---------------------------------------------------------------------------
// InMemoryLedger
// ---------------------------------------------------------------------------

/// Ordered in-memory ledger keyed by (account, denom).
///
/// Debits are atomic per call: every coin is checked before any is removed.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    balances: BTreeMap<(Address, String), u128>,
}

impl InMemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint funds into an account.
    pub fn deposit(&mut self, account: &Address, coin: &Coin) -> Result<()> {
        self.credit(account, &Coins::from(coin.clone()))
    }

    /// Sum of every account's balance in `denom`.
    #[must_use]
    pub fn total_supply(&self, denom: &str) -> u128 {
        self.balances
            .iter()
            .filter(|((_, d), _)| d == denom)
            .fold(0u128, |acc, (_, v)| acc.saturating_add(*v))
    }
}

impl Ledger for InMemoryLedger {
    fn balance(&self, account: &Address, denom: &str) -> u128 {
        self.balances
            .get(&(account.clone(), denom.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn debit(&mut self, account: &Address, coins: &Coins) -> Result<()> {
        for coin in coins.iter() {
            let available = self.balance(account, &coin.denom);
            if available < coin.amount {
                return Err(BuybackError::InsufficientFunds {
                    account: account.clone(),
                    denom: coin.denom,
                    needed: coin.amount,
                    available,
                });
            }
        }
        for coin in coins.iter() {
            let key = (account.clone(), coin.denom);
            let left = self.balance(&key.0, &key.1) - coin.amount;
            if left == 0 {
                self.balances.remove(&key);
            } else {
                self.balances.insert(key, left);
            }
        }
        Ok(())
    }

    fn credit(&mut self, account: &Address, coins: &Coins) -> Result<()> {
        for coin in coins.iter() {
            let have = self.balance(account, &coin.denom);
            have.checked_add(coin.amount).ok_or_else(|| {
                BuybackError::Arithmetic(format!("balance overflow for {account} {}", coin.denom))
            })?;
        }
        for coin in coins.iter() {
            let slot = self
                .balances
                .entry((account.clone(), coin.denom))
                .or_insert(0);
            *slot += coin.amount;
        }
        Ok(())
    }
}

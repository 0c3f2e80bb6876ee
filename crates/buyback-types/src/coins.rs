//! Coin amounts for the buyback escrow model.
//!
//! Amounts are integer base units (`u128`). A [`Coins`] set is kept sorted
//! by denomination so that iteration, serialization and digests are
//! identical on every node.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BuybackError, Result};

/// Denomination identifier (e.g. `"adym"`, `"usdc"`).
pub type Denom = String;

/// A single amount of one denomination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: Denom,
    pub amount: u128,
}

impl Coin {
    #[must_use]
    pub fn new(denom: impl Into<Denom>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Reject blank denominations and zero amounts.
    pub fn validate_positive(&self) -> Result<()> {
        if self.denom.trim().is_empty() {
            return Err(BuybackError::InvalidCoin {
                reason: "denomination must not be empty".into(),
            });
        }
        if self.amount == 0 {
            return Err(BuybackError::InvalidCoin {
                reason: format!("amount of {} must be positive", self.denom),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Multi-denomination amount. Zero entries are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coins(BTreeMap<Denom, u128>);

impl Coins {
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    #[must_use]
    pub fn from_coin(coin: Coin) -> Self {
        let mut coins = Self::new();
        if coin.amount > 0 {
            coins.0.insert(coin.denom, coin.amount);
        }
        coins
    }

    /// Amount held of `denom` (zero when absent).
    #[must_use]
    pub fn amount_of(&self, denom: &str) -> u128 {
        self.0.get(denom).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    /// Add one coin in place.
    pub fn add(&mut self, coin: &Coin) -> Result<()> {
        if coin.amount == 0 {
            return Ok(());
        }
        let slot = self.0.entry(coin.denom.clone()).or_insert(0);
        *slot = slot.checked_add(coin.amount).ok_or_else(|| {
            BuybackError::Arithmetic(format!("coin addition overflow for {}", coin.denom))
        })?;
        Ok(())
    }

    /// Add every coin of `other` in place.
    pub fn add_all(&mut self, other: &Coins) -> Result<()> {
        for coin in other.iter() {
            self.add(&coin)?;
        }
        Ok(())
    }

    /// `self - other`, failing if any denomination would go negative.
    pub fn checked_sub(&self, other: &Coins) -> Result<Coins> {
        let mut out = self.clone();
        for (denom, amount) in &other.0 {
            let have = out.amount_of(denom);
            let left = have.checked_sub(*amount).ok_or_else(|| {
                BuybackError::Arithmetic(format!(
                    "coin subtraction underflow for {denom}: {have} - {amount}"
                ))
            })?;
            if left == 0 {
                out.0.remove(denom);
            } else {
                out.0.insert(denom.clone(), left);
            }
        }
        Ok(out)
    }

    /// Iterate coins in denomination order.
    pub fn iter(&self) -> impl Iterator<Item = Coin> + '_ {
        self.0
            .iter()
            .map(|(denom, amount)| Coin::new(denom.clone(), *amount))
    }

    /// Denominations present, in order.
    pub fn denoms(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Coin> for Coins {
    fn from(coin: Coin) -> Self {
        Self::from_coin(coin)
    }
}

impl FromIterator<Coin> for Coins {
    fn from_iter<I: IntoIterator<Item = Coin>>(iter: I) -> Self {
        let mut coins = Self::new();
        for coin in iter {
            if coin.amount > 0 {
                let slot = coins.0.entry(coin.denom).or_insert(0);
                *slot = slot.saturating_add(coin.amount);
            }
        }
        coins
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (denom, amount) in &self.0 {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{amount}{denom}")?;
            first = false;
        }
        Ok(())
    }
}

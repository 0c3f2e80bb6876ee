//! Identifiers used throughout the buyback engine.
//!
//! Auction IDs are a monotonically increasing sequence starting at 1, so
//! every node assigns the same ID to the same `CreateAuction` message.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// AuctionId
// ---------------------------------------------------------------------------

/// Sequential auction identifier. The first auction created is `AuctionId(1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AuctionId(pub u64);

impl AuctionId {
    /// The ID handed to the first auction ever created.
    pub const FIRST: Self = Self(1);

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for AuctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "auction:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// Opaque account address on the host ledger (buyer, authority, module accounts).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    #[must_use]
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// PoolId
// ---------------------------------------------------------------------------

/// Identifier of an AMM pool on the host chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PoolId(pub u64);

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auction_id_next() {
        assert_eq!(AuctionId::FIRST.next(), AuctionId(2));
        assert_eq!(AuctionId(u64::MAX).next(), AuctionId(u64::MAX));
    }

    #[test]
    fn auction_id_ordering() {
        assert!(AuctionId(1) < AuctionId(2));
    }

    #[test]
    fn display_prefixes() {
        assert_eq!(AuctionId(3).to_string(), "auction:3");
        assert_eq!(PoolId(9).to_string(), "pool:9");
        assert_eq!(Address::new("dym1abc").to_string(), "dym1abc");
    }

    #[test]
    fn address_is_transparent_in_json() {
        let addr = Address::new("dym1buyer");
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"dym1buyer\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, back);
    }

    #[test]
    fn blank_address_is_empty() {
        assert!(Address::new("  ").is_empty());
        assert!(!Address::from("x").is_empty());
    }
}

//! Typed events emitted by committed operations.
//!
//! Events are buffered inside a transaction and released only when it
//! commits, so a failed message never leaves events behind.

use std::fmt;

use chrono::TimeDelta;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::coins::{Coin, Coins};
use crate::ids::{Address, AuctionId};
use crate::time::{Timestamp, duration_serde};

/// Something that happened to an auction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    AuctionCreated {
        auction_id: AuctionId,
        allocation: u128,
        start_time: Timestamp,
        end_time: Timestamp,
    },
    TokensPurchased {
        auction_id: AuctionId,
        buyer: Address,
        amount: u128,
        payment: Coin,
        price: Decimal,
        #[serde(with = "duration_serde")]
        vesting_period: TimeDelta,
    },
    TokensClaimed {
        auction_id: AuctionId,
        claimer: Address,
        amount: u128,
    },
    AuctionCompleted {
        auction_id: AuctionId,
        reason: String,
        sold: u128,
        raised: Coins,
        /// Unsold allocation returned to the treasury.
        returned: u128,
    },
    AuctionPumped {
        auction_id: AuctionId,
        pumped: Coins,
    },
}

/// Discriminant of an [`Event`], useful for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AuctionCreated,
    TokensPurchased,
    TokensClaimed,
    AuctionCompleted,
    AuctionPumped,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuctionCreated => write!(f, "AUCTION_CREATED"),
            Self::TokensPurchased => write!(f, "TOKENS_PURCHASED"),
            Self::TokensClaimed => write!(f, "TOKENS_CLAIMED"),
            Self::AuctionCompleted => write!(f, "AUCTION_COMPLETED"),
            Self::AuctionPumped => write!(f, "AUCTION_PUMPED"),
        }
    }
}

impl Event {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::AuctionCreated { .. } => EventKind::AuctionCreated,
            Self::TokensPurchased { .. } => EventKind::TokensPurchased,
            Self::TokensClaimed { .. } => EventKind::TokensClaimed,
            Self::AuctionCompleted { .. } => EventKind::AuctionCompleted,
            Self::AuctionPumped { .. } => EventKind::AuctionPumped,
        }
    }

    #[must_use]
    pub fn auction_id(&self) -> AuctionId {
        match self {
            Self::AuctionCreated { auction_id, .. }
            | Self::TokensPurchased { auction_id, .. }
            | Self::TokensClaimed { auction_id, .. }
            | Self::AuctionCompleted { auction_id, .. }
            | Self::AuctionPumped { auction_id, .. } => *auction_id,
        }
    }
}

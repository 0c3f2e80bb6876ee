//! # buyback-types
//!
//! Shared types, errors, and pure math for the **buyback** auction engine.
//!
//! This crate is the leaf dependency of the workspace: it holds no state and
//! performs no I/O beyond config loading. It defines:
//!
//! - **Identifiers**: [`AuctionId`], [`Address`], [`PoolId`]
//! - **Coins**: [`Coin`], [`Coins`] (sorted multi-denomination amounts)
//! - **Fixed point**: [`math`] (18-digit truncating helpers)
//! - **Discounts**: [`DiscountPolicy`], [`DiscountTier`]
//! - **Vesting**: [`VestingEntry`], [`Purchase`], [`VestingParams`], [`VestingAnchor`]
//! - **Auctions**: [`Auction`], [`AuctionStatus`], [`PumpParams`], [`PumpInfo`]
//! - **Params**: [`Params`], [`AcceptedToken`], [`AcceptedTokenConfig`]
//! - **Configuration**: [`ModuleConfig`]
//! - **Events**: [`Event`], [`EventKind`]
//! - **Errors**: [`BuybackError`] with `BB_ERR_` prefix codes, [`ErrorKind`]
//! - **Constants**: module defaults and completion reasons

pub mod auction;
pub mod coins;
pub mod config;
pub mod constants;
pub mod discount;
pub mod error;
pub mod events;
pub mod ids;
pub mod math;
pub mod params;
pub mod purchase;
pub mod time;

// Re-export all primary types at crate root for ergonomic imports:
//   use buyback_types::{Auction, Purchase, Coin, ...};

pub use auction::*;
pub use coins::*;
pub use config::*;
pub use discount::*;
pub use error::*;
pub use events::*;
pub use ids::*;
pub use params::*;
pub use purchase::*;
pub use time::Timestamp;

// Constants, math and time helpers are accessed via their module path
// (not re-exported to avoid name collisions).

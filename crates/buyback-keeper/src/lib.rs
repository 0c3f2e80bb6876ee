//! # buyback-keeper
//!
//! The stateful half of the **buyback** auction engine: the keeper that owns
//! module state, the message and query surface, and the per-block scheduler.
//!
//! - [`Keeper`]: state owner; every operation runs as one transaction
//! - [`Store`]: persisted layout (auctions, purchases, params, accepted tokens)
//! - [`Ledger`], [`PriceSource`], [`PumpScheduler`]: injected collaborators
//! - [`InMemoryLedger`]: ordered in-memory bank ledger
//! - [`msgs`]: message types; handlers live in `msg_server`
//! - [`query`]: read-only views with live status, discount and prices
//! - [`scheduler`]: `begin_block` expiry, EMA refresh and interval pumping
//!
//! ## Architecture
//!
//! ```text
//!   Msg* ──► msg_server ──► Keeper::execute ──► Transaction
//!                                                 ├─ registry  (create / end / pump)
//!                                                 ├─ purchase  (buy / exact spend / claim)
//!                                                 └─ oracle    (spot, EMA, unit price)
//!                              commit: ledger → store → pumps → events
//!
//!   begin_block ──► scheduler ──► one transaction per step
//! ```
//!
//! Writes are buffered in an overlay over [`Store`] and a pending-transfer
//! cache over the [`Ledger`]. Nothing becomes visible unless the operation
//! returns `Ok`.

mod cache;
mod keeper;
pub mod ledger;
mod msg_server;
pub mod msgs;
mod oracle;
mod purchase;
pub mod query;
mod registry;
pub mod scheduler;
pub mod store;
mod transaction;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use keeper::Keeper;
pub use ledger::{InMemoryLedger, Ledger, PriceSource, PumpRequest, PumpScheduler, Transfer};
pub use msgs::{
    MsgBuy, MsgBuyExactSpend, MsgClaimTokens, MsgCreateAuction, MsgSetAcceptedTokens,
    MsgTerminateAuction, MsgUpdateParams,
};
pub use oracle::moving_average;
pub use query::{AcceptedTokenResponse, AuctionResponse, UserPurchaseResponse};
pub use registry::PumpOutcome;
pub use scheduler::BlockSummary;
pub use store::Store;

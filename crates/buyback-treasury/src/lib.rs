//! # buyback-treasury
//!
//! Out-of-band checks over the buyback module state.
//!
//! - [`TreasuryGuard`]: escrow solvency and bookkeeping invariant
//! - [`digest`]: SHA-256 state digest for cross-node comparison
//!
//! Both are read-only. They never move funds and never fail an operation;
//! a broken invariant is reported, not enforced.

pub mod digest;
pub mod guard;

pub use digest::{state_digest, state_digest_hex, verify_state_digest};
pub use guard::{InvariantReport, TreasuryGuard};

//! Per-block driver.
//!
//! ```text
//!   begin_block(now)
//!     ├─ for each accepted token: refresh EMA          (own transaction)
//!     └─ for each auction, in ID order:
//!          ├─ !completed && end < now → end_auction   (own transaction)
//!          └─ otherwise               → interval pump (own transaction)
//! ```
//!
//! Walks every auction each block, completed ones included. A failing step
//! is logged and skipped; it never blocks the rest of the block.

use buyback_types::constants::REASON_COMPLETED;
use buyback_types::{AuctionId, Timestamp};

use crate::keeper::Keeper;
use crate::ledger::{Ledger, PriceSource, PumpScheduler};
use crate::registry::PumpOutcome;

/// What one `begin_block` pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockSummary {
    /// Denoms whose EMA was refreshed.
    pub refreshed: Vec<String>,
    /// Auctions completed because their end time passed.
    pub expired: Vec<AuctionId>,
    /// Auctions whose proceeds were pumped on interval.
    pub pumped: Vec<AuctionId>,
    /// Steps that failed and were skipped.
    pub failures: usize,
}

impl<L: Ledger, P: PriceSource, S: PumpScheduler> Keeper<L, P, S> {
    /// Run the start-of-block hooks at block time `now`.
    pub fn begin_block(&mut self, now: Timestamp) -> BlockSummary {
        let mut summary = BlockSummary::default();

        let denoms: Vec<String> = self.store().accepted_tokens().keys().cloned().collect();
        for denom in denoms {
            match self.execute(now, |tx| tx.update_moving_average(&denom)) {
                Ok(_) => summary.refreshed.push(denom),
                Err(err) => {
                    tracing::warn!(denom = %denom, error = %err, "EMA refresh skipped");
                    summary.failures += 1;
                }
            }
        }

        let due: Vec<(AuctionId, bool)> = self
            .store()
            .auctions()
            .filter(|a| !a.completed)
            .map(|a| (a.id, a.end_time < now))
            .collect();
        for (id, expired) in due {
            if expired {
                match self.execute(now, |tx| tx.end_auction(id, REASON_COMPLETED)) {
                    Ok(()) => summary.expired.push(id),
                    Err(err) => {
                        tracing::error!(auction_id = %id, error = %err, "Failed to end expired auction");
                        summary.failures += 1;
                    }
                }
                continue;
            }
            match self.execute(now, |tx| tx.process_interval_pumping(id)) {
                Ok(PumpOutcome::Pumped(_)) => summary.pumped.push(id),
                Ok(PumpOutcome::NotDue | PumpOutcome::Skipped) => {}
                Err(err) => {
                    tracing::error!(auction_id = %id, error = %err, "Interval pumping failed");
                    summary.failures += 1;
                }
            }
        }

        if summary.failures > 0 {
            tracing::warn!(failures = summary.failures, "Block hooks completed with failures");
        }
        summary
    }
}

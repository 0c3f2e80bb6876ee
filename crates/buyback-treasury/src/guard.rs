//! Escrow solvency invariant.
//!
//! ```text
//! ∀ auction:   sold ≤ allocation
//! ∀ auction:   Σ purchase totals == sold
//! ∀ purchase:  claimed ≤ total
//!
//! escrow[base]  ≥ Σ unclaimed (all auctions)
//!               + Σ remaining allocation (incomplete auctions)
//! escrow[denom] ≥ Σ (raised − pumped)[denom] (incomplete auctions)
//! ```
//!
//! Escrow may hold more than expected (direct deposits are not refunded);
//! it must never hold less.

use std::collections::BTreeMap;

use buyback_keeper::{Ledger, Store};
use buyback_types::{AuctionId, ModuleConfig};

/// Outcome of an invariant check. `message` lists every failed check, one
/// per line; it is empty when nothing is broken.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvariantReport {
    pub message: String,
    pub broken: bool,
}

impl InvariantReport {
    fn fail(&mut self, line: String) {
        if !self.message.is_empty() {
            self.message.push('\n');
        }
        self.message.push_str(&line);
        self.broken = true;
    }
}

/// Read-only checker over committed state and the escrow balances.
#[derive(Debug, Default)]
pub struct TreasuryGuard;

impl TreasuryGuard {
    /// Run every check. Never panics and never mutates.
    #[must_use]
    pub fn check_invariant(
        config: &ModuleConfig,
        store: &Store,
        ledger: &impl Ledger,
    ) -> InvariantReport {
        let mut report = InvariantReport::default();
        let mut expected: BTreeMap<String, u128> = BTreeMap::new();
        let mut add = |report: &mut InvariantReport, denom: &str, amount: u128| {
            let slot = expected.entry(denom.to_string()).or_insert(0);
            match slot.checked_add(amount) {
                Some(sum) => *slot = sum,
                None => report.fail(format!("expected escrow of {denom} overflows")),
            }
        };

        let mut purchased: BTreeMap<AuctionId, u128> = BTreeMap::new();
        for (id, buyer, purchase) in store.purchases() {
            let total = match purchase.total() {
                Ok(total) => total,
                Err(err) => {
                    report.fail(format!("{id}: purchase of {buyer}: {err}"));
                    continue;
                }
            };
            if purchase.claimed > total {
                report.fail(format!(
                    "{id}: {buyer} claimed {} of {total} purchased",
                    purchase.claimed
                ));
            }
            let sum = purchased.entry(id).or_insert(0);
            *sum = sum.saturating_add(total);
            add(&mut report, &config.base_denom, total.saturating_sub(purchase.claimed));
        }

        for auction in store.auctions() {
            let id = auction.id;
            if auction.sold > auction.allocation {
                report.fail(format!(
                    "{id}: sold {} exceeds allocation {}",
                    auction.sold, auction.allocation
                ));
            }
            let bought = purchased.get(&id).copied().unwrap_or(0);
            if bought != auction.sold {
                report.fail(format!(
                    "{id}: purchases total {bought} but auction sold {}",
                    auction.sold
                ));
            }
            if auction.completed {
                continue;
            }
            add(&mut report, &config.base_denom, auction.remaining());
            match auction.unpumped() {
                Ok(unpumped) => {
                    for coin in unpumped.iter() {
                        add(&mut report, &coin.denom, coin.amount);
                    }
                }
                Err(err) => report.fail(format!("{id}: pumped exceeds raised: {err}")),
            }
        }
        for id in purchased.keys() {
            if store.auction(*id).is_none() {
                report.fail(format!("{id}: purchases recorded for unknown auction"));
            }
        }

        for (denom, needed) in &expected {
            let available = ledger.balance(&config.escrow_account, denom);
            if available < *needed {
                report.fail(format!(
                    "escrow {} holds {available}{denom}, expected at least {needed}{denom}",
                    config.escrow_account
                ));
            }
        }

        if report.broken {
            tracing::error!(report = %report.message, "Buyback invariant broken");
        }
        report
    }
}

//! Atomic unit of work.
//!
//! ```text
//!   Keeper::execute(now, op)
//!     ├─ Transaction { StoreCache, LedgerCache, pumps[], events[] }
//!     ├─ op(&mut tx) ── Err ──► drop tx (nothing visible)
//!     └─ Ok ──► ledger transfers → store delta → pump requests → events
//! ```

use buyback_types::{Event, ModuleConfig, Timestamp};

use crate::cache::{LedgerCache, StoreCache};
use crate::ledger::{Ledger, PriceSource, PumpRequest, Transfer};
use crate::store::{Store, StoreDelta};

pub(crate) struct Transaction<'a, L, P> {
    pub(crate) config: &'a ModuleConfig,
    pub(crate) prices: &'a P,
    pub(crate) now: Timestamp,
    pub(crate) store: StoreCache<'a>,
    pub(crate) ledger: LedgerCache<'a, L>,
    pumps: Vec<PumpRequest>,
    events: Vec<Event>,
}

/// Everything a successful transaction hands back for commit.
pub(crate) struct TxOutput {
    pub(crate) delta: StoreDelta,
    pub(crate) transfers: Vec<Transfer>,
    pub(crate) pumps: Vec<PumpRequest>,
    pub(crate) events: Vec<Event>,
}

impl<'a, L: Ledger, P: PriceSource> Transaction<'a, L, P> {
    pub(crate) fn new(
        config: &'a ModuleConfig,
        store: &'a Store,
        ledger: &'a L,
        prices: &'a P,
        now: Timestamp,
    ) -> Self {
        Self {
            config,
            prices,
            now,
            store: StoreCache::new(store),
            ledger: LedgerCache::new(ledger),
            pumps: Vec::new(),
            events: Vec::new(),
        }
    }

    pub(crate) fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub(crate) fn schedule_pump(&mut self, request: PumpRequest) {
        self.pumps.push(request);
    }

    pub(crate) fn into_output(self) -> TxOutput {
        TxOutput {
            delta: self.store.into_delta(),
            transfers: self.ledger.into_transfers(),
            pumps: self.pumps,
            events: self.events,
        }
    }
}

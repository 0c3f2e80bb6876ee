//! Auction registry: creation, completion, and proceeds pumping.
//!
//! ## Escrow flows
//!
//! ```text
//!   create:    treasury ──allocation──► escrow
//!   end:       escrow ──unsold──► treasury
//!              escrow ──raised − pumped──► pump account ──► PumpScheduler
//!   interval:  escrow ──raised − pumped──► pump account ──► PumpScheduler
//! ```
//!
//! Completion is one-way. Selling out completes the auction inside the
//! purchase that sold the last tokens; expiry is left to the scheduler.

use buyback_types::time::checked_add;
use buyback_types::{Auction, AuctionId, BuybackError, Coin, Coins, Event, Result};

use crate::ledger::{Ledger, PriceSource, PumpRequest};
use crate::msgs::MsgCreateAuction;
use crate::transaction::Transaction;

/// What an interval-pumping pass did for one auction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PumpOutcome {
    /// Interval pumping disabled, auction closed, or interval not elapsed.
    NotDue,
    /// Interval elapsed but too little was sold; only the clock advanced.
    Skipped,
    /// Proceeds handed to the pump scheduler (possibly none).
    Pumped(Coins),
}

impl<L: Ledger, P: PriceSource> Transaction<'_, L, P> {
    pub(crate) fn load_auction(&self, id: AuctionId) -> Result<Auction> {
        self.store
            .auction(id)
            .ok_or(BuybackError::AuctionNotFound(id))
    }

    /// Validate, fund from the treasury, and persist a new auction.
    pub(crate) fn create_auction(&mut self, msg: &MsgCreateAuction) -> Result<AuctionId> {
        let config = self.config;
        let id = self.store.next_auction_id();
        let auction = Auction::new(
            id,
            msg.allocation,
            msg.start_time,
            msg.end_time,
            msg.discount.clone(),
            msg.vesting.clone(),
            msg.pump.clone(),
        );
        auction.validate()?;

        let funding = Coins::from(Coin::new(config.base_denom.clone(), msg.allocation));
        self.ledger
            .transfer(&config.treasury_account, &config.escrow_account, &funding)?;

        self.emit(Event::AuctionCreated {
            auction_id: id,
            allocation: auction.allocation,
            start_time: auction.start_time,
            end_time: auction.end_time,
        });
        tracing::info!(
            auction_id = %id,
            allocation = auction.allocation,
            start = %auction.start_time,
            end = %auction.end_time,
            "Auction created"
        );

        self.store.set_auction(auction);
        self.store.set_next_auction_id(id.next());
        Ok(id)
    }

    /// Complete an auction: return unsold tokens, pump proceeds, and fix
    /// the completion vesting baseline.
    pub(crate) fn end_auction(&mut self, id: AuctionId, reason: &str) -> Result<()> {
        let config = self.config;
        let mut auction = self.load_auction(id)?;
        auction.complete(self.now, reason)?;

        let returned = auction.remaining();
        if returned > 0 {
            let unsold = Coins::from(Coin::new(config.base_denom.clone(), returned));
            self.ledger
                .transfer(&config.escrow_account, &config.treasury_account, &unsold)?;
        }
        self.pump_raised(&mut auction)?;

        self.emit(Event::AuctionCompleted {
            auction_id: id,
            reason: reason.to_string(),
            sold: auction.sold,
            raised: auction.raised.clone(),
            returned,
        });
        tracing::info!(
            auction_id = %id,
            reason,
            sold = auction.sold,
            raised = %auction.raised,
            returned,
            "Auction completed"
        );

        self.store.set_auction(auction);
        Ok(())
    }

    /// Pump proceeds once the auction's pump interval has elapsed.
    pub(crate) fn process_interval_pumping(&mut self, id: AuctionId) -> Result<PumpOutcome> {
        let mut auction = self.load_auction(id)?;
        if !auction.is_active(self.now) || !auction.pump_due(self.now)? {
            return Ok(PumpOutcome::NotDue);
        }

        let sold_since = auction.sold.saturating_sub(auction.pump_info.last_sold);
        let threshold = self.store.params().min_sold_difference_to_pump;
        if sold_since < threshold {
            tracing::debug!(
                auction_id = %id,
                sold_since,
                threshold,
                "Interval pump skipped: sold difference below threshold"
            );
            auction.pump_info.last_pump_time = self.now;
            self.store.set_auction(auction);
            return Ok(PumpOutcome::Skipped);
        }

        let pumped = self.pump_raised(&mut auction)?;
        self.store.set_auction(auction);
        Ok(PumpOutcome::Pumped(pumped))
    }

    /// Move not-yet-pumped proceeds to the pump account and queue one pump
    /// request per denomination.
    fn pump_raised(&mut self, auction: &mut Auction) -> Result<Coins> {
        let config = self.config;
        let unpumped = auction.unpumped()?;
        if !unpumped.is_zero() {
            self.ledger
                .transfer(&config.escrow_account, &config.pump_account, &unpumped)?;
            let start_time = checked_add(self.now, auction.pump.start_delay)?;
            for coin in unpumped.iter() {
                let pool_id = self.store.accepted_token(&coin.denom).map(|t| t.pool_id);
                self.schedule_pump(PumpRequest {
                    auction_id: auction.id,
                    source: config.pump_account.clone(),
                    coin,
                    pool_id,
                    start_time,
                    params: auction.pump.clone(),
                });
            }
            self.emit(Event::AuctionPumped {
                auction_id: auction.id,
                pumped: unpumped.clone(),
            });
            tracing::info!(auction_id = %auction.id, pumped = %unpumped, "Auction proceeds pumped");
        }
        auction.mark_pumped(self.now);
        Ok(unpumped)
    }
}

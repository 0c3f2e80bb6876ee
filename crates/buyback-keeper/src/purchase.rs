//! Purchase ledger: buying into auctions and claiming vested tokens.
//!
//! ## Buy flow
//!
//! ```text
//!   load auction ─► Active? ─► denom accepted? ─► amount ≥ min, ≤ remaining
//!     ─► unit price ─► payment = ⌊amount × price⌋ > 0
//!     ─► buyer ──payment──► escrow
//!     ─► append / merge vesting entry ─► sold += amount, raised += payment
//!     ─► sold out? ─► end_auction("auction_sold_out")
//! ```
//!
//! Purchased tokens stay in escrow until claimed.

use buyback_types::constants::{ONE, REASON_SOLD_OUT};
use buyback_types::math::{mul_div_floor, to_atto};
use buyback_types::{
    Address, AuctionId, BuybackError, Coin, Coins, Event, Purchase, Result, VestingEntry,
};
use chrono::TimeDelta;

use crate::ledger::{Ledger, PriceSource};
use crate::transaction::Transaction;

impl<L: Ledger, P: PriceSource> Transaction<'_, L, P> {
    /// Buy exactly `amount` base tokens, paying in `denom`.
    pub(crate) fn buy(
        &mut self,
        buyer: &Address,
        id: AuctionId,
        amount: u128,
        denom: &str,
        requested_period: Option<TimeDelta>,
    ) -> Result<Coin> {
        let config = self.config;
        let mut auction = self.load_auction(id)?;
        if !auction.is_active(self.now) {
            return Err(BuybackError::AuctionNotActive(id));
        }
        self.accepted_token(denom)?;

        let params = self.store.params().clone();
        if amount == 0 {
            return Err(BuybackError::InvalidPurchaseAmount {
                reason: "amount must be positive".into(),
            });
        }
        if amount < params.min_purchase_amount {
            return Err(BuybackError::InvalidPurchaseAmount {
                reason: format!(
                    "amount {amount} is less than minimum {}",
                    params.min_purchase_amount
                ),
            });
        }
        if amount > auction.remaining() {
            return Err(BuybackError::InsufficientAllocation {
                requested: amount,
                remaining: auction.remaining(),
            });
        }

        let quote = self.unit_price(&auction, denom, requested_period)?;
        let payment = mul_div_floor(amount, to_atto(quote.price)?, ONE)?;
        if payment == 0 {
            return Err(BuybackError::InvalidPurchaseAmount {
                reason: "payment amount too small to purchase any tokens".into(),
            });
        }
        let payment = Coin::new(denom, payment);
        self.ledger.transfer(
            buyer,
            &config.escrow_account,
            &Coins::from(payment.clone()),
        )?;

        let mut purchase = self.store.purchase(id, buyer).unwrap_or_default();
        let entry = VestingEntry::new(
            amount,
            auction.vesting.entry_start(self.now)?,
            quote.vesting_period,
        );
        purchase.add_entry(entry, params.max_purchase_number)?;
        auction.record_sale(amount, &payment)?;

        self.emit(Event::TokensPurchased {
            auction_id: id,
            buyer: buyer.clone(),
            amount,
            payment: payment.clone(),
            price: quote.price,
            vesting_period: quote.vesting_period,
        });
        tracing::info!(
            auction_id = %id,
            buyer = %buyer,
            amount,
            payment = %payment,
            price = %quote.price,
            discount = %quote.discount,
            "Tokens purchased"
        );

        let sold_out = auction.is_sold_out(params.min_purchase_amount);
        self.store.set_purchase(id, buyer.clone(), purchase);
        self.store.set_auction(auction);
        if sold_out {
            self.end_auction(id, REASON_SOLD_OUT)?;
        }
        Ok(payment)
    }

    /// Spend `payment`, buying `⌊payment / unit price⌋` tokens.
    pub(crate) fn buy_exact_spend(
        &mut self,
        buyer: &Address,
        id: AuctionId,
        payment: &Coin,
        requested_period: Option<TimeDelta>,
    ) -> Result<u128> {
        payment.validate_positive()?;
        let auction = self.load_auction(id)?;
        if !auction.is_active(self.now) {
            return Err(BuybackError::AuctionNotActive(id));
        }
        let quote = self.unit_price(&auction, &payment.denom, requested_period)?;
        let tokens = mul_div_floor(payment.amount, ONE, to_atto(quote.price)?)?;
        if tokens == 0 {
            return Err(BuybackError::InvalidPurchaseAmount {
                reason: "payment amount too small to purchase any tokens".into(),
            });
        }
        self.buy(buyer, id, tokens, &payment.denom, requested_period)?;
        Ok(tokens)
    }

    /// Pay out everything unlocked and not yet claimed.
    pub(crate) fn claim_vested_tokens(&mut self, claimer: &Address, id: AuctionId) -> Result<u128> {
        let config = self.config;
        let auction = self.load_auction(id)?;
        let mut purchase: Purchase =
            self.store
                .purchase(id, claimer)
                .ok_or_else(|| BuybackError::PurchaseNotFound {
                    auction_id: id,
                    buyer: claimer.clone(),
                })?;

        let claimable = purchase.claimable(self.now, auction.vesting_start)?;
        if claimable == 0 {
            return Err(BuybackError::NoClaimableTokens);
        }
        let tokens = Coins::from(Coin::new(config.base_denom.clone(), claimable));
        self.ledger
            .transfer(&config.escrow_account, claimer, &tokens)?;
        purchase.record_claim(claimable)?;

        self.emit(Event::TokensClaimed {
            auction_id: id,
            claimer: claimer.clone(),
            amount: claimable,
        });
        tracing::info!(
            auction_id = %id,
            claimer = %claimer,
            amount = claimable,
            claimed_total = purchase.claimed,
            "Vested tokens claimed"
        );

        self.store.set_purchase(id, claimer.clone(), purchase);
        Ok(claimable)
    }
}

//! Message handlers.
//!
//! Each handler checks the signer, then runs the operation as a single
//! transaction. Errors propagate unchanged and roll the transaction back.

use buyback_types::{AuctionId, Coin, Result, Timestamp, constants::REASON_TERMINATED};

use crate::keeper::Keeper;
use crate::ledger::{Ledger, PriceSource, PumpScheduler};
use crate::msgs::{
    MsgBuy, MsgBuyExactSpend, MsgClaimTokens, MsgCreateAuction, MsgSetAcceptedTokens,
    MsgTerminateAuction, MsgUpdateParams, require_signer,
};

impl<L: Ledger, P: PriceSource, S: PumpScheduler> Keeper<L, P, S> {
    /// Authority only. Returns the new auction's ID.
    pub fn create_auction(&mut self, now: Timestamp, msg: MsgCreateAuction) -> Result<AuctionId> {
        self.ensure_authority(&msg.authority)?;
        self.execute(now, |tx| tx.create_auction(&msg))
    }

    /// Authority only. Ends the auction with reason `auction_terminated`.
    pub fn terminate_auction(&mut self, now: Timestamp, msg: MsgTerminateAuction) -> Result<()> {
        self.ensure_authority(&msg.authority)?;
        self.execute(now, |tx| tx.end_auction(msg.auction_id, REASON_TERMINATED))
    }

    /// Returns the payment charged.
    pub fn buy(&mut self, now: Timestamp, msg: MsgBuy) -> Result<Coin> {
        require_signer(&msg.buyer, "buyer")?;
        self.execute(now, |tx| {
            tx.buy(
                &msg.buyer,
                msg.auction_id,
                msg.amount,
                &msg.denom,
                msg.vesting_period,
            )
        })
    }

    /// Returns the number of base tokens bought.
    pub fn buy_exact_spend(&mut self, now: Timestamp, msg: MsgBuyExactSpend) -> Result<u128> {
        require_signer(&msg.buyer, "buyer")?;
        self.execute(now, |tx| {
            tx.buy_exact_spend(&msg.buyer, msg.auction_id, &msg.payment, msg.vesting_period)
        })
    }

    /// Returns the amount claimed.
    pub fn claim_tokens(&mut self, now: Timestamp, msg: MsgClaimTokens) -> Result<u128> {
        require_signer(&msg.claimer, "claimer")?;
        self.execute(now, |tx| tx.claim_vested_tokens(&msg.claimer, msg.auction_id))
    }

    /// Authority only. Replaces the params wholesale.
    pub fn update_params(&mut self, now: Timestamp, msg: MsgUpdateParams) -> Result<()> {
        self.ensure_authority(&msg.authority)?;
        msg.params.validate()?;
        self.execute(now, |tx| {
            tracing::info!(
                ema_smoothing = %msg.params.ema_smoothing,
                max_purchase_number = msg.params.max_purchase_number,
                min_purchase_amount = msg.params.min_purchase_amount,
                "Params updated"
            );
            tx.store.set_params(msg.params);
            Ok(())
        })
    }

    /// Authority only. Replaces the accepted-token set.
    pub fn set_accepted_tokens(&mut self, now: Timestamp, msg: MsgSetAcceptedTokens) -> Result<()> {
        self.ensure_authority(&msg.authority)?;
        self.execute(now, |tx| tx.set_accepted_tokens(&msg.tokens))
    }
}

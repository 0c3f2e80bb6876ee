//! Read-only queries.
//!
//! Queries never write. Live values (status, current discount, claimable
//! amount, prices) are derived at the caller-supplied block time.

use buyback_types::{
    AcceptedToken, Address, Auction, AuctionId, AuctionStatus, BuybackError, Params, Purchase,
    Result, Timestamp,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::keeper::Keeper;
use crate::ledger::{Ledger, PriceSource, PumpScheduler};

/// An auction with its live status and, for linear policies, the discount
/// a buyer would get right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionResponse {
    pub auction: Auction,
    pub status: AuctionStatus,
    pub current_discount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPurchaseResponse {
    pub purchase: Purchase,
    pub claimable: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedTokenResponse {
    pub denom: String,
    pub token: AcceptedToken,
    pub spot_price: Decimal,
    /// `max(spot, EMA)`, the price purchases are charged against.
    pub base_price: Decimal,
}

fn auction_response(auction: &Auction, now: Timestamp) -> Result<AuctionResponse> {
    Ok(AuctionResponse {
        auction: auction.clone(),
        status: auction.status(now),
        current_discount: auction.current_discount(now)?,
    })
}

impl<L: Ledger, P: PriceSource, S: PumpScheduler> Keeper<L, P, S> {
    pub fn query_auction(&self, now: Timestamp, id: AuctionId) -> Result<AuctionResponse> {
        let auction = self
            .store()
            .auction(id)
            .ok_or(BuybackError::AuctionNotFound(id))?;
        auction_response(auction, now)
    }

    /// Every auction in ID order, optionally without completed ones.
    pub fn query_all_auctions(
        &self,
        now: Timestamp,
        exclude_completed: bool,
    ) -> Result<Vec<AuctionResponse>> {
        self.store()
            .auctions()
            .filter(|a| !(exclude_completed && a.completed))
            .map(|a| auction_response(a, now))
            .collect()
    }

    pub fn query_user_purchase(
        &self,
        now: Timestamp,
        id: AuctionId,
        user: &Address,
    ) -> Result<UserPurchaseResponse> {
        let auction = self
            .store()
            .auction(id)
            .ok_or(BuybackError::AuctionNotFound(id))?;
        let purchase =
            self.store()
                .purchase(id, user)
                .ok_or_else(|| BuybackError::PurchaseNotFound {
                    auction_id: id,
                    buyer: user.clone(),
                })?;
        Ok(UserPurchaseResponse {
            claimable: purchase.claimable(now, auction.vesting_start)?,
            purchase: purchase.clone(),
        })
    }

    /// Accepted tokens in denom order.
    #[must_use]
    pub fn query_accepted_tokens(&self) -> Vec<(String, AcceptedToken)> {
        self.store()
            .accepted_tokens()
            .iter()
            .map(|(denom, token)| (denom.clone(), token.clone()))
            .collect()
    }

    pub fn query_accepted_token(
        &self,
        now: Timestamp,
        denom: &str,
    ) -> Result<AcceptedTokenResponse> {
        self.view(now, |tx| {
            let token = tx.accepted_token(denom)?;
            Ok(AcceptedTokenResponse {
                denom: denom.to_string(),
                spot_price: tx.spot_price(denom)?,
                base_price: tx.base_price(denom)?,
                token,
            })
        })
    }

    #[must_use]
    pub fn query_params(&self) -> &Params {
        self.store().params()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{buy_msg, create_msg, t0, test_keeper};
    use buyback_types::{DiscountPolicy, ErrorKind, PoolId};
    use chrono::TimeDelta;
    use std::str::FromStr;

    const E18: u128 = 1_000_000_000_000_000_000;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn auction_query_reports_live_discount() {
        let mut keeper = test_keeper(dec("0.25"));
        let id = keeper.create_auction(t0(), create_msg(100 * E18, t0())).unwrap();

        let at_start = keeper.query_auction(t0(), id).unwrap();
        assert_eq!(at_start.status, AuctionStatus::Active);
        assert_eq!(at_start.current_discount, Some(dec("0.05")));

        let midway = keeper.query_auction(t0() + TimeDelta::hours(12), id).unwrap();
        assert_eq!(midway.current_discount, Some(dec("0.275")));

        let before = keeper.query_auction(t0() - TimeDelta::hours(1), id).unwrap();
        assert_eq!(before.status, AuctionStatus::Upcoming);

        assert_eq!(
            keeper.query_auction(t0(), AuctionId(5)).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn fixed_policy_has_no_current_discount() {
        let mut keeper = test_keeper(dec("0.25"));
        let mut msg = create_msg(100 * E18, t0());
        msg.discount = DiscountPolicy::dummy_fixed();
        let id = keeper.create_auction(t0(), msg).unwrap();
        assert_eq!(keeper.query_auction(t0(), id).unwrap().current_discount, None);
    }

    #[test]
    fn all_auctions_can_exclude_completed() {
        let mut keeper = test_keeper(dec("0.25"));
        let first = keeper.create_auction(t0(), create_msg(10 * E18, t0())).unwrap();
        keeper.create_auction(t0(), create_msg(10 * E18, t0())).unwrap();
        let alice = keeper.funded_buyer("alice", 100 * E18);
        keeper.buy(t0(), buy_msg(&alice, first, 10 * E18)).unwrap();

        assert_eq!(keeper.query_all_auctions(t0(), false).unwrap().len(), 2);
        let open = keeper.query_all_auctions(t0(), true).unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].auction.id, AuctionId(2));
    }

    #[test]
    fn user_purchase_includes_claimable() {
        let mut keeper = test_keeper(dec("0.25"));
        let id = keeper.create_auction(t0(), create_msg(100 * E18, t0())).unwrap();
        let alice = keeper.funded_buyer("alice", 100 * E18);
        keeper.buy(t0(), buy_msg(&alice, id, 10 * E18)).unwrap();

        let response = keeper
            .query_user_purchase(t0() + TimeDelta::hours(6), id, &alice)
            .unwrap();
        assert_eq!(response.claimable, 2_500_000_000_000_000_000);
        assert_eq!(response.purchase.claimed, 0);

        let missing = keeper
            .query_user_purchase(t0(), id, &Address::new("bob"))
            .unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn accepted_token_query_prices() {
        let mut keeper = test_keeper(dec("0.25"));
        keeper.prices_mut().set_price(PoolId(1), dec("0.2"));
        let response = keeper.query_accepted_token(t0(), "usdc").unwrap();
        assert_eq!(response.spot_price, dec("0.2"));
        assert_eq!(response.base_price, dec("0.25"));
        assert_eq!(response.token.pool_id, PoolId(1));

        assert_eq!(keeper.query_accepted_tokens().len(), 1);
        assert!(keeper.query_accepted_token(t0(), "uatom").is_err());
        assert_eq!(keeper.query_params(), &Params::default());
    }
}

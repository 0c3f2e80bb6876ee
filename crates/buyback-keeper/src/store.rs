//! Committed module state.
//!
//! Layout:
//!
//! ```text
//!   next_auction_id            → AuctionId
//!   auctions         AuctionId → Auction
//!   purchases (AuctionId, Address) → Purchase
//!   params                     → Params
//!   accepted_tokens     denom  → AcceptedToken
//! ```
//!
//! Every map is a `BTreeMap`, so iteration order is the same on every node.

use std::collections::BTreeMap;

use buyback_types::{AcceptedToken, Address, Auction, AuctionId, Params, Purchase};

/// The persisted state of the module. Mutated only by committing a
/// [`StoreDelta`] produced by a successful transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    pub(crate) next_auction_id: AuctionId,
    pub(crate) auctions: BTreeMap<AuctionId, Auction>,
    pub(crate) purchases: BTreeMap<(AuctionId, Address), Purchase>,
    pub(crate) params: Params,
    pub(crate) accepted_tokens: BTreeMap<String, AcceptedToken>,
}

impl Store {
    /// Empty state with the given params; the first auction gets ID 1.
    #[must_use]
    pub fn new(params: Params) -> Self {
        Self {
            next_auction_id: AuctionId::FIRST,
            auctions: BTreeMap::new(),
            purchases: BTreeMap::new(),
            params,
            accepted_tokens: BTreeMap::new(),
        }
    }

    /// Arbitrary state, consistent or not, for exercising checkers.
    #[cfg(any(test, feature = "test-helpers"))]
    #[must_use]
    pub fn from_parts(
        auctions: impl IntoIterator<Item = Auction>,
        purchases: impl IntoIterator<Item = (AuctionId, Address, Purchase)>,
    ) -> Self {
        let auctions: BTreeMap<AuctionId, Auction> =
            auctions.into_iter().map(|a| (a.id, a)).collect();
        let next_auction_id = auctions
            .keys()
            .next_back()
            .map_or(AuctionId::FIRST, |id| id.next());
        Self {
            next_auction_id,
            auctions,
            purchases: purchases
                .into_iter()
                .map(|(id, buyer, purchase)| ((id, buyer), purchase))
                .collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn next_auction_id(&self) -> AuctionId {
        self.next_auction_id
    }

    #[must_use]
    pub fn auction(&self, id: AuctionId) -> Option<&Auction> {
        self.auctions.get(&id)
    }

    /// All auctions in ID order.
    pub fn auctions(&self) -> impl Iterator<Item = &Auction> {
        self.auctions.values()
    }

    #[must_use]
    pub fn purchase(&self, id: AuctionId, buyer: &Address) -> Option<&Purchase> {
        self.purchases.get(&(id, buyer.clone()))
    }

    /// All purchases in (auction, buyer) order.
    pub fn purchases(&self) -> impl Iterator<Item = (AuctionId, &Address, &Purchase)> {
        self.purchases
            .iter()
            .map(|((id, buyer), purchase)| (*id, buyer, purchase))
    }

    /// Purchases of one auction, in buyer order.
    pub fn auction_purchases(
        &self,
        id: AuctionId,
    ) -> impl Iterator<Item = (&Address, &Purchase)> {
        self.purchases
            .range((id, Address::new(""))..)
            .take_while(move |((aid, _), _)| *aid == id)
            .map(|((_, buyer), purchase)| (buyer, purchase))
    }

    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    #[must_use]
    pub fn accepted_tokens(&self) -> &BTreeMap<String, AcceptedToken> {
        &self.accepted_tokens
    }

    pub(crate) fn apply(&mut self, delta: StoreDelta) {
        if let Some(next) = delta.next_auction_id {
            self.next_auction_id = next;
        }
        self.auctions.extend(delta.auctions);
        self.purchases.extend(delta.purchases);
        if let Some(params) = delta.params {
            self.params = params;
        }
        if let Some(tokens) = delta.accepted_tokens {
            self.accepted_tokens = tokens;
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

/// Writes buffered by a transaction, applied in one step on commit.
#[derive(Debug, Default)]
pub(crate) struct StoreDelta {
    pub(crate) next_auction_id: Option<AuctionId>,
    pub(crate) auctions: BTreeMap<AuctionId, Auction>,
    pub(crate) purchases: BTreeMap<(AuctionId, Address), Purchase>,
    pub(crate) params: Option<Params>,
    pub(crate) accepted_tokens: Option<BTreeMap<String, AcceptedToken>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use buyback_types::{VestingEntry, Timestamp};
    use chrono::{TimeDelta, TimeZone, Utc};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn purchase(amount: u128) -> Purchase {
        Purchase {
            entries: vec![VestingEntry::new(amount, Some(t0()), TimeDelta::hours(1))],
            claimed: 0,
        }
    }

    #[test]
    fn new_store_starts_at_first_id() {
        let store = Store::default();
        assert_eq!(store.next_auction_id(), AuctionId::FIRST);
        assert_eq!(store.auctions().count(), 0);
    }

    #[test]
    fn apply_merges_delta() {
        let mut store = Store::default();
        let mut delta = StoreDelta {
            next_auction_id: Some(AuctionId(2)),
            ..StoreDelta::default()
        };
        delta
            .auctions
            .insert(AuctionId(1), Auction::dummy(1, 100, t0()));
        store.apply(delta);
        assert_eq!(store.next_auction_id(), AuctionId(2));
        assert!(store.auction(AuctionId(1)).is_some());
    }

    #[test]
    fn auction_purchases_is_scoped() {
        let mut store = Store::default();
        let mut delta = StoreDelta::default();
        delta
            .purchases
            .insert((AuctionId(1), Address::new("bob")), purchase(1));
        delta
            .purchases
            .insert((AuctionId(2), Address::new("alice")), purchase(2));
        delta
            .purchases
            .insert((AuctionId(1), Address::new("alice")), purchase(3));
        store.apply(delta);

        let buyers: Vec<_> = store
            .auction_purchases(AuctionId(1))
            .map(|(b, _)| b.as_str().to_string())
            .collect();
        assert_eq!(buyers, vec!["alice", "bob"]);
        assert_eq!(store.purchases().count(), 3);
    }
}

//! Write-buffering overlays used by transactions.
//!
//! [`StoreCache`] layers pending writes over the committed [`Store`];
//! [`LedgerCache`] tracks pending transfers over the external [`Ledger`].
//! Reads see the overlay first, so a transaction observes its own writes.
//! Dropping either cache discards everything.

use std::collections::BTreeMap;

use buyback_types::{
    AcceptedToken, Address, Auction, AuctionId, BuybackError, Coins, Params, Purchase, Result,
};

use crate::ledger::{Ledger, Transfer};
use crate::store::{Store, StoreDelta};

// ---------------------------------------------------------------------------
// StoreCache
// ---------------------------------------------------------------------------

pub(crate) struct StoreCache<'a> {
    base: &'a Store,
    delta: StoreDelta,
}

impl<'a> StoreCache<'a> {
    pub(crate) fn new(base: &'a Store) -> Self {
        Self {
            base,
            delta: StoreDelta::default(),
        }
    }

    pub(crate) fn next_auction_id(&self) -> AuctionId {
        self.delta
            .next_auction_id
            .unwrap_or(self.base.next_auction_id)
    }

    pub(crate) fn set_next_auction_id(&mut self, id: AuctionId) {
        self.delta.next_auction_id = Some(id);
    }

    pub(crate) fn auction(&self, id: AuctionId) -> Option<Auction> {
        self.delta
            .auctions
            .get(&id)
            .or_else(|| self.base.auctions.get(&id))
            .cloned()
    }

    pub(crate) fn set_auction(&mut self, auction: Auction) {
        self.delta.auctions.insert(auction.id, auction);
    }

    pub(crate) fn purchase(&self, id: AuctionId, buyer: &Address) -> Option<Purchase> {
        let key = (id, buyer.clone());
        self.delta
            .purchases
            .get(&key)
            .or_else(|| self.base.purchases.get(&key))
            .cloned()
    }

    pub(crate) fn set_purchase(&mut self, id: AuctionId, buyer: Address, purchase: Purchase) {
        self.delta.purchases.insert((id, buyer), purchase);
    }

    pub(crate) fn params(&self) -> &Params {
        self.delta.params.as_ref().unwrap_or(&self.base.params)
    }

    pub(crate) fn set_params(&mut self, params: Params) {
        self.delta.params = Some(params);
    }

    pub(crate) fn accepted_tokens(&self) -> &BTreeMap<String, AcceptedToken> {
        self.delta
            .accepted_tokens
            .as_ref()
            .unwrap_or(&self.base.accepted_tokens)
    }

    pub(crate) fn accepted_token(&self, denom: &str) -> Option<AcceptedToken> {
        self.accepted_tokens().get(denom).cloned()
    }

    /// Replace the whole accepted-token set.
    pub(crate) fn set_accepted_tokens(&mut self, tokens: BTreeMap<String, AcceptedToken>) {
        self.delta.accepted_tokens = Some(tokens);
    }

    /// Update one accepted token, copying the committed set on first write.
    pub(crate) fn set_accepted_token(&mut self, denom: &str, token: AcceptedToken) {
        let base = self.base;
        let tokens = self
            .delta
            .accepted_tokens
            .get_or_insert_with(|| base.accepted_tokens.clone());
        tokens.insert(denom.to_string(), token);
    }

    pub(crate) fn into_delta(self) -> StoreDelta {
        self.delta
    }
}

// ---------------------------------------------------------------------------
// LedgerCache
// ---------------------------------------------------------------------------

/// Pending ledger movements. Balances are checked against the external
/// ledger plus everything already moved in this transaction.
pub(crate) struct LedgerCache<'a, L> {
    base: &'a L,
    credited: BTreeMap<(Address, String), u128>,
    debited: BTreeMap<(Address, String), u128>,
    transfers: Vec<Transfer>,
}

impl<'a, L: Ledger> LedgerCache<'a, L> {
    pub(crate) fn new(base: &'a L) -> Self {
        Self {
            base,
            credited: BTreeMap::new(),
            debited: BTreeMap::new(),
            transfers: Vec::new(),
        }
    }

    /// Balance as seen by this transaction.
    pub(crate) fn balance(&self, account: &Address, denom: &str) -> u128 {
        let key = (account.clone(), denom.to_string());
        let credited = self.credited.get(&key).copied().unwrap_or(0);
        let debited = self.debited.get(&key).copied().unwrap_or(0);
        self.base
            .balance(account, denom)
            .saturating_add(credited)
            .saturating_sub(debited)
    }

    /// Move `coins` from `from` to `to`. Empty transfers are skipped.
    pub(crate) fn transfer(&mut self, from: &Address, to: &Address, coins: &Coins) -> Result<()> {
        if coins.is_zero() {
            return Ok(());
        }
        for coin in coins.iter() {
            let available = self.balance(from, &coin.denom);
            if available < coin.amount {
                return Err(BuybackError::InsufficientFunds {
                    account: from.clone(),
                    denom: coin.denom,
                    needed: coin.amount,
                    available,
                });
            }
            if from != to && self.balance(to, &coin.denom).checked_add(coin.amount).is_none() {
                return Err(BuybackError::Arithmetic(format!(
                    "balance overflow for {to} {}",
                    coin.denom
                )));
            }
        }
        for coin in coins.iter() {
            bump(&mut self.debited, from, &coin.denom, coin.amount)?;
            bump(&mut self.credited, to, &coin.denom, coin.amount)?;
        }
        self.transfers.push(Transfer {
            from: from.clone(),
            to: to.clone(),
            coins: coins.clone(),
        });
        Ok(())
    }

    pub(crate) fn into_transfers(self) -> Vec<Transfer> {
        self.transfers
    }
}

fn bump(
    map: &mut BTreeMap<(Address, String), u128>,
    account: &Address,
    denom: &str,
    amount: u128,
) -> Result<()> {
    let slot = map
        .entry((account.clone(), denom.to_string()))
        .or_insert(0);
    *slot = slot
        .checked_add(amount)
        .ok_or_else(|| BuybackError::Arithmetic(format!("pending transfer overflow for {denom}")))?;
    Ok(())
}

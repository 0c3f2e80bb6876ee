//! The keeper: owns module state and the injected collaborators.

use buyback_types::{Address, BuybackError, Event, ModuleConfig, Params, Result, Timestamp};

use crate::ledger::{Ledger, PriceSource, PumpScheduler, Transfer};
use crate::store::Store;
use crate::transaction::{Transaction, TxOutput};

/// Buyback module keeper.
///
/// Generic over the bank ledger `L`, the AMM price source `P` and the pump
/// scheduler `S`. Every public operation runs as one transaction: its
/// writes become visible only if the whole operation succeeds.
pub struct Keeper<L, P, S> {
    config: ModuleConfig,
    store: Store,
    ledger: L,
    prices: P,
    pumps: S,
    events: Vec<Event>,
}

impl<L: Ledger, P: PriceSource, S: PumpScheduler> Keeper<L, P, S> {
    /// Keeper over fresh state.
    pub fn new(
        config: ModuleConfig,
        params: Params,
        ledger: L,
        prices: P,
        pumps: S,
    ) -> Result<Self> {
        params.validate()?;
        Self::with_store(config, Store::new(params), ledger, prices, pumps)
    }

    /// Keeper over existing state.
    pub fn with_store(
        config: ModuleConfig,
        store: Store,
        ledger: L,
        prices: P,
        pumps: S,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            ledger,
            prices,
            pumps,
            events: Vec::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    #[must_use]
    pub fn prices(&self) -> &P {
        &self.prices
    }

    pub fn prices_mut(&mut self) -> &mut P {
        &mut self.prices
    }

    #[must_use]
    pub fn pump_scheduler(&self) -> &S {
        &self.pumps
    }

    /// Events emitted by committed operations, oldest first.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Take and clear the event log.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    #[must_use]
    pub fn balance_of(&self, account: &Address, denom: &str) -> u128 {
        self.ledger.balance(account, denom)
    }

    pub(crate) fn ensure_authority(&self, signer: &Address) -> Result<()> {
        if *signer != self.config.authority {
            return Err(BuybackError::Unauthorized {
                expected: self.config.authority.clone(),
                actual: signer.clone(),
            });
        }
        Ok(())
    }

    /// Read-only view at `now`; nothing done through it is committed.
    pub(crate) fn view<T>(
        &self,
        now: Timestamp,
        op: impl FnOnce(&Transaction<'_, L, P>) -> Result<T>,
    ) -> Result<T> {
        let tx = Transaction::new(&self.config, &self.store, &self.ledger, &self.prices, now);
        op(&tx)
    }

    /// Run `op` atomically at block time `now`.
    pub(crate) fn execute<T>(
        &mut self,
        now: Timestamp,
        op: impl FnOnce(&mut Transaction<'_, L, P>) -> Result<T>,
    ) -> Result<T> {
        let (value, output) = {
            let mut tx =
                Transaction::new(&self.config, &self.store, &self.ledger, &self.prices, now);
            let value = op(&mut tx)?;
            (value, tx.into_output())
        };
        self.commit(output)?;
        Ok(value)
    }

    fn commit(&mut self, output: TxOutput) -> Result<()> {
        let TxOutput {
            delta,
            transfers,
            pumps,
            events,
        } = output;

        for (applied, transfer) in transfers.iter().enumerate() {
            if let Err(err) = self.apply_transfer(transfer) {
                tracing::error!(
                    from = %transfer.from,
                    to = %transfer.to,
                    coins = %transfer.coins,
                    error = %err,
                    "Ledger commit failed after validation; rolling back"
                );
                self.rollback_transfers(&transfers[..applied]);
                return Err(BuybackError::LedgerRejected {
                    reason: err.to_string(),
                });
            }
        }

        self.store.apply(delta);

        for request in pumps {
            let auction_id = request.auction_id;
            let coin = request.coin.clone();
            if let Err(err) = self.pumps.schedule(request) {
                tracing::error!(
                    auction_id = %auction_id,
                    coin = %coin,
                    error = %err,
                    "Pump scheduling failed; proceeds remain in the pump account"
                );
            }
        }

        self.events.extend(events);
        Ok(())
    }

    /// Debit then credit; a rejected credit is returned to the sender.
    fn apply_transfer(&mut self, transfer: &Transfer) -> Result<()> {
        self.ledger.debit(&transfer.from, &transfer.coins)?;
        if let Err(err) = self.ledger.credit(&transfer.to, &transfer.coins) {
            self.refund(transfer);
            return Err(err);
        }
        Ok(())
    }

    /// Undo fully applied transfers, newest first.
    fn rollback_transfers(&mut self, applied: &[Transfer]) {
        for transfer in applied.iter().rev() {
            if let Err(err) = self.ledger.debit(&transfer.to, &transfer.coins) {
                tracing::error!(
                    account = %transfer.to,
                    coins = %transfer.coins,
                    error = %err,
                    "Ledger rollback debit failed"
                );
                continue;
            }
            self.refund(transfer);
        }
    }

    /// Return debited coins to the sender.
    fn refund(&mut self, transfer: &Transfer) {
        if let Err(err) = self.ledger.credit(&transfer.from, &transfer.coins) {
            tracing::error!(
                account = %transfer.from,
                coins = %transfer.coins,
                error = %err,
                "Ledger rollback credit failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;
    use crate::msgs::MsgTerminateAuction;
    use crate::testing::{
        FixedPriceSource, RecordingPumpScheduler, buy_msg, create_msg, t0, test_keeper,
    };
    use buyback_types::{Coin, Coins};
    use rust_decimal::Decimal;

    const E18: u128 = 1_000_000_000_000_000_000;

    /// Ledger that refuses every credit to one account.
    struct RejectingLedger {
        inner: InMemoryLedger,
        reject_credit_to: Option<Address>,
    }

    impl Ledger for RejectingLedger {
        fn balance(&self, account: &Address, denom: &str) -> u128 {
            self.inner.balance(account, denom)
        }

        fn debit(&mut self, account: &Address, coins: &Coins) -> Result<()> {
            self.inner.debit(account, coins)
        }

        fn credit(&mut self, account: &Address, coins: &Coins) -> Result<()> {
            if self.reject_credit_to.as_ref() == Some(account) {
                return Err(BuybackError::Internal(format!("credits to {account} frozen")));
            }
            self.inner.credit(account, coins)
        }
    }

    #[test]
    fn new_rejects_invalid_config_and_params() {
        let mut config = ModuleConfig::dummy();
        config.pump_account = config.escrow_account.clone();
        let keeper = Keeper::new(
            config,
            Params::default(),
            InMemoryLedger::new(),
            FixedPriceSource::new(),
            RecordingPumpScheduler::default(),
        );
        assert!(matches!(keeper, Err(BuybackError::Configuration(_))));

        let mut params = Params::default();
        params.max_purchase_number = 0;
        let keeper = Keeper::new(
            ModuleConfig::dummy(),
            params,
            InMemoryLedger::new(),
            FixedPriceSource::new(),
            RecordingPumpScheduler::default(),
        );
        assert!(matches!(keeper, Err(BuybackError::InvalidParams { .. })));
    }

    #[test]
    fn failed_operation_commits_nothing() {
        let mut keeper = test_keeper(Decimal::new(25, 2));
        let escrow = keeper.config().escrow_account.clone();
        let before = keeper.store().clone();

        // Valid auction, but the treasury cannot fund it.
        let result = keeper.create_auction(t0(), create_msg(u128::MAX / 2, t0()));
        assert!(result.is_err());
        assert_eq!(keeper.store(), &before);
        assert_eq!(keeper.balance_of(&escrow, "adym"), 0);
        assert!(keeper.events().is_empty());
    }

    #[test]
    fn rejected_pump_keeps_proceeds_in_pump_account() {
        let mut keeper = test_keeper(Decimal::new(25, 2));
        let id = keeper.create_auction(t0(), create_msg(100 * E18, t0())).unwrap();
        let alice = keeper.funded_buyer("alice", 100 * E18);
        let payment = keeper.buy(t0(), buy_msg(&alice, id, 10 * E18)).unwrap();

        keeper.pumps.reject = true;
        let authority = keeper.config().authority.clone();
        keeper
            .terminate_auction(t0(), MsgTerminateAuction { authority, auction_id: id })
            .unwrap();

        let pump = keeper.config().pump_account.clone();
        assert_eq!(keeper.balance_of(&pump, "usdc"), payment.amount);
        assert!(keeper.pump_scheduler().requests.is_empty());
        assert!(keeper.store().auction(id).unwrap().completed);
    }

    #[test]
    fn rejected_credit_rolls_back_every_transfer() {
        let mut keeper = test_keeper(Decimal::new(25, 2));
        let id = keeper.create_auction(t0(), create_msg(100 * E18, t0())).unwrap();
        let alice = keeper.funded_buyer("alice", 100 * E18);
        keeper.buy(t0(), buy_msg(&alice, id, 10 * E18)).unwrap();

        let config = keeper.config().clone();
        let mut keeper = Keeper {
            config: config.clone(),
            store: keeper.store,
            ledger: RejectingLedger {
                inner: keeper.ledger,
                reject_credit_to: Some(config.pump_account.clone()),
            },
            prices: keeper.prices,
            pumps: keeper.pumps,
            events: keeper.events,
        };
        let accounts = [
            &config.escrow_account,
            &config.treasury_account,
            &config.pump_account,
            &alice,
        ];
        let balances = |k: &Keeper<RejectingLedger, FixedPriceSource, RecordingPumpScheduler>| {
            accounts
                .iter()
                .map(|a| (k.balance_of(a, "adym"), k.balance_of(a, "usdc")))
                .collect::<Vec<_>>()
        };
        let before = balances(&keeper);
        let store_before = keeper.store().clone();
        let events_before = keeper.events().len();

        // Unsold tokens go back to the treasury first, then the pump credit fails.
        let err = keeper
            .terminate_auction(
                t0(),
                MsgTerminateAuction {
                    authority: config.authority.clone(),
                    auction_id: id,
                },
            )
            .unwrap_err();
        assert!(matches!(err, BuybackError::LedgerRejected { .. }));
        assert_eq!(balances(&keeper), before);
        assert_eq!(keeper.store(), &store_before);
        assert_eq!(keeper.events().len(), events_before);
        assert!(keeper.pump_scheduler().requests.is_empty());
    }

    #[test]
    fn receiver_overflow_fails_before_any_funds_move() {
        let mut keeper = test_keeper(Decimal::new(25, 2));
        let id = keeper.create_auction(t0(), create_msg(100 * E18, t0())).unwrap();
        let alice = keeper.funded_buyer("alice", 100 * E18);
        let escrow = keeper.config().escrow_account.clone();
        keeper
            .ledger_mut()
            .deposit(&escrow, &Coin::new("usdc", u128::MAX - 1))
            .unwrap();

        let err = keeper.buy(t0(), buy_msg(&alice, id, 10 * E18)).unwrap_err();
        assert!(matches!(err, BuybackError::Arithmetic(_)));
        assert_eq!(keeper.balance_of(&alice, "usdc"), 100 * E18);
        assert_eq!(keeper.balance_of(&escrow, "usdc"), u128::MAX - 1);
        assert_eq!(keeper.store().auction(id).unwrap().sold, 0);
        assert!(keeper.store().purchase(id, &alice).is_none());
    }

    #[test]
    fn drain_events_empties_the_log() {
        let mut keeper = test_keeper(Decimal::new(25, 2));
        keeper.create_auction(t0(), create_msg(10 * E18, t0())).unwrap();
        assert_eq!(keeper.drain_events().len(), 1);
        assert!(keeper.events().is_empty());
    }
}

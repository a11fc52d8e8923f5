// 8.0.3: one operation's scratch space. holds the price snapshot every step reads, plus
// collateral transfers and events that only become real once the operation commits.

use super::results::EngineError;
use crate::collateral::CollateralLedger;
use crate::events::EventPayload;
use crate::oracle::PriceSnapshot;
use crate::types::{AccountId, Price, Quote, RoundId, Timestamp};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum Transfer {
    Debit(AccountId, Quote),
    Credit(AccountId, Quote),
}

#[derive(Debug)]
pub(super) struct Transaction {
    pub snapshot: PriceSnapshot,
    pub now: Timestamp,
    transfers: Vec<Transfer>,
    events: Vec<EventPayload>,
}

impl Transaction {
    pub fn new(snapshot: PriceSnapshot, now: Timestamp) -> Self {
        Self {
            snapshot,
            now,
            transfers: Vec::new(),
            events: Vec::new(),
        }
    }

    // raw price, may be flagged invalid
    pub fn price(&self) -> Price {
        self.snapshot.price
    }

    pub fn valid_price(&self) -> Result<Price, EngineError> {
        self.snapshot.valid_price().ok_or(EngineError::InvalidPrice)
    }

    pub fn round_id(&self) -> RoundId {
        self.snapshot.round_id
    }

    pub fn debit(&mut self, account: AccountId, amount: Quote) {
        if !amount.is_zero() {
            self.transfers.push(Transfer::Debit(account, amount));
        }
    }

    pub fn credit(&mut self, account: AccountId, amount: Quote) {
        if !amount.is_zero() {
            self.transfers.push(Transfer::Credit(account, amount));
        }
    }

    pub fn emit(&mut self, payload: EventPayload) {
        self.events.push(payload);
    }

    // ledger balance as this operation will leave it
    pub fn available_balance<C: CollateralLedger + ?Sized>(&self, ledger: &C, account: AccountId) -> Quote {
        let staged = self.net_transfers().get(&account).copied().unwrap_or_else(Quote::zero);
        ledger.balance_of(account).add(staged)
    }

    // signed net per account: credits positive, debits negative
    pub fn net_transfers(&self) -> BTreeMap<AccountId, Quote> {
        let mut net: BTreeMap<AccountId, Quote> = BTreeMap::new();
        for transfer in &self.transfers {
            let (account, delta) = match *transfer {
                Transfer::Debit(account, amount) => (account, amount.negate()),
                Transfer::Credit(account, amount) => (account, amount),
            };
            let entry = net.entry(account).or_insert_with(Quote::zero);
            *entry = entry.add(delta);
        }
        net
    }

    pub fn into_events(self) -> Vec<EventPayload> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collateral::InMemoryLedger;
    use rust_decimal_macros::dec;

    fn tx() -> Transaction {
        let snapshot = PriceSnapshot {
            price: Price::new_unchecked(dec!(100)),
            invalid: false,
            round_id: RoundId(4),
        };
        Transaction::new(snapshot, Timestamp::from_secs(1))
    }

    #[test]
    fn transfers_net_per_account() {
        let mut tx = tx();
        tx.credit(AccountId(1), Quote::new(dec!(1015)));
        tx.debit(AccountId(1), Quote::new(dec!(2030)));
        tx.credit(AccountId(2), Quote::new(dec!(15)));
        tx.debit(AccountId(3), Quote::zero());

        let net = tx.net_transfers();
        assert_eq!(net.get(&AccountId(1)).unwrap().value(), dec!(-1015));
        assert_eq!(net.get(&AccountId(2)).unwrap().value(), dec!(15));
        assert!(!net.contains_key(&AccountId(3)));
    }

    #[test]
    fn available_balance_includes_staged() {
        let mut ledger = InMemoryLedger::new();
        ledger.deposit(AccountId(1), Quote::new(dec!(500)));

        let mut tx = tx();
        tx.credit(AccountId(1), Quote::new(dec!(200)));
        assert_eq!(tx.available_balance(&ledger, AccountId(1)).value(), dec!(700));
    }

    #[test]
    fn invalid_snapshot_rejects_price() {
        let mut tx = tx();
        tx.snapshot.invalid = true;
        assert_eq!(tx.valid_price(), Err(EngineError::InvalidPrice));
        assert_eq!(tx.price().value(), dec!(100));
    }
}

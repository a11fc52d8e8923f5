//! Collateral ledger interface.
//!
//! The engine does not own balances. It escrows by debiting an account and
//! releases (refunds, fees, liquidation rewards) by crediting one, through
//! whatever ledger it was constructed with.

use crate::types::{AccountId, Quote};
use rust_decimal::Decimal;
use std::collections::HashMap;

pub trait CollateralLedger {
    fn balance_of(&self, account: AccountId) -> Quote;

    /// Remove `amount` from the account. Fails without side effects if the balance is short.
    fn debit(&mut self, account: AccountId, amount: Quote) -> Result<(), CollateralError>;

    fn credit(&mut self, account: AccountId, amount: Quote);
}

/// Balances held in memory. Tracks totals so conservation can be checked.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    balances: HashMap<AccountId, Quote>,
    pub total_debited: Quote,
    pub total_credited: Quote,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // setup helper: funds an account outside of the debit/credit flow
    pub fn deposit(&mut self, account: AccountId, amount: Quote) {
        let balance = self.balance_of(account);
        self.balances.insert(account, balance.add(amount));
    }

    pub fn total_balance(&self) -> Quote {
        self.balances.values().sum()
    }
}

impl CollateralLedger for InMemoryLedger {
    fn balance_of(&self, account: AccountId) -> Quote {
        self.balances.get(&account).copied().unwrap_or_else(Quote::zero)
    }

    fn debit(&mut self, account: AccountId, amount: Quote) -> Result<(), CollateralError> {
        if amount.is_negative() {
            return Err(CollateralError::NegativeAmount(amount));
        }
        let available = self.balance_of(account);
        if amount > available {
            return Err(CollateralError::InsufficientBalance {
                account,
                requested: amount,
                available,
            });
        }
        self.balances.insert(account, available.sub(amount));
        self.total_debited = self.total_debited.add(amount);
        Ok(())
    }

    fn credit(&mut self, account: AccountId, amount: Quote) {
        debug_assert!(amount.value() >= Decimal::ZERO);
        let balance = self.balance_of(account);
        self.balances.insert(account, balance.add(amount));
        self.total_credited = self.total_credited.add(amount);
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CollateralError {
    #[error("Insufficient balance for {account}: requested {requested}, available {available}")]
    InsufficientBalance {
        account: AccountId,
        requested: Quote,
        available: Quote,
    },

    #[error("Negative transfer amount: {0}")]
    NegativeAmount(Quote),
}

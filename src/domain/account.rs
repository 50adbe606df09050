use serde::{Deserialize, Serialize};

use super::Money;

/// Sequential account identifier, assigned by the registry starting at 1.
pub type AccountId = i64;

/// Phone number identifying an account. Unique across the registry.
pub type Phone = String;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub phone: Phone,
    pub balance: Money,
}

impl Account {
    /// A freshly registered account always starts with a zero balance.
    pub fn new(id: AccountId, phone: impl Into<Phone>) -> Self {
        Self {
            id,
            phone: phone.into(),
            balance: 0,
        }
    }

    /// Build an account with an arbitrary balance, as read from a dump.
    pub fn with_balance(mut self, balance: Money) -> Self {
        self.balance = balance;
        self
    }

    pub fn can_afford(&self, amount: Money) -> bool {
        self.balance >= amount
    }
}

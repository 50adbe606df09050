use std::path::PathBuf;

use thiserror::Error;

use crate::domain::{AccountId, FavoriteId, Money, PaymentId, PaymentStatus, Phone};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Phone already registered: {0}")]
    PhoneAlreadyRegistered(Phone),

    #[error("Amount must be greater than zero, got {0}")]
    AmountMustBePositive(Money),

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Not enough balance in account {account_id}: balance {balance}, required {required}")]
    NotEnoughBalance {
        account_id: AccountId,
        balance: Money,
        required: Money,
    },

    #[error("Balance overflow in account {account_id}: balance {balance}, adding {amount}")]
    BalanceOverflow {
        account_id: AccountId,
        balance: Money,
        amount: Money,
    },

    #[error("Payment total does not fit in the money range")]
    SumOverflow,

    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    #[error("Favorite not found: {0}")]
    FavoriteNotFound(FavoriteId),

    #[error("Payment {id} is already {status}")]
    PaymentFinalized { id: PaymentId, status: PaymentStatus },

    #[error("File not found: {}", path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Import failed: {}", path.display())]
    ImportFailed {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Unsupported snapshot schema: {0}")]
    UnsupportedSnapshot(String),
}

impl LedgerError {
    pub(crate) fn file(path: impl Into<PathBuf>, source: impl Into<std::io::Error>) -> Self {
        LedgerError::FileNotFound {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn import(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        LedgerError::ImportFailed {
            path: path.into(),
            source: source.into(),
        }
    }
}

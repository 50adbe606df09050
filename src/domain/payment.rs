use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, Money};

pub type PaymentId = Uuid;

/// Free-form payment label, e.g. "food" or "cinema".
pub type Category = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Initial state of every payment
    #[serde(rename = "INPROGRESS")]
    InProgress,
    /// Settled, terminal
    #[serde(rename = "OK")]
    Ok,
    /// Rejected and refunded, terminal
    #[serde(rename = "FAIL")]
    Fail,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::InProgress => "INPROGRESS",
            PaymentStatus::Ok => "OK",
            PaymentStatus::Fail => "FAIL",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::InProgress)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single debit against an account.
/// The amount is fixed at creation; only the status moves afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub account_id: AccountId,
    pub amount: Money,
    pub category: Category,
    pub status: PaymentStatus,
}

impl Payment {
    /// Create a new in-progress payment with a fresh ID.
    /// The amount must already have been validated as positive.
    pub fn new(account_id: AccountId, amount: Money, category: impl Into<Category>) -> Self {
        debug_assert!(amount > 0, "Payment amount must be positive");
        Self {
            id: Uuid::new_v4(),
            account_id,
            amount,
            category: category.into(),
            status: PaymentStatus::InProgress,
        }
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, Category, Money, Payment};

pub type FavoriteId = Uuid;

/// A named template frozen from a payment at the moment it was favorited.
/// Later changes to the source payment never reach the favorite.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Favorite {
    pub id: FavoriteId,
    pub account_id: AccountId,
    pub name: String,
    pub amount: Money,
    pub category: Category,
}

impl Favorite {
    pub fn from_payment(payment: &Payment, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id: payment.account_id,
            name: name.into(),
            amount: payment.amount,
            category: payment.category.clone(),
        }
    }
}

use std::collections::HashMap;

use crate::domain::{Account, AccountId, Favorite, FavoriteId, Payment, PaymentId, Phone};

/// In-memory store for accounts, payments and favorites.
///
/// Each collection keeps insertion order in a `Vec` and a `HashMap` from ID to
/// position, so lookups are O(1) while the payment log stays a contiguous
/// slice for the aggregator to partition.
#[derive(Debug, Default)]
pub struct Repository {
    accounts: Vec<Account>,
    account_index: HashMap<AccountId, usize>,
    phone_index: HashMap<Phone, AccountId>,
    /// Highest account ID handed out or imported so far
    last_account_id: AccountId,
    payments: Vec<Payment>,
    payment_index: HashMap<PaymentId, usize>,
    favorites: Vec<Favorite>,
    favorite_index: HashMap<FavoriteId, usize>,
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================
    // Account operations
    // ========================

    /// Reserve the next sequential account ID.
    pub fn allocate_account_id(&mut self) -> AccountId {
        self.last_account_id += 1;
        self.last_account_id
    }

    /// Find the account currently holding this phone.
    pub fn account_id_by_phone(&self, phone: &str) -> Option<AccountId> {
        self.phone_index.get(phone).copied()
    }

    /// Insert a new account, or replace the one with the same ID.
    /// The caller is responsible for phone uniqueness.
    pub fn save_account(&mut self, account: Account) {
        self.last_account_id = self.last_account_id.max(account.id);
        match self.account_index.get(&account.id) {
            Some(&pos) => {
                let previous = &self.accounts[pos];
                if previous.phone != account.phone {
                    self.phone_index.remove(&previous.phone);
                }
                self.phone_index.insert(account.phone.clone(), account.id);
                self.accounts[pos] = account;
            }
            None => {
                self.account_index.insert(account.id, self.accounts.len());
                self.phone_index.insert(account.phone.clone(), account.id);
                self.accounts.push(account);
            }
        }
    }

    pub fn get_account(&self, id: AccountId) -> Option<&Account> {
        self.account_index.get(&id).map(|&pos| &self.accounts[pos])
    }

    pub fn get_account_mut(&mut self, id: AccountId) -> Option<&mut Account> {
        self.account_index
            .get(&id)
            .map(|&pos| &mut self.accounts[pos])
    }

    pub fn list_accounts(&self) -> &[Account] {
        &self.accounts
    }

    // ========================
    // Payment operations
    // ========================

    /// Append a payment to the log, or replace the one with the same ID in place.
    pub fn save_payment(&mut self, payment: Payment) {
        match self.payment_index.get(&payment.id) {
            Some(&pos) => self.payments[pos] = payment,
            None => {
                self.payment_index.insert(payment.id, self.payments.len());
                self.payments.push(payment);
            }
        }
    }

    pub fn get_payment(&self, id: PaymentId) -> Option<&Payment> {
        self.payment_index.get(&id).map(|&pos| &self.payments[pos])
    }

    pub fn get_payment_mut(&mut self, id: PaymentId) -> Option<&mut Payment> {
        self.payment_index
            .get(&id)
            .map(|&pos| &mut self.payments[pos])
    }

    /// The payment log in creation order.
    pub fn list_payments(&self) -> &[Payment] {
        &self.payments
    }

    // ========================
    // Favorite operations
    // ========================

    pub fn save_favorite(&mut self, favorite: Favorite) {
        match self.favorite_index.get(&favorite.id) {
            Some(&pos) => self.favorites[pos] = favorite,
            None => {
                self.favorite_index.insert(favorite.id, self.favorites.len());
                self.favorites.push(favorite);
            }
        }
    }

    pub fn get_favorite(&self, id: FavoriteId) -> Option<&Favorite> {
        self.favorite_index.get(&id).map(|&pos| &self.favorites[pos])
    }

    pub fn list_favorites(&self) -> &[Favorite] {
        &self.favorites
    }
}

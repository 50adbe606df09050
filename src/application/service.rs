use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::domain::{
    is_positive, Account, AccountId, Category, Favorite, FavoriteId, Money, Payment, PaymentId,
    PaymentStatus, Phone,
};
use crate::storage::Repository;

use super::LedgerError;

/// Application service providing every ledger operation.
/// This is the primary interface for any client (CLI, tests, embedding code).
///
/// The service is a single-writer object: mutating calls take `&mut self` and
/// aggregation calls take `&self`, so the borrow checker rules out a payment
/// being created while an aggregation is scanning the log.
#[derive(Debug, Default)]
pub struct LedgerService {
    repo: Repository,
}

impl LedgerService {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    // ========================
    // Account operations
    // ========================

    /// Register a new account for the phone, starting with a zero balance.
    pub fn register_account(&mut self, phone: impl Into<Phone>) -> Result<Account, LedgerError> {
        let phone = phone.into();
        if self.repo.account_id_by_phone(&phone).is_some() {
            return Err(LedgerError::PhoneAlreadyRegistered(phone));
        }

        let account = Account::new(self.repo.allocate_account_id(), phone);
        self.repo.save_account(account.clone());
        debug!(account_id = account.id, phone = %account.phone, "registered account");
        Ok(account)
    }

    /// Add funds to an account.
    pub fn deposit(&mut self, account_id: AccountId, amount: Money) -> Result<(), LedgerError> {
        if !is_positive(amount) {
            return Err(LedgerError::AmountMustBePositive(amount));
        }
        let account = self
            .repo
            .get_account_mut(account_id)
            .ok_or(LedgerError::AccountNotFound(account_id))?;

        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow {
                account_id,
                balance: account.balance,
                amount,
            })?;
        debug!(account_id, amount, balance = account.balance, "deposit");
        Ok(())
    }

    /// Get an account by ID.
    pub fn find_account_by_id(&self, account_id: AccountId) -> Result<&Account, LedgerError> {
        self.repo
            .get_account(account_id)
            .ok_or(LedgerError::AccountNotFound(account_id))
    }

    /// All accounts in registration order.
    pub fn accounts(&self) -> &[Account] {
        self.repo.list_accounts()
    }

    // ========================
    // Payment operations
    // ========================

    /// Debit the account and record a new in-progress payment.
    pub fn pay(
        &mut self,
        account_id: AccountId,
        amount: Money,
        category: impl Into<Category>,
    ) -> Result<Payment, LedgerError> {
        if !is_positive(amount) {
            return Err(LedgerError::AmountMustBePositive(amount));
        }
        let account = self
            .repo
            .get_account_mut(account_id)
            .ok_or(LedgerError::AccountNotFound(account_id))?;
        if !account.can_afford(amount) {
            return Err(LedgerError::NotEnoughBalance {
                account_id,
                balance: account.balance,
                required: amount,
            });
        }

        account.balance -= amount;
        let payment = Payment::new(account_id, amount, category);
        self.repo.save_payment(payment.clone());
        debug!(
            payment_id = %payment.id,
            account_id,
            amount,
            category = %payment.category,
            "payment created"
        );
        Ok(payment)
    }

    /// Get a payment by ID.
    pub fn find_payment_by_id(&self, payment_id: PaymentId) -> Result<&Payment, LedgerError> {
        self.repo
            .get_payment(payment_id)
            .ok_or(LedgerError::PaymentNotFound(payment_id))
    }

    /// The payment log in creation order.
    pub fn payments(&self) -> &[Payment] {
        self.repo.list_payments()
    }

    /// Mark a payment as failed and refund its amount.
    ///
    /// Rejecting an already failed payment is a no-op, so the refund happens
    /// exactly once. A settled payment cannot be rejected. A refund that would
    /// overflow the balance fails and leaves both records unchanged.
    pub fn reject(&mut self, payment_id: PaymentId) -> Result<(), LedgerError> {
        let payment = self.find_payment_by_id(payment_id)?;
        let (account_id, amount, status) = (payment.account_id, payment.amount, payment.status);

        match status {
            PaymentStatus::Fail => {
                warn!(%payment_id, "payment already rejected, nothing to refund");
                return Ok(());
            }
            PaymentStatus::Ok => {
                return Err(LedgerError::PaymentFinalized {
                    id: payment_id,
                    status,
                });
            }
            PaymentStatus::InProgress => {}
        }

        let account = self
            .repo
            .get_account_mut(account_id)
            .ok_or(LedgerError::AccountNotFound(account_id))?;
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow {
                account_id,
                balance: account.balance,
                amount,
            })?;

        if let Some(payment) = self.repo.get_payment_mut(payment_id) {
            payment.status = PaymentStatus::Fail;
        }
        debug!(%payment_id, account_id, refunded = amount, "payment rejected");
        Ok(())
    }

    /// Mark an in-progress payment as successfully completed.
    pub fn settle(&mut self, payment_id: PaymentId) -> Result<(), LedgerError> {
        let payment = self
            .repo
            .get_payment_mut(payment_id)
            .ok_or(LedgerError::PaymentNotFound(payment_id))?;
        if payment.status.is_terminal() {
            return Err(LedgerError::PaymentFinalized {
                id: payment_id,
                status: payment.status,
            });
        }

        payment.status = PaymentStatus::Ok;
        debug!(%payment_id, "payment settled");
        Ok(())
    }

    /// Pay again with the same account, amount and category.
    /// The new payment has its own ID and lifecycle.
    pub fn repeat(&mut self, payment_id: PaymentId) -> Result<Payment, LedgerError> {
        let payment = self.find_payment_by_id(payment_id)?;
        let (account_id, amount, category) =
            (payment.account_id, payment.amount, payment.category.clone());
        self.pay(account_id, amount, category)
    }

    // ========================
    // Favorite operations
    // ========================

    /// Save a payment's shape as a named favorite.
    pub fn favorite_payment(
        &mut self,
        payment_id: PaymentId,
        name: impl Into<String>,
    ) -> Result<Favorite, LedgerError> {
        let payment = self.find_payment_by_id(payment_id)?;
        let favorite = Favorite::from_payment(payment, name);

        self.repo.save_favorite(favorite.clone());
        debug!(favorite_id = %favorite.id, %payment_id, name = %favorite.name, "favorite created");
        Ok(favorite)
    }

    /// Get a favorite by ID.
    pub fn find_favorite_by_id(&self, favorite_id: FavoriteId) -> Result<&Favorite, LedgerError> {
        self.repo
            .get_favorite(favorite_id)
            .ok_or(LedgerError::FavoriteNotFound(favorite_id))
    }

    /// All favorites in creation order.
    pub fn favorites(&self) -> &[Favorite] {
        self.repo.list_favorites()
    }

    /// Create a new payment from a favorite template.
    pub fn pay_from_favorite(&mut self, favorite_id: FavoriteId) -> Result<Payment, LedgerError> {
        let favorite = self.find_favorite_by_id(favorite_id)?;
        let (account_id, amount, category) =
            (favorite.account_id, favorite.amount, favorite.category.clone());
        self.pay(account_id, amount, category)
    }

    // ========================
    // Restore operations (used by the importers)
    // ========================

    /// Upsert accounts read from a dump.
    ///
    /// The whole batch is checked before anything is applied: an account whose
    /// phone would belong to a different account afterwards rejects the batch.
    pub(crate) fn restore_accounts(&mut self, accounts: Vec<Account>) -> Result<(), LedgerError> {
        let replaced: HashSet<AccountId> = accounts.iter().map(|a| a.id).collect();
        let mut owners: HashMap<&str, AccountId> = self
            .accounts()
            .iter()
            .filter(|a| !replaced.contains(&a.id))
            .map(|a| (a.phone.as_str(), a.id))
            .collect();

        for account in &accounts {
            if let Some(&owner) = owners.get(account.phone.as_str()) {
                if owner != account.id {
                    return Err(LedgerError::PhoneAlreadyRegistered(account.phone.clone()));
                }
            }
            owners.insert(account.phone.as_str(), account.id);
        }

        for account in accounts {
            self.repo.save_account(account);
        }
        Ok(())
    }

    /// Upsert payments read from a dump.
    pub(crate) fn restore_payments(&mut self, payments: Vec<Payment>) {
        for payment in payments {
            self.repo.save_payment(payment);
        }
    }

    /// Upsert favorites read from a dump.
    pub(crate) fn restore_favorites(&mut self, favorites: Vec<Favorite>) {
        for favorite in favorites {
            self.repo.save_favorite(favorite);
        }
    }
}

// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use wallet_ledger::{AccountId, LedgerService, Money};

pub const PHONE: &str = "+992938638676";

/// Payments of the reference scenario, in creation order.
pub const SCENARIO_PAYMENTS: [(Money, &str); 5] = [
    (50_000, "cat"),
    (100_000, "food"),
    (200_000, "cinema"),
    (250_000, "food"),
    (100_000, "food"),
];

pub const SCENARIO_DEPOSIT: Money = 12_000_000;

/// Helper to register an account and fund it
pub fn funded_account(service: &mut LedgerService, phone: &str, amount: Money) -> Result<AccountId> {
    let account = service.register_account(phone)?;
    service.deposit(account.id, amount)?;
    Ok(account.id)
}

/// Test fixture: one account, 12,000,000 deposited, five payments made
pub fn scenario_service() -> Result<(LedgerService, AccountId)> {
    let mut service = LedgerService::new();
    let id = funded_account(&mut service, PHONE, SCENARIO_DEPOSIT)?;
    for (amount, category) in SCENARIO_PAYMENTS {
        service.pay(id, amount, category)?;
    }
    Ok((service, id))
}

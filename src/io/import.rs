use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::application::{LedgerError, LedgerService};
use crate::domain::{is_positive, Account, AccountId, Favorite, Payment};

use super::codec::{
    read_optional_records, read_records, ACCOUNTS_FILE, DUMP_RECORD_SEPARATOR, FAVORITES_FILE,
    LEGACY_RECORD_SEPARATOR, PAYMENTS_FILE,
};
use super::export::{LedgerSnapshot, RecordCounts, SNAPSHOT_SCHEMA};

/// Importer for loading ledger state from disk.
///
/// Every import parses all of its input before touching the ledger, so a
/// malformed file leaves the ledger unchanged. Payments and favorites must
/// belong to an account that is already in the ledger or is part of the same
/// import. Records replace existing
/// records with the same ID and are appended otherwise.
pub struct Importer<'a> {
    service: &'a mut LedgerService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a mut LedgerService) -> Self {
        Self { service }
    }

    /// Import accounts from a legacy `ID;Phone;Balance|` file.
    pub fn import_from_file(&mut self, path: impl AsRef<Path>) -> Result<usize, LedgerError> {
        let path = path.as_ref();
        let accounts: Vec<Account> = read_records(path, LEGACY_RECORD_SEPARATOR)?;
        let count = accounts.len();

        self.service.restore_accounts(accounts)?;
        info!(path = %path.display(), accounts = count, "imported legacy file");
        Ok(count)
    }

    /// Import the dump files found in `dir`. Missing files are skipped.
    pub fn import(&mut self, dir: impl AsRef<Path>) -> Result<RecordCounts, LedgerError> {
        let dir = dir.as_ref();

        let accounts: Vec<Account> =
            read_optional_records(&dir.join(ACCOUNTS_FILE), DUMP_RECORD_SEPARATOR)?;
        let payments_path = dir.join(PAYMENTS_FILE);
        let payments: Vec<Payment> = read_optional_records(&payments_path, DUMP_RECORD_SEPARATOR)?;
        check_payment_amounts(&payments, &payments_path)?;
        let favorites_path = dir.join(FAVORITES_FILE);
        let favorites: Vec<Favorite> =
            read_optional_records(&favorites_path, DUMP_RECORD_SEPARATOR)?;
        check_favorite_amounts(&favorites, &favorites_path)?;

        let known = self.known_accounts(&accounts);
        check_payment_accounts(&payments, &known, &payments_path)?;
        check_favorite_accounts(&favorites, &known, &favorites_path)?;

        let counts = RecordCounts {
            accounts: accounts.len(),
            payments: payments.len(),
            favorites: favorites.len(),
        };
        self.service.restore_accounts(accounts)?;
        self.service.restore_payments(payments);
        self.service.restore_favorites(favorites);

        info!(
            dir = %dir.display(),
            accounts = counts.accounts,
            payments = counts.payments,
            favorites = counts.favorites,
            "imported dump directory"
        );
        Ok(counts)
    }

    /// Import a full JSON snapshot written by [`super::Exporter::export_snapshot`].
    pub fn import_snapshot<R: Read>(&mut self, reader: R) -> anyhow::Result<RecordCounts> {
        let snapshot: LedgerSnapshot =
            serde_json::from_reader(reader).context("Failed to parse ledger snapshot")?;
        if snapshot.schema != SNAPSHOT_SCHEMA {
            return Err(LedgerError::UnsupportedSnapshot(snapshot.schema).into());
        }

        let origin = Path::new("<snapshot>");
        check_payment_amounts(&snapshot.payments, origin)?;
        check_favorite_amounts(&snapshot.favorites, origin)?;
        let known = self.known_accounts(&snapshot.accounts);
        check_payment_accounts(&snapshot.payments, &known, origin)?;
        check_favorite_accounts(&snapshot.favorites, &known, origin)?;

        let counts = RecordCounts {
            accounts: snapshot.accounts.len(),
            payments: snapshot.payments.len(),
            favorites: snapshot.favorites.len(),
        };
        self.service.restore_accounts(snapshot.accounts)?;
        self.service.restore_payments(snapshot.payments);
        self.service.restore_favorites(snapshot.favorites);

        info!(
            version = %snapshot.version,
            accounts = counts.accounts,
            payments = counts.payments,
            favorites = counts.favorites,
            "imported snapshot"
        );
        Ok(counts)
    }

    /// IDs of the accounts in the ledger plus the ones about to be restored.
    fn known_accounts(&self, incoming: &[Account]) -> HashSet<AccountId> {
        self.service
            .accounts()
            .iter()
            .chain(incoming)
            .map(|a| a.id)
            .collect()
    }
}

fn check_payment_amounts(payments: &[Payment], path: &Path) -> Result<(), LedgerError> {
    match payments.iter().find(|p| !is_positive(p.amount)) {
        Some(p) => Err(LedgerError::import(
            path,
            format!("payment {} has non-positive amount {}", p.id, p.amount),
        )),
        None => Ok(()),
    }
}

fn check_favorite_amounts(favorites: &[Favorite], path: &Path) -> Result<(), LedgerError> {
    match favorites.iter().find(|f| !is_positive(f.amount)) {
        Some(f) => Err(LedgerError::import(
            path,
            format!("favorite {} has non-positive amount {}", f.id, f.amount),
        )),
        None => Ok(()),
    }
}

fn check_payment_accounts(
    payments: &[Payment],
    known: &HashSet<AccountId>,
    path: &Path,
) -> Result<(), LedgerError> {
    match payments.iter().find(|p| !known.contains(&p.account_id)) {
        Some(p) => Err(LedgerError::import(
            path,
            format!("payment {} references unknown account {}", p.id, p.account_id),
        )),
        None => Ok(()),
    }
}

fn check_favorite_accounts(
    favorites: &[Favorite],
    known: &HashSet<AccountId>,
    path: &Path,
) -> Result<(), LedgerError> {
    match favorites.iter().find(|f| !known.contains(&f.account_id)) {
        Some(f) => Err(LedgerError::import(
            path,
            format!("favorite {} references unknown account {}", f.id, f.account_id),
        )),
        None => Ok(()),
    }
}

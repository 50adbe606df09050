use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::application::{LedgerError, LedgerService};
use crate::domain::{Account, AccountId, Favorite, Payment};

use super::codec::{
    write_records, ACCOUNTS_FILE, DUMP_RECORD_SEPARATOR, FAVORITES_FILE,
    LEGACY_RECORD_SEPARATOR, PAYMENTS_FILE,
};

/// Schema tag written into every JSON snapshot.
pub const SNAPSHOT_SCHEMA: &str = "wallet-ledger/1";

/// Whole-ledger snapshot in a single versioned JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub schema: String,
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub accounts: Vec<Account>,
    pub payments: Vec<Payment>,
    pub favorites: Vec<Favorite>,
}

/// Number of records moved by an export or import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordCounts {
    pub accounts: usize,
    pub payments: usize,
    pub favorites: usize,
}

/// Exporter for writing ledger state to disk
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export accounts to a single file in the legacy `ID;Phone;Balance|` format.
    pub fn export_to_file(&self, path: impl AsRef<Path>) -> Result<usize, LedgerError> {
        let path = path.as_ref();
        let count = write_records(path, self.service.accounts(), LEGACY_RECORD_SEPARATOR)?;
        info!(path = %path.display(), accounts = count, "exported legacy file");
        Ok(count)
    }

    /// Export accounts, payments and favorites as dump files inside `dir`.
    /// A file is only written when its collection is not empty.
    pub fn export(&self, dir: impl AsRef<Path>) -> Result<RecordCounts, LedgerError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| LedgerError::file(dir, e))?;

        let mut counts = RecordCounts::default();
        let accounts = self.service.accounts();
        if !accounts.is_empty() {
            counts.accounts =
                write_records(&dir.join(ACCOUNTS_FILE), accounts, DUMP_RECORD_SEPARATOR)?;
        }
        let payments = self.service.payments();
        if !payments.is_empty() {
            counts.payments =
                write_records(&dir.join(PAYMENTS_FILE), payments, DUMP_RECORD_SEPARATOR)?;
        }
        let favorites = self.service.favorites();
        if !favorites.is_empty() {
            counts.favorites =
                write_records(&dir.join(FAVORITES_FILE), favorites, DUMP_RECORD_SEPARATOR)?;
        }

        info!(
            dir = %dir.display(),
            accounts = counts.accounts,
            payments = counts.payments,
            favorites = counts.favorites,
            "exported dump directory"
        );
        Ok(counts)
    }

    /// Export the full ledger as a JSON snapshot
    pub fn export_snapshot<W: Write>(&self, mut writer: W) -> anyhow::Result<LedgerSnapshot> {
        let snapshot = LedgerSnapshot {
            schema: SNAPSHOT_SCHEMA.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            accounts: self.service.accounts().to_vec(),
            payments: self.service.payments().to_vec(),
            favorites: self.service.favorites().to_vec(),
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }

    /// All payments of one account, in creation order.
    pub fn export_account_history(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Payment>, LedgerError> {
        self.service.find_account_by_id(account_id)?;
        Ok(self
            .service
            .payments()
            .iter()
            .filter(|p| p.account_id == account_id)
            .cloned()
            .collect())
    }
}

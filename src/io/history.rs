use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::application::LedgerError;
use crate::domain::Payment;

use super::codec::{write_records, DUMP_RECORD_SEPARATOR};

const HISTORY_STEM: &str = "payments";
const HISTORY_EXTENSION: &str = "dump";

/// Write an account history to `dir`, `page_size` payments per file.
///
/// Fits in one page: `payments.dump`. Otherwise `payments1.dump`,
/// `payments2.dump`, ... where only the last page may be short.
/// A page size of zero disables paging. Returns the files written.
pub fn history_to_files(
    payments: &[Payment],
    dir: impl AsRef<Path>,
    page_size: usize,
) -> Result<Vec<PathBuf>, LedgerError> {
    let dir = dir.as_ref();
    if payments.is_empty() {
        return Ok(Vec::new());
    }
    fs::create_dir_all(dir).map_err(|e| LedgerError::file(dir, e))?;

    let mut written = Vec::new();
    if page_size == 0 || payments.len() <= page_size {
        let path = dir.join(format!("{HISTORY_STEM}.{HISTORY_EXTENSION}"));
        write_records(&path, payments, DUMP_RECORD_SEPARATOR)?;
        written.push(path);
    } else {
        for (page, chunk) in payments.chunks(page_size).enumerate() {
            let path = dir.join(format!("{HISTORY_STEM}{}.{HISTORY_EXTENSION}", page + 1));
            write_records(&path, chunk, DUMP_RECORD_SEPARATOR)?;
            written.push(path);
        }
    }

    info!(
        dir = %dir.display(),
        payments = payments.len(),
        files = written.len(),
        "wrote payment history"
    );
    Ok(written)
}

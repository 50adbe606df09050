//! Delimited record codec shared by every flat-file format.
//!
//! Fields are separated by `;`, records by a per-format terminator (`\n` for
//! dump files, `|` for the legacy export). Nothing is quoted or escaped: a
//! field containing a delimiter corrupts the file it is written to.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::application::LedgerError;

pub const FIELD_SEPARATOR: u8 = b';';
pub const DUMP_RECORD_SEPARATOR: u8 = b'\n';
pub const LEGACY_RECORD_SEPARATOR: u8 = b'|';

pub const ACCOUNTS_FILE: &str = "accounts.dump";
pub const PAYMENTS_FILE: &str = "payments.dump";
pub const FAVORITES_FILE: &str = "favorites.dump";

fn writer_builder(record_separator: u8) -> WriterBuilder {
    let mut builder = WriterBuilder::new();
    builder
        .delimiter(FIELD_SEPARATOR)
        .terminator(Terminator::Any(record_separator))
        .quote_style(QuoteStyle::Never)
        .has_headers(false);
    builder
}

fn reader_builder(record_separator: u8) -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder
        .delimiter(FIELD_SEPARATOR)
        .terminator(Terminator::Any(record_separator))
        .quoting(false)
        .has_headers(false);
    builder
}

/// Write records to a new file at `path`, replacing any previous content.
/// Returns the number of records written.
pub fn write_records<T: Serialize>(
    path: &Path,
    records: &[T],
    record_separator: u8,
) -> Result<usize, LedgerError> {
    let file = File::create(path).map_err(|e| LedgerError::file(path, e))?;
    let mut writer = writer_builder(record_separator).from_writer(file);

    for record in records {
        writer
            .serialize(record)
            .map_err(|e| LedgerError::file(path, e))?;
    }
    writer.flush().map_err(|e| LedgerError::file(path, e))?;
    Ok(records.len())
}

/// Parse every record from `reader`. `path` only labels errors.
pub fn parse_records<T, R>(
    reader: R,
    path: &Path,
    record_separator: u8,
) -> Result<Vec<T>, LedgerError>
where
    T: DeserializeOwned,
    R: Read,
{
    reader_builder(record_separator)
        .from_reader(reader)
        .into_deserialize()
        .collect::<csv::Result<Vec<T>>>()
        .map_err(|e| LedgerError::import(path, e))
}

/// Read every record of the file at `path`.
pub fn read_records<T: DeserializeOwned>(
    path: &Path,
    record_separator: u8,
) -> Result<Vec<T>, LedgerError> {
    let file = File::open(path).map_err(|e| LedgerError::file(path, e))?;
    parse_records(file, path, record_separator)
}

/// Like [`read_records`], but a missing file reads as empty.
pub fn read_optional_records<T: DeserializeOwned>(
    path: &Path,
    record_separator: u8,
) -> Result<Vec<T>, LedgerError> {
    match File::open(path) {
        Ok(file) => parse_records(file, path, record_separator),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "dump file missing, nothing to import");
            Ok(Vec::new())
        }
        Err(e) => Err(LedgerError::file(path, e)),
    }
}

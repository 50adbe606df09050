mod common;

use std::collections::HashSet;
use std::fs;

use anyhow::Result;
use common::{funded_account, scenario_service, PHONE};
use tempfile::TempDir;
use wallet_ledger::io::{history_to_files, Exporter, Importer, RecordCounts};
use wallet_ledger::{Account, Favorite, LedgerError, LedgerService, Payment};

fn account_set(service: &LedgerService) -> HashSet<Account> {
    service.accounts().iter().cloned().collect()
}

fn payment_set(service: &LedgerService) -> HashSet<Payment> {
    service.payments().iter().cloned().collect()
}

fn favorite_set(service: &LedgerService) -> HashSet<Favorite> {
    service.favorites().iter().cloned().collect()
}

/// Scenario ledger plus a second account, a rejected payment and a favorite
fn populated_service() -> Result<LedgerService> {
    let (mut service, id) = scenario_service()?;
    let other = funded_account(&mut service, "+992938638677", 100_00)?;
    let payment = service.pay(other, 10_00, "auto")?;
    service.favorite_payment(payment.id, "school")?;
    let first = service.payments()[0].id;
    service.reject(first)?;
    service.settle(service.payments()[1].id)?;
    service.favorite_payment(service.payments()[2].id, "movies")?;
    assert_eq!(service.find_account_by_id(id)?.balance, 11_350_000);
    Ok(service)
}

#[test]
fn test_directory_round_trip() -> Result<()> {
    let temp = TempDir::new()?;
    let original = populated_service()?;

    let exported = Exporter::new(&original).export(temp.path())?;
    assert_eq!(
        exported,
        RecordCounts {
            accounts: 2,
            payments: 6,
            favorites: 2
        }
    );

    let mut restored = LedgerService::new();
    let imported = Importer::new(&mut restored).import(temp.path())?;
    assert_eq!(imported, exported);

    assert_eq!(account_set(&restored), account_set(&original));
    assert_eq!(payment_set(&restored), payment_set(&original));
    assert_eq!(favorite_set(&restored), favorite_set(&original));

    // Registration continues after the highest imported ID
    assert_eq!(restored.register_account("+992938638679")?.id, 3);

    Ok(())
}

#[test]
fn test_dump_file_layout() -> Result<()> {
    let temp = TempDir::new()?;
    let mut service = LedgerService::new();
    let id = funded_account(&mut service, PHONE, 1_000)?;
    let payment = service.pay(id, 250, "food")?;
    let favorite = service.favorite_payment(payment.id, "lunch")?;

    Exporter::new(&service).export(temp.path())?;

    assert_eq!(
        fs::read_to_string(temp.path().join("accounts.dump"))?,
        format!("1;{};750\n", PHONE)
    );
    assert_eq!(
        fs::read_to_string(temp.path().join("payments.dump"))?,
        format!("{};1;250;food;INPROGRESS\n", payment.id)
    );
    assert_eq!(
        fs::read_to_string(temp.path().join("favorites.dump"))?,
        format!("{};1;lunch;250;food\n", favorite.id)
    );

    Ok(())
}

#[test]
fn test_export_skips_empty_collections() -> Result<()> {
    let temp = TempDir::new()?;
    let mut service = LedgerService::new();
    service.register_account(PHONE)?;

    let counts = Exporter::new(&service).export(temp.path())?;

    assert_eq!(counts.accounts, 1);
    assert!(temp.path().join("accounts.dump").exists());
    assert!(!temp.path().join("payments.dump").exists());
    assert!(!temp.path().join("favorites.dump").exists());

    Ok(())
}

#[test]
fn test_import_tolerates_missing_files() -> Result<()> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join("accounts.dump"), "1;+992000000001;100\n")?;

    let mut service = LedgerService::new();
    let counts = Importer::new(&mut service).import(temp.path())?;

    assert_eq!(counts.accounts, 1);
    assert_eq!(counts.payments, 0);
    assert_eq!(service.find_account_by_id(1)?.balance, 100);

    // A directory with no dumps at all is an empty ledger
    let empty = TempDir::new()?;
    let mut service = LedgerService::new();
    assert_eq!(
        Importer::new(&mut service).import(empty.path())?,
        RecordCounts::default()
    );

    Ok(())
}

#[test]
fn test_import_malformed_file_changes_nothing() -> Result<()> {
    let temp = TempDir::new()?;
    fs::write(
        temp.path().join("accounts.dump"),
        "1;+992000000001;100\n2;+992000000002;abc\n",
    )?;

    let mut service = LedgerService::new();
    let err = Importer::new(&mut service).import(temp.path()).unwrap_err();

    assert!(matches!(err, LedgerError::ImportFailed { .. }));
    assert!(std::error::Error::source(&err).is_some());
    assert!(service.accounts().is_empty());

    Ok(())
}

#[test]
fn test_import_rejects_non_positive_payment() -> Result<()> {
    let temp = TempDir::new()?;
    fs::write(
        temp.path().join("payments.dump"),
        "6f2c1c9e-6a57-4c39-9d8b-2a1a5f3f3b11;1;0;food;INPROGRESS\n",
    )?;

    let mut service = LedgerService::new();
    let err = Importer::new(&mut service).import(temp.path()).unwrap_err();
    assert!(matches!(err, LedgerError::ImportFailed { .. }));
    assert!(service.payments().is_empty());

    Ok(())
}

#[test]
fn test_import_rejects_payment_of_unknown_account() -> Result<()> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join("accounts.dump"), "1;+992000000001;100\n")?;
    fs::write(
        temp.path().join("payments.dump"),
        "6f2c1c9e-6a57-4c39-9d8b-2a1a5f3f3b11;1;10;food;INPROGRESS\n\
         0b7e4a1d-2f44-4d0a-8c55-9e3f1d2c7a10;2;20;food;INPROGRESS\n",
    )?;

    let mut service = LedgerService::new();
    let err = Importer::new(&mut service).import(temp.path()).unwrap_err();

    assert!(matches!(
        &err,
        LedgerError::ImportFailed { path, .. } if path.ends_with("payments.dump")
    ));
    assert!(service.accounts().is_empty());
    assert!(service.payments().is_empty());

    Ok(())
}

#[test]
fn test_import_rejects_favorite_of_unknown_account() -> Result<()> {
    let temp = TempDir::new()?;
    fs::write(
        temp.path().join("favorites.dump"),
        "6f2c1c9e-6a57-4c39-9d8b-2a1a5f3f3b11;3;lunch;250;food\n",
    )?;

    let mut service = LedgerService::new();
    funded_account(&mut service, PHONE, 100)?;
    let err = Importer::new(&mut service).import(temp.path()).unwrap_err();

    assert!(matches!(err, LedgerError::ImportFailed { .. }));
    assert!(service.favorites().is_empty());

    // Records of an account already in the ledger are accepted
    fs::write(
        temp.path().join("favorites.dump"),
        "6f2c1c9e-6a57-4c39-9d8b-2a1a5f3f3b11;1;lunch;250;food\n",
    )?;
    let counts = Importer::new(&mut service).import(temp.path())?;
    assert_eq!(counts.favorites, 1);
    assert_eq!(service.favorites()[0].account_id, 1);

    Ok(())
}

#[test]
fn test_import_upserts_by_id() -> Result<()> {
    let temp = TempDir::new()?;
    let mut service = LedgerService::new();
    funded_account(&mut service, PHONE, 100)?;
    Exporter::new(&service).export(temp.path())?;

    service.deposit(1, 900)?;
    Importer::new(&mut service).import(temp.path())?;

    assert_eq!(service.accounts().len(), 1);
    assert_eq!(service.find_account_by_id(1)?.balance, 100);

    Ok(())
}

#[test]
fn test_import_phone_conflict() -> Result<()> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join("accounts.dump"), format!("7;{};100\n", PHONE))?;

    let mut service = LedgerService::new();
    service.register_account(PHONE)?;

    let err = Importer::new(&mut service).import(temp.path()).unwrap_err();
    assert!(matches!(err, LedgerError::PhoneAlreadyRegistered(_)));
    assert_eq!(service.accounts().len(), 1);

    Ok(())
}

#[test]
fn test_legacy_file_round_trip() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("export.txt");
    let mut service = LedgerService::new();
    funded_account(&mut service, "+992000000001", 100)?;
    funded_account(&mut service, "+992000000002", 250)?;

    let count = Exporter::new(&service).export_to_file(&path)?;
    assert_eq!(count, 2);
    assert_eq!(
        fs::read_to_string(&path)?,
        "1;+992000000001;100|2;+992000000002;250|"
    );

    let mut restored = LedgerService::new();
    let imported = Importer::new(&mut restored).import_from_file(&path)?;
    assert_eq!(imported, 2);
    assert_eq!(account_set(&restored), account_set(&service));

    Ok(())
}

#[test]
fn test_legacy_import_errors() -> Result<()> {
    let temp = TempDir::new()?;
    let mut service = LedgerService::new();

    let missing = temp.path().join("missing.txt");
    let err = Importer::new(&mut service)
        .import_from_file(&missing)
        .unwrap_err();
    assert!(matches!(err, LedgerError::FileNotFound { .. }));

    let malformed = temp.path().join("malformed.txt");
    fs::write(&malformed, "x;+992000000001;100|")?;
    let err = Importer::new(&mut service)
        .import_from_file(&malformed)
        .unwrap_err();
    assert!(matches!(err, LedgerError::ImportFailed { .. }));
    assert!(service.accounts().is_empty());

    Ok(())
}

#[test]
fn test_export_to_unwritable_path() -> Result<()> {
    let temp = TempDir::new()?;
    let service = populated_service()?;
    let path = temp.path().join("no-such-dir").join("export.txt");

    let err = Exporter::new(&service).export_to_file(&path).unwrap_err();
    assert!(matches!(err, LedgerError::FileNotFound { .. }));

    Ok(())
}

#[test]
fn test_history_pages() -> Result<()> {
    let temp = TempDir::new()?;
    let (mut service, id) = scenario_service()?;
    let other = funded_account(&mut service, "+992938638677", 100)?;
    service.pay(other, 10, "other")?;

    let history = Exporter::new(&service).export_account_history(id)?;
    assert_eq!(history.len(), 5);

    let files = history_to_files(&history, temp.path(), 2)?;
    assert_eq!(files.len(), 3);
    let sizes: Vec<usize> = files
        .iter()
        .map(|f| fs::read_to_string(f).map(|s| s.lines().count()))
        .collect::<Result<_, _>>()?;
    assert_eq!(sizes, vec![2, 2, 1]);

    let first_page = fs::read_to_string(&files[0])?;
    assert!(first_page.starts_with(&format!("{};{};50000;cat;INPROGRESS\n", history[0].id, id)));

    Ok(())
}

#[test]
fn test_history_unknown_account() -> Result<()> {
    let (service, _) = scenario_service()?;

    let err = Exporter::new(&service)
        .export_account_history(42)
        .unwrap_err();
    assert!(matches!(err, LedgerError::AccountNotFound(42)));

    Ok(())
}

#[test]
fn test_snapshot_round_trip() -> Result<()> {
    let original = populated_service()?;
    let mut buffer = Vec::new();

    let snapshot = Exporter::new(&original).export_snapshot(&mut buffer)?;
    assert_eq!(snapshot.schema, "wallet-ledger/1");

    let mut restored = LedgerService::new();
    let counts = Importer::new(&mut restored).import_snapshot(buffer.as_slice())?;
    assert_eq!(counts.payments, 6);

    assert_eq!(account_set(&restored), account_set(&original));
    assert_eq!(payment_set(&restored), payment_set(&original));
    assert_eq!(favorite_set(&restored), favorite_set(&original));

    Ok(())
}

#[test]
fn test_snapshot_unknown_schema() -> Result<()> {
    let service = populated_service()?;
    let mut buffer = Vec::new();
    Exporter::new(&service).export_snapshot(&mut buffer)?;
    let tampered = String::from_utf8(buffer)?.replace("wallet-ledger/1", "wallet-ledger/9");

    let mut restored = LedgerService::new();
    let err = Importer::new(&mut restored)
        .import_snapshot(tampered.as_bytes())
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::UnsupportedSnapshot(schema)) if schema == "wallet-ledger/9"
    ));
    assert!(restored.accounts().is_empty());

    Ok(())
}

#[test]
fn test_snapshot_with_unknown_account_changes_nothing() -> Result<()> {
    let service = populated_service()?;
    let mut buffer = Vec::new();
    Exporter::new(&service).export_snapshot(&mut buffer)?;

    // Drop the second account but keep its payment and favorite
    let mut snapshot: serde_json::Value = serde_json::from_slice(&buffer)?;
    let accounts = snapshot["accounts"]
        .as_array_mut()
        .ok_or_else(|| anyhow::anyhow!("accounts is not an array"))?;
    accounts.retain(|a| a["id"] != 2);
    let tampered = serde_json::to_vec(&snapshot)?;

    let mut restored = LedgerService::new();
    let err = Importer::new(&mut restored)
        .import_snapshot(tampered.as_slice())
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::ImportFailed { .. })
    ));
    assert!(restored.accounts().is_empty());
    assert!(restored.payments().is_empty());
    assert!(restored.favorites().is_empty());

    Ok(())
}

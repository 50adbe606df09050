use std::collections::HashMap;
use std::fs::File;
use std::io::{stdout, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::application::LedgerService;
use crate::domain::{AccountId, Money, Payment, PaymentId};
use crate::io::{history_to_files, Exporter, Importer};

/// Wallet Ledger - phone accounts, payments and favorites
#[derive(Parser)]
#[command(name = "wallet-ledger")]
#[command(about = "An in-process wallet ledger persisted as flat dump files")]
#[command(version)]
pub struct Cli {
    /// Directory holding accounts.dump, payments.dump and favorites.dump
    #[arg(short, long, env = "WALLET_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a new account for a phone number
    Register {
        /// Phone number (must be unique)
        phone: String,
    },

    /// Add funds to an account
    Deposit {
        /// Account ID
        account: AccountId,

        /// Amount in the smallest currency unit
        #[arg(allow_negative_numbers = true)]
        amount: Money,
    },

    /// Pay from an account
    Pay {
        /// Account ID
        account: AccountId,

        /// Amount in the smallest currency unit
        #[arg(allow_negative_numbers = true)]
        amount: Money,

        /// Payment category (e.g., "food", "cinema")
        category: String,
    },

    /// Reject a payment and refund its amount
    Reject {
        /// Payment ID
        id: String,
    },

    /// Mark a payment as successfully completed
    Settle {
        /// Payment ID
        id: String,
    },

    /// Pay again with the same account, amount and category
    Repeat {
        /// Payment ID
        id: String,
    },

    /// Save a payment as a named favorite
    Favorite {
        /// Payment ID
        payment: String,

        /// Favorite name
        name: String,
    },

    /// Pay using a favorite
    #[command(name = "pay-favorite")]
    PayFavorite {
        /// Favorite ID
        id: String,
    },

    /// Show balance for an account or all accounts
    Balance {
        /// Account ID (omit for all accounts)
        account: Option<AccountId>,
    },

    /// List payments
    Payments {
        /// Filter by account ID
        #[arg(long)]
        account: Option<AccountId>,
    },

    /// Sum all payments in parallel
    Sum {
        /// Number of parallel workers
        #[arg(short, long, default_value = "1")]
        workers: usize,

        /// Report per-part sums of this many payments each
        #[arg(long)]
        part_size: Option<usize>,
    },

    /// Find all payments of an account in parallel
    Filter {
        /// Account ID
        account: AccountId,

        /// Number of parallel workers
        #[arg(short, long, default_value = "1")]
        workers: usize,
    },

    /// Write an account's payment history to paged dump files
    History {
        /// Account ID
        account: AccountId,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Payments per file
        #[arg(long, default_value = "10")]
        page_size: usize,
    },

    /// Export accounts to a single legacy file
    #[command(name = "export-legacy")]
    ExportLegacy {
        /// Output file
        path: PathBuf,
    },

    /// Import accounts from a single legacy file
    #[command(name = "import-legacy")]
    ImportLegacy {
        /// Input file
        path: PathBuf,
    },

    /// Write the full ledger as a JSON snapshot
    Snapshot {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the built-in scenario on a fresh in-memory ledger
    Demo,
}

impl Cli {
    /// Install the stderr log subscriber. `RUST_LOG` overrides `--verbose`.
    pub fn init_tracing(&self) {
        let default_level = if self.verbose { "debug" } else { "warn" };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    pub fn run(self) -> Result<()> {
        if matches!(self.command, Commands::Demo) {
            return run_demo();
        }

        let mut service = load(&self.data_dir)?;
        if run_command(&mut service, self.command)? {
            save(&service, &self.data_dir)?;
        }
        Ok(())
    }
}

fn load(data_dir: &Path) -> Result<LedgerService> {
    let mut service = LedgerService::new();
    Importer::new(&mut service)
        .import(data_dir)
        .with_context(|| format!("Failed to load ledger from {}", data_dir.display()))?;
    Ok(service)
}

fn save(service: &LedgerService, data_dir: &Path) -> Result<()> {
    Exporter::new(service)
        .export(data_dir)
        .with_context(|| format!("Failed to save ledger to {}", data_dir.display()))?;
    Ok(())
}

fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).with_context(|| format!("Invalid ID '{}'", id))
}

/// Run one command against the loaded ledger.
/// Returns true if the ledger changed and must be saved.
fn run_command(service: &mut LedgerService, command: Commands) -> Result<bool> {
    match command {
        Commands::Register { phone } => {
            let account = service.register_account(phone)?;
            println!("Registered account {} ({})", account.id, account.phone);
        }

        Commands::Deposit { account, amount } => {
            service.deposit(account, amount)?;
            let balance = service.find_account_by_id(account)?.balance;
            println!("Deposited {} to account {}, balance {}", amount, account, balance);
        }

        Commands::Pay {
            account,
            amount,
            category,
        } => {
            let payment = service.pay(account, amount, category)?;
            print_payment_recorded("Paid", &payment);
        }

        Commands::Reject { id } => {
            let id = parse_id(&id)?;
            service.reject(id)?;
            let payment = service.find_payment_by_id(id)?;
            println!(
                "Rejected payment {}: {} refunded to account {}",
                payment.id, payment.amount, payment.account_id
            );
        }

        Commands::Settle { id } => {
            let id = parse_id(&id)?;
            service.settle(id)?;
            println!("Settled payment {}", id);
        }

        Commands::Repeat { id } => {
            let payment = service.repeat(parse_id(&id)?)?;
            print_payment_recorded("Repeated", &payment);
        }

        Commands::Favorite { payment, name } => {
            let favorite = service.favorite_payment(parse_id(&payment)?, name)?;
            println!(
                "Saved favorite '{}' ({}): {} {}",
                favorite.name, favorite.id, favorite.amount, favorite.category
            );
        }

        Commands::PayFavorite { id } => {
            let payment = service.pay_from_favorite(parse_id(&id)?)?;
            print_payment_recorded("Paid from favorite", &payment);
        }

        Commands::Balance { account } => {
            run_balance_command(service, account)?;
            return Ok(false);
        }

        Commands::Payments { account } => {
            let payments: Vec<&Payment> = service
                .payments()
                .iter()
                .filter(|p| account.is_none_or(|id| p.account_id == id))
                .collect();
            print_payments(payments);
            return Ok(false);
        }

        Commands::Sum { workers, part_size } => {
            match part_size {
                Some(part_size) => {
                    for progress in service.sum_payments_with_progress(part_size)? {
                        println!("Part {}: {}", progress.part, progress.result);
                    }
                }
                None => println!("Total: {}", service.sum_payments(workers)?),
            }
            return Ok(false);
        }

        Commands::Filter { account, workers } => {
            let mut payments = service.filter_payments(account, workers)?;
            // Workers merge in any order; print in log order.
            let order: HashMap<PaymentId, usize> = service
                .payments()
                .iter()
                .enumerate()
                .map(|(i, p)| (p.id, i))
                .collect();
            payments.sort_by_key(|p| order.get(&p.id).copied());
            print_payments(payments.iter());
            return Ok(false);
        }

        Commands::History {
            account,
            output,
            page_size,
        } => {
            let payments = Exporter::new(service).export_account_history(account)?;
            let files = history_to_files(&payments, &output, page_size)?;
            println!(
                "Wrote {} payments of account {} to {} file(s)",
                payments.len(),
                account,
                files.len()
            );
            for file in files {
                println!("  {}", file.display());
            }
            return Ok(false);
        }

        Commands::ExportLegacy { path } => {
            let count = Exporter::new(service).export_to_file(&path)?;
            println!("Exported {} accounts to {}", count, path.display());
            return Ok(false);
        }

        Commands::ImportLegacy { path } => {
            let count = Importer::new(service).import_from_file(&path)?;
            println!("Imported {} accounts from {}", count, path.display());
        }

        Commands::Snapshot { output } => {
            let writer: Box<dyn Write> = match &output {
                Some(path) => {
                    let file = File::create(path).with_context(|| {
                        format!("Failed to create output file: {}", path.display())
                    })?;
                    Box::new(file)
                }
                None => Box::new(stdout()),
            };
            let snapshot = Exporter::new(service).export_snapshot(writer)?;
            if output.is_some() {
                eprintln!(
                    "Exported snapshot: {} accounts, {} payments, {} favorites",
                    snapshot.accounts.len(),
                    snapshot.payments.len(),
                    snapshot.favorites.len()
                );
            }
            return Ok(false);
        }

        Commands::Demo => return Ok(false),
    }
    Ok(true)
}

fn print_payment_recorded(action: &str, payment: &Payment) {
    println!(
        "{}: {} {} from account {} ({})",
        action, payment.amount, payment.category, payment.account_id, payment.id
    );
}

fn print_payments<'p>(payments: impl IntoIterator<Item = &'p Payment>) {
    let mut payments = payments.into_iter().peekable();
    if payments.peek().is_none() {
        println!("No payments found.");
        return;
    }

    println!(
        "{:<36} {:>8} {:>12} {:<16} {:<10}",
        "ID", "ACCOUNT", "AMOUNT", "CATEGORY", "STATUS"
    );
    println!("{}", "-".repeat(86));
    for payment in payments {
        println!(
            "{:<36} {:>8} {:>12} {:<16} {:<10}",
            payment.id,
            payment.account_id,
            payment.amount,
            truncate(&payment.category, 16),
            payment.status
        );
    }
}

fn run_balance_command(service: &LedgerService, account: Option<AccountId>) -> Result<()> {
    match account {
        Some(id) => {
            let account = service.find_account_by_id(id)?;
            println!("{} ({}): {}", account.id, account.phone, account.balance);
        }
        None => {
            let accounts = service.accounts();
            if accounts.is_empty() {
                println!("No accounts found.");
            } else {
                println!("{:<8} {:<16} {:>14}", "ID", "PHONE", "BALANCE");
                println!("{}", "-".repeat(40));
                for account in accounts {
                    println!(
                        "{:<8} {:<16} {:>14}",
                        account.id, account.phone, account.balance
                    );
                }
            }
        }
    }
    Ok(())
}

/// One account, one deposit and five payments on a throwaway ledger.
fn run_demo() -> Result<()> {
    let mut service = LedgerService::new();
    let account = service.register_account("+992938638676")?;
    service.deposit(account.id, 12_000_000)?;
    for (amount, category) in [
        (50_000, "cat"),
        (100_000, "food"),
        (200_000, "cinema"),
        (250_000, "food"),
        (100_000, "food"),
    ] {
        service.pay(account.id, amount, category)?;
    }

    let balance = service.find_account_by_id(account.id)?.balance;
    println!("Account {} ({}): balance {}", account.id, account.phone, balance);
    for workers in 1..=service.payments().len() {
        println!(
            "Sum with {} worker(s): {}",
            workers,
            service.sum_payments(workers)?
        );
    }
    let found = service.filter_payments(account.id, 2)?;
    println!("Payments of account {}: {}", account.id, found.len());
    for progress in service.sum_payments_with_progress(2)? {
        println!("Part {}: {}", progress.part, progress.result);
    }
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

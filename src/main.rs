use anyhow::Result;
use clap::Parser;
use wallet_ledger::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.init_tracing();
    cli.run()
}

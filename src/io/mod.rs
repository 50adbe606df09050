// Flat-file and snapshot persistence for the ledger.

pub mod codec;
mod export;
mod history;
mod import;

pub use export::*;
pub use history::*;
pub use import::*;

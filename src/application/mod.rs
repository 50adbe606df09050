// Application layer - ledger operations and parallel aggregation.
// Persistence lives in `crate::io`, the in-memory store in `crate::storage`.

pub mod aggregate;
pub mod error;
mod service;

pub use error::*;
pub use service::*;

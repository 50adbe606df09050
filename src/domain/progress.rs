use serde::{Deserialize, Serialize};

use super::Money;

/// Partial sum reported by one worker of a progress-reporting aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub part: usize,
    pub result: Money,
}

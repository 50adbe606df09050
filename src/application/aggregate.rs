//! Fan-out/fan-in aggregation over the payment log.
//!
//! The log is split into contiguous, disjoint slices and each slice is scanned
//! by its own scoped thread. Workers only read their slice; the shared
//! accumulator is locked just long enough to merge a finished partial result.
//! Every call joins all of its workers before returning.

use std::thread;

use parking_lot::Mutex;
use tracing::debug;

use crate::domain::{checked_total, AccountId, Money, Payment, Progress};

use super::{LedgerError, LedgerService};

/// Split `len` items into `workers` contiguous ranges.
///
/// Every worker but the last takes `len / workers` items; the last one takes
/// everything that is left, including the division remainder. A worker count
/// of zero is treated as one.
pub fn partition(len: usize, workers: usize) -> Vec<std::ops::Range<usize>> {
    let workers = workers.max(1);
    let chunk_size = len / workers;

    (0..workers)
        .map(|i| {
            let start = i * chunk_size;
            let end = if i == workers - 1 {
                len
            } else {
                (i + 1) * chunk_size
            };
            start..end
        })
        .collect()
}

/// Sum all payment amounts using `workers` parallel workers.
///
/// Fails with `SumOverflow` when the total does not fit in [`Money`], no matter
/// which slice or merge step overflows first.
pub fn sum_payments(payments: &[Payment], workers: usize) -> Result<Money, LedgerError> {
    // `None` once any partial or merged total has overflowed.
    let sum: Mutex<Option<Money>> = Mutex::new(Some(0));

    thread::scope(|scope| {
        for range in partition(payments.len(), workers) {
            let chunk = &payments[range];
            let sum = &sum;
            scope.spawn(move || {
                let local = checked_total(chunk.iter().map(|p| p.amount));
                let mut sum = sum.lock();
                *sum = sum.zip(local).and_then(|(sum, local)| sum.checked_add(local));
            });
        }
    });

    sum.into_inner().ok_or(LedgerError::SumOverflow)
}

/// Collect copies of every payment made by `account_id`, scanning in parallel.
/// Result order depends on which worker merges first.
pub fn filter_payments(
    payments: &[Payment],
    account_id: AccountId,
    workers: usize,
) -> Result<Vec<Payment>, LedgerError> {
    let found = Mutex::new(Vec::new());

    thread::scope(|scope| {
        for range in partition(payments.len(), workers) {
            let chunk = &payments[range];
            let found = &found;
            scope.spawn(move || {
                let local: Vec<Payment> = chunk
                    .iter()
                    .filter(|p| p.account_id == account_id)
                    .cloned()
                    .collect();
                if !local.is_empty() {
                    found.lock().extend(local);
                }
            });
        }
    });

    let found = found.into_inner();
    // No payments is reported the same way as an unknown account.
    if found.is_empty() {
        return Err(LedgerError::AccountNotFound(account_id));
    }
    Ok(found)
}

/// Sum the log in consecutive parts of `part_size` payments, one worker per part.
///
/// Workers report through a channel instead of a shared lock. The returned
/// progress entries are ordered by part number. A part whose sum does not fit
/// in [`Money`] fails the whole call with `SumOverflow`.
pub fn sum_payments_with_progress(
    payments: &[Payment],
    part_size: usize,
) -> Result<Vec<Progress>, LedgerError> {
    if payments.is_empty() {
        return Ok(Vec::new());
    }
    let part_size = if part_size == 0 {
        payments.len()
    } else {
        part_size
    };

    let (tx, rx) = crossbeam_channel::unbounded();
    thread::scope(|scope| {
        for (part, chunk) in payments.chunks(part_size).enumerate() {
            let tx = tx.clone();
            scope.spawn(move || {
                let result = checked_total(chunk.iter().map(|p| p.amount));
                // The receiver outlives the scope, so sending cannot fail.
                let _ = tx.send((part, result));
            });
        }
    });
    drop(tx);

    let mut progress = rx
        .iter()
        .map(|(part, result)| {
            result
                .map(|result| Progress { part, result })
                .ok_or(LedgerError::SumOverflow)
        })
        .collect::<Result<Vec<_>, _>>()?;
    progress.sort_by_key(|p| p.part);
    Ok(progress)
}

impl LedgerService {
    /// Sum of all payment amounts, computed with `workers` parallel workers.
    pub fn sum_payments(&self, workers: usize) -> Result<Money, LedgerError> {
        let sum = sum_payments(self.payments(), workers)?;
        debug!(workers, payments = self.payments().len(), sum, "summed payments");
        Ok(sum)
    }

    /// All payments of an account, found with `workers` parallel workers.
    /// Fails with `AccountNotFound` when the account has no payments.
    pub fn filter_payments(
        &self,
        account_id: AccountId,
        workers: usize,
    ) -> Result<Vec<Payment>, LedgerError> {
        filter_payments(self.payments(), account_id, workers)
    }

    /// Per-part sums of the payment log, `part_size` payments per part.
    pub fn sum_payments_with_progress(
        &self,
        part_size: usize,
    ) -> Result<Vec<Progress>, LedgerError> {
        sum_payments_with_progress(self.payments(), part_size)
    }
}

/// Money is an integer amount of the smallest currency unit.
/// The ledger never converts currencies and never uses floating point.
pub type Money = i64;

/// Returns true if the amount can be deposited or paid.
pub fn is_positive(amount: Money) -> bool {
    amount > 0
}

/// Sum a sequence of amounts, as the aggregator workers do for their slice.
/// Returns `None` if the total does not fit in [`Money`].
pub fn checked_total<I>(amounts: I) -> Option<Money>
where
    I: IntoIterator<Item = Money>,
{
    amounts
        .into_iter()
        .try_fold(0 as Money, |sum, amount| sum.checked_add(amount))
}

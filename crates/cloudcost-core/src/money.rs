//! Monetary rounding helpers
//!
//! All reported amounts carry two fractional digits and all percentages one,
//! both rounded half-up (midpoint away from zero). Percentages that make up a
//! breakdown are apportioned so that they add up to exactly 100.

use crate::error::{CloudcostError, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Round an amount to cents
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a percentage to one decimal place
pub fn round_percentage(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Split 100% across `parts` in tenths of a percent
///
/// Each share is truncated to one decimal place and the tenths left over go
/// to the largest remainders, earlier parts first on equal remainders. The
/// shares add up to exactly 100.0 and none is more than 0.1 from its exact
/// value. A zero total yields zero for every part.
pub fn apportion_percentages(parts: &[Decimal], total: Decimal) -> Vec<Decimal> {
    if total.is_zero() {
        return vec![Decimal::ZERO; parts.len()];
    }

    let tenth = Decimal::new(1, 1);
    let mut shares = Vec::with_capacity(parts.len());
    let mut remainders = Vec::with_capacity(parts.len());
    for &part in parts {
        let exact = part / total * Decimal::ONE_HUNDRED;
        let floor = exact.round_dp_with_strategy(1, RoundingStrategy::ToZero);
        remainders.push(exact - floor);
        shares.push(floor);
    }

    let assigned: Decimal = shares.iter().copied().sum();
    let leftover = ((Decimal::ONE_HUNDRED - assigned) / tenth)
        .round()
        .to_usize()
        .unwrap_or(0)
        .min(parts.len());

    let mut order: Vec<usize> = (0..parts.len()).collect();
    order.sort_by(|&a, &b| remainders[b].cmp(&remainders[a]).then(a.cmp(&b)));
    for &index in order.iter().take(leftover) {
        shares[index] += tenth;
    }
    shares
}

/// Sum amounts, failing instead of overflowing
///
/// # Errors
///
/// Returns [`CloudcostError::InvalidSnapshot`] when the total exceeds the
/// representable range
pub fn checked_sum<I>(amounts: I) -> Result<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts.into_iter().try_fold(Decimal::ZERO, |acc, amount| {
        acc.checked_add(amount).ok_or_else(|| {
            CloudcostError::InvalidSnapshot(format!("cost total overflows at {acc} + {amount}"))
        })
    })
}

/// Sum an iterator of amounts without rounding
///
/// Only for amounts derived from catalog rates, which are bounded. Use
/// [`checked_sum`] for costs read from a snapshot.
pub fn sum<I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    amounts.into_iter().fold(Decimal::ZERO, |acc, amount| acc + amount)
}

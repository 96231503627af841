use crate::error::{DashboardError, Result};
use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Format used for budget keys and month labels, e.g. "Jan 2024".
pub const MONTH_KEY_FORMAT: &str = "%b %Y";

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn next_month_start(date: NaiveDate) -> NaiveDate {
    let start = month_start(date);
    start.checked_add_months(Months::new(1)).unwrap_or(start)
}

pub fn prev_month_start(date: NaiveDate) -> NaiveDate {
    let start = month_start(date);
    start.checked_sub_months(Months::new(1)).unwrap_or(start)
}

/// Moves the month containing `date` by `offset` months (negative goes back).
pub fn shift_month(date: NaiveDate, offset: i32) -> Result<NaiveDate> {
    let start = month_start(date);
    let shifted = if offset >= 0 {
        start.checked_add_months(Months::new(offset.unsigned_abs()))
    } else {
        start.checked_sub_months(Months::new(offset.unsigned_abs()))
    };

    shifted.ok_or_else(|| {
        DashboardError::DateError(format!(
            "Cannot shift {} by {} months",
            start.format("%Y-%m"),
            offset
        ))
    })
}

pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    next_month_start(date).pred_opt().unwrap_or(date)
}

pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    let year_diff = end.year() - start.year();
    let month_diff = end.month() as i32 - start.month() as i32;
    year_diff * 12 + month_diff
}

pub fn month_key(date: NaiveDate) -> String {
    date.format(MONTH_KEY_FORMAT).to_string()
}

/// Parses a "MMM yyyy" key into the first day of that month.
pub fn parse_month_key(key: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("01 {}", key.trim()), "%d %b %Y")
        .map_err(|_| DashboardError::InvalidMonthKey(key.to_string()))
}

/// `a + b`, or `Overflow` naming what was being summed.
pub fn add_amounts(a: Decimal, b: Decimal, context: &str) -> Result<Decimal> {
    a.checked_add(b)
        .ok_or_else(|| DashboardError::Overflow(format!("{} + {} ({})", a, b, context)))
}

pub fn sub_amounts(a: Decimal, b: Decimal, context: &str) -> Result<Decimal> {
    a.checked_sub(b)
        .ok_or_else(|| DashboardError::Overflow(format!("{} - {} ({})", a, b, context)))
}

pub fn sum_amounts(amounts: impl IntoIterator<Item = Decimal>, context: &str) -> Result<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| add_amounts(acc, amount, context))
}

/// `part / whole * 100` as f64; 0 when `whole` is zero. Results too large
/// for a decimal are computed in f64 instead.
pub fn percentage(part: Decimal, whole: Decimal) -> f64 {
    if whole.is_zero() {
        return 0.0;
    }

    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .and_then(|p| p.to_f64())
        .unwrap_or_else(|| to_f64(part) / to_f64(whole) * 100.0)
}

pub(crate) fn to_f64(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or(0.0)
}

/// An inclusive span of calendar months, each identified by its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl MonthRange {
    /// Normalizes both ends to month starts. Reversed bounds are swapped.
    pub fn new(first: NaiveDate, last: NaiveDate) -> Self {
        let (a, b) = (month_start(first), month_start(last));
        if b < a {
            Self { first: b, last: a }
        } else {
            Self { first: a, last: b }
        }
    }

    pub fn single(month: NaiveDate) -> Self {
        Self::new(month, month)
    }

    /// Exclusive upper bound: the first day after the last month.
    pub fn end_exclusive(&self) -> NaiveDate {
        next_month_start(self.last)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first && date < self.end_exclusive()
    }

    /// Number of months covered; never zero.
    pub fn month_count(&self) -> usize {
        (months_between(self.first, self.last) + 1) as usize
    }

    pub fn months(&self) -> Vec<NaiveDate> {
        let mut months = Vec::with_capacity(self.month_count());
        let mut current = self.first;
        while current <= self.last {
            months.push(current);
            current = next_month_start(current);
        }
        months
    }

    pub fn month_keys(&self) -> Vec<String> {
        self.months().into_iter().map(month_key).collect()
    }
}

//! Expansion of recurring expenses and income into per-month contributions.
//!
//! Occurrences step forward from the item's anchor date. Monthly and yearly
//! steps are always computed from the anchor (`anchor + n months`), so a
//! series starting on the 31st lands on the last day of shorter months
//! without drifting. Daily and weekly occurrences are summed into the month
//! they fall in.
//!
//! Stop dates are exclusive, but a stop date falling mid-month keeps that
//! month in full: the series runs until the first day of the month following
//! its last active day. There is no pro-rating. A stop date on or before the
//! anchor means the item never occurs.
//!
//! Income uses [`monthly_equivalent`] instead: every active month receives the
//! recurring amount scaled to one month (yearly / 12, weekly * 52 / 12,
//! daily * 365 / 12).

use crate::error::{DashboardError, Result};
use crate::schema::{Currency, Expense, IncomeSource, RecurrenceInterval};
use crate::utils::{month_start, months_between, next_month_start, MonthRange};
use chrono::{Days, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Anything that can be expanded over a month range.
pub trait Recurring {
    fn anchor_date(&self) -> NaiveDate;
    /// `None` for one-off items.
    fn recurrence(&self) -> Option<RecurrenceInterval>;
    fn stop_date(&self) -> Option<NaiveDate>;
    fn amount(&self) -> Decimal;
    fn currency(&self) -> Currency;
}

impl Recurring for Expense {
    fn anchor_date(&self) -> NaiveDate {
        self.date
    }

    fn recurrence(&self) -> Option<RecurrenceInterval> {
        self.is_recurring
            .then(|| self.recurring_interval.unwrap_or(RecurrenceInterval::Monthly))
    }

    fn stop_date(&self) -> Option<NaiveDate> {
        self.stop_date
    }

    fn amount(&self) -> Decimal {
        self.amount
    }

    fn currency(&self) -> Currency {
        self.currency
    }
}

impl Recurring for IncomeSource {
    fn anchor_date(&self) -> NaiveDate {
        self.start_date
    }

    fn recurrence(&self) -> Option<RecurrenceInterval> {
        self.is_recurring
            .then(|| self.recurring_interval.unwrap_or(RecurrenceInterval::Monthly))
    }

    fn stop_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    fn amount(&self) -> Decimal {
        self.amount
    }

    fn currency(&self) -> Currency {
        self.currency
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    /// First day of the month.
    pub month: NaiveDate,
    /// Amount in the item's own currency.
    pub amount: Decimal,
    /// Occurrences folded into `amount`; 1 for a monthly equivalent.
    pub occurrences: u32,
}

/// Exclusive end of an item with the given stop date, widened to the end of
/// the month containing its last active day.
pub fn effective_end(stop_date: NaiveDate) -> NaiveDate {
    match stop_date.pred_opt() {
        Some(last_active) => next_month_start(last_active),
        None => stop_date,
    }
}

pub fn expand<T: Recurring + ?Sized>(
    item: &T,
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> Result<Vec<Contribution>> {
    expand_in(item, &MonthRange::new(range_start, range_end))
}

pub fn expand_in<T: Recurring + ?Sized>(item: &T, range: &MonthRange) -> Result<Vec<Contribution>> {
    let mut buckets: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for date in occurrences(item, range) {
        let count = buckets.entry(month_start(date)).or_insert(0);
        *count = count.saturating_add(1);
    }

    buckets
        .into_iter()
        .map(|(month, count)| {
            let amount = item
                .amount()
                .checked_mul(Decimal::from(count))
                .ok_or_else(|| {
                    DashboardError::Overflow(format!(
                        "{} x {} occurrences in {}",
                        item.amount(),
                        count,
                        month.format("%Y-%m")
                    ))
                })?;
            Ok(Contribution {
                month,
                amount,
                occurrences: count,
            })
        })
        .collect()
}

/// Spreads a recurring item evenly over its active months: one contribution
/// per month from the anchor month up to the effective end, each holding the
/// amount scaled to one month. One-off items expand as usual.
pub fn monthly_equivalent<T: Recurring + ?Sized>(
    item: &T,
    range: &MonthRange,
) -> Result<Vec<Contribution>> {
    let Some(interval) = item.recurrence() else {
        return expand_in(item, range);
    };

    let anchor = item.anchor_date();
    let mut end = range.end_exclusive();
    if let Some(stop) = item.stop_date() {
        if stop <= anchor {
            return Ok(Vec::new());
        }
        end = end.min(effective_end(stop));
    }

    let amount = monthly_rate(item.amount(), interval)?;
    let first_active = month_start(anchor);

    Ok(range
        .months()
        .into_iter()
        .filter(|month| *month >= first_active && *month < end)
        .map(|month| Contribution {
            month,
            amount,
            occurrences: 1,
        })
        .collect())
}

fn monthly_rate(amount: Decimal, interval: RecurrenceInterval) -> Result<Decimal> {
    let (times, per) = match interval {
        RecurrenceInterval::Daily => (365, 12),
        RecurrenceInterval::Weekly => (52, 12),
        RecurrenceInterval::Monthly => (1, 1),
        RecurrenceInterval::Yearly => (1, 12),
    };

    amount
        .checked_mul(Decimal::from(times))
        .and_then(|a| a.checked_div(Decimal::from(per)))
        .ok_or_else(|| DashboardError::Overflow(format!("monthly equivalent of {}", amount)))
}

/// Every occurrence date of `item` inside `range`, ascending.
pub fn occurrences<T: Recurring + ?Sized>(item: &T, range: &MonthRange) -> Vec<NaiveDate> {
    let anchor = item.anchor_date();

    let Some(interval) = item.recurrence() else {
        return if range.contains(anchor) {
            vec![anchor]
        } else {
            Vec::new()
        };
    };

    let mut limit = range.end_exclusive();
    if let Some(stop) = item.stop_date() {
        if stop <= anchor {
            return Vec::new();
        }
        limit = limit.min(effective_end(stop));
    }

    let mut dates = Vec::new();
    let mut n = first_candidate_index(interval, anchor, range.first);

    while let Some(date) = occurrence_at(anchor, interval, n) {
        if date >= limit {
            break;
        }
        if date >= range.first {
            dates.push(date);
        }
        n += 1;
    }

    dates
}

fn occurrence_at(anchor: NaiveDate, interval: RecurrenceInterval, n: u32) -> Option<NaiveDate> {
    match interval {
        RecurrenceInterval::Daily => anchor.checked_add_days(Days::new(n as u64)),
        RecurrenceInterval::Weekly => anchor.checked_add_days(Days::new(7 * n as u64)),
        RecurrenceInterval::Monthly => anchor.checked_add_months(Months::new(n)),
        RecurrenceInterval::Yearly => anchor.checked_add_months(Months::new(n.checked_mul(12)?)),
    }
}

/// Lower bound on the first occurrence index that can reach `range_first`,
/// so old series do not replay years of occurrences.
fn first_candidate_index(interval: RecurrenceInterval, anchor: NaiveDate, range_first: NaiveDate) -> u32 {
    if range_first <= anchor {
        return 0;
    }

    let days = (range_first - anchor).num_days().max(0) as u64;
    let months = (months_between(anchor, range_first) - 1).max(0) as u32;

    let index = match interval {
        RecurrenceInterval::Daily => days,
        RecurrenceInterval::Weekly => days / 7,
        RecurrenceInterval::Monthly => months as u64,
        RecurrenceInterval::Yearly => (months / 12) as u64,
    };

    u32::try_from(index).unwrap_or(u32::MAX)
}

/// Synthesizes ephemeral copies of recurring expenses for the months after
/// `reference` that fall inside `range`. Stored records are never touched.
pub fn project_expenses(expenses: &[Expense], range: &MonthRange, reference: NaiveDate) -> Vec<Expense> {
    let first_future = next_month_start(reference);
    if range.last < first_future {
        return Vec::new();
    }
    let future = MonthRange::new(range.first.max(first_future), range.last);

    let mut projected: Vec<Expense> = expenses
        .iter()
        .filter(|e| e.is_recurring && !e.is_projection)
        .flat_map(|expense| {
            occurrences(expense, &future)
                .into_iter()
                .map(move |date| Expense {
                    id: format!("{}:{}", expense.id, date.format("%Y-%m-%d")),
                    date,
                    is_recurring: false,
                    recurring_interval: None,
                    stop_date: None,
                    is_projection: true,
                    ..expense.clone()
                })
        })
        .collect();

    projected.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
    projected
}

use crate::currency::RateTable;
use crate::error::{DashboardError, Result};
use crate::recurrence::{expand_in, monthly_equivalent, Recurring};
use crate::schema::{Currency, Expense, IncomeSource};
use crate::utils::{add_amounts, month_key, month_start, shift_month, sub_amounts, MonthRange};
use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sliding window of months around a reference month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MonthWindow {
    #[schemars(description = "Number of months shown before the reference month")]
    pub months_back: u32,
    #[schemars(description = "Number of projected months after the reference month (at most 12)")]
    pub months_forward: u32,
}

impl MonthWindow {
    pub const MAX_FORWARD: u32 = 12;

    pub fn new(months_back: u32, months_forward: u32) -> Result<Self> {
        let window = Self {
            months_back,
            months_forward,
        };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> Result<()> {
        if self.months_forward > Self::MAX_FORWARD {
            return Err(DashboardError::InvalidWindow {
                months_back: self.months_back,
                months_forward: self.months_forward,
                max_forward: Self::MAX_FORWARD,
            });
        }
        Ok(())
    }

    /// Months the window spans, the reference month included.
    pub fn month_count(&self) -> usize {
        self.months_back as usize + self.months_forward as usize + 1
    }

    pub fn range(&self, reference: NaiveDate) -> Result<MonthRange> {
        let back = i32::try_from(self.months_back).map_err(|_| {
            DashboardError::DateError(format!("months_back {} is too large", self.months_back))
        })?;
        let first = shift_month(reference, -back)?;
        let last = shift_month(reference, self.months_forward as i32)?;
        Ok(MonthRange::new(first, last))
    }
}

impl Default for MonthWindow {
    fn default() -> Self {
        Self {
            months_back: 5,
            months_forward: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    /// First day of the month.
    pub month: NaiveDate,
    /// "MMM yyyy" label.
    pub label: String,
    pub income: Decimal,
    pub expenses: Decimal,
    /// `income - expenses`; negative when overspending.
    pub savings: Decimal,
    pub currency: Currency,
    /// True for months after the reference month.
    pub is_projected: bool,
}

impl MonthlyTotal {
    pub fn converted(&self, rates: &RateTable, to: Currency) -> Result<Self> {
        let income = rates.convert(self.income, self.currency, to)?;
        let expenses = rates.convert(self.expenses, self.currency, to)?;
        Ok(Self {
            month: self.month,
            label: self.label.clone(),
            income,
            expenses,
            savings: sub_amounts(income, expenses, &self.label)?,
            currency: to,
            is_projected: self.is_projected,
        })
    }

    /// Rounds income and expenses, then recomputes savings from the rounded
    /// figures so the identity still holds.
    pub fn round_dp(&self, dp: u32) -> Result<Self> {
        let income = self.income.round_dp(dp);
        let expenses = self.expenses.round_dp(dp);
        Ok(Self {
            month: self.month,
            label: self.label.clone(),
            income,
            expenses,
            savings: sub_amounts(income, expenses, &self.label)?,
            currency: self.currency,
            is_projected: self.is_projected,
        })
    }
}

#[derive(Default)]
struct MonthSlot {
    income: Decimal,
    expenses: Decimal,
}

/// Combines recorded expenses, recurring expansions and income into
/// per-month totals in a single base currency.
pub struct MonthlyAggregator<'a> {
    rates: &'a RateTable,
    base: Currency,
}

impl<'a> MonthlyAggregator<'a> {
    pub fn new(rates: &'a RateTable, base: Currency) -> Result<Self> {
        if !rates.supports(base) {
            return Err(DashboardError::UnsupportedCurrency(base.to_string()));
        }
        Ok(Self { rates, base })
    }

    pub fn base(&self) -> Currency {
        self.base
    }

    pub fn aggregate(
        &self,
        expenses: &[Expense],
        income_sources: &[IncomeSource],
        window: MonthWindow,
        reference: NaiveDate,
    ) -> Result<Vec<MonthlyTotal>> {
        window.validate()?;
        let range = window.range(reference)?;
        let current = month_start(reference);

        if expenses.is_empty() && income_sources.is_empty() {
            debug!(
                "No expenses or income sources; emitting {} zero months",
                range.month_count()
            );
        }

        let mut grid: BTreeMap<NaiveDate, MonthSlot> = range
            .months()
            .into_iter()
            .map(|m| (m, MonthSlot::default()))
            .collect();

        for expense in expenses {
            if expense.is_projection {
                debug!("Skipping synthetic projection record {}", expense.id);
                continue;
            }

            let recurring = expense.recurrence().is_some();
            for contribution in expand_in(expense, &range)? {
                // Future months only ever hold recurring projections.
                if contribution.month > current && !recurring {
                    continue;
                }
                let amount = self
                    .rates
                    .convert(contribution.amount, expense.currency, self.base)?;
                if let Some(slot) = grid.get_mut(&contribution.month) {
                    slot.expenses = add_amounts(slot.expenses, amount, "monthly expenses")?;
                }
            }
        }

        for source in income_sources {
            for contribution in monthly_equivalent(source, &range)? {
                let amount = self
                    .rates
                    .convert(contribution.amount, source.currency, self.base)?;
                if let Some(slot) = grid.get_mut(&contribution.month) {
                    slot.income = add_amounts(slot.income, amount, "monthly income")?;
                }
            }
        }

        let totals = grid
            .into_iter()
            .map(|(month, slot)| {
                let label = month_key(month);
                Ok(MonthlyTotal {
                    month,
                    savings: sub_amounts(slot.income, slot.expenses, &label)?,
                    label,
                    income: slot.income,
                    expenses: slot.expenses,
                    currency: self.base,
                    is_projected: month > current,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Aggregated {} months ({} to {}) in {}",
            totals.len(),
            month_key(range.first),
            month_key(range.last),
            self.base
        );

        Ok(totals)
    }
}

pub fn aggregate(
    expenses: &[Expense],
    income_sources: &[IncomeSource],
    months_back: u32,
    months_forward: u32,
    reference: NaiveDate,
    rates: &RateTable,
    base: Currency,
) -> Result<Vec<MonthlyTotal>> {
    let window = MonthWindow::new(months_back, months_forward)?;
    MonthlyAggregator::new(rates, base)?.aggregate(expenses, income_sources, window, reference)
}

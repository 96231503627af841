//! Spending grouped by category over a period, with budget comparison.
//!
//! Category resolution for an expense follows a fixed chain:
//! 1. `category_id` found among the known categories
//! 2. the legacy free-text `category` label
//! 3. the default "Other" bucket
//!
//! Older records may only carry the legacy label, so the order matters. A
//! legacy label that matches a known category's name (ignoring case) lands
//! in that category's bucket.

use crate::currency::RateTable;
use crate::error::{DashboardError, Result};
use crate::recurrence::expand_in;
use crate::schema::{Category, CategoryBudget, Currency, Expense};
use crate::utils::{add_amounts, parse_month_key, percentage, MonthRange};
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

pub const OTHER_CATEGORY_ID: &str = "other";
pub const OTHER_CATEGORY_NAME: &str = "Other";

pub const CATEGORY_PALETTE: [&str; 12] = [
    "#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF", "#FF9F40", "#8AC926", "#1982C4",
    "#6A4C93", "#F15BB5", "#00BBF9", "#FB5607",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySource {
    /// Resolved through `category_id`.
    Id,
    /// Fell back to the legacy free-text label.
    Legacy,
    /// Neither resolved; bucketed under "Other".
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCategory {
    pub id: String,
    pub name: String,
    pub source: CategorySource,
    /// True when `id` refers to one of the configured categories.
    pub known: bool,
    pub color: String,
    pub icon: Option<String>,
    pub display_order: Option<i32>,
}

/// Stable palette color for a bucket identifier.
pub fn category_color(id: &str) -> &'static str {
    let hash = id
        .bytes()
        .fold(5381u32, |h, b| h.wrapping_mul(33).wrapping_add(b as u32));
    CATEGORY_PALETTE[hash as usize % CATEGORY_PALETTE.len()]
}

fn from_category(category: &Category, source: CategorySource) -> ResolvedCategory {
    ResolvedCategory {
        id: category.id.clone(),
        name: category.name.clone(),
        source,
        known: true,
        color: category
            .color
            .clone()
            .unwrap_or_else(|| category_color(&category.id).to_string()),
        icon: category.icon.clone(),
        display_order: category.display_order,
    }
}

pub fn resolve_category(expense: &Expense, known: &HashMap<&str, &Category>) -> ResolvedCategory {
    if let Some(category) = expense
        .category_id
        .as_deref()
        .and_then(|id| known.get(id))
    {
        return from_category(category, CategorySource::Id);
    }

    if let Some(label) = expense
        .category
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
    {
        debug!(
            "Expense {} has no resolvable category id, using legacy label '{}'",
            expense.id, label
        );

        // Lowest id wins if two categories share a name.
        if let Some(category) = known
            .values()
            .filter(|c| c.name.trim().eq_ignore_ascii_case(label))
            .min_by(|a, b| a.id.cmp(&b.id))
        {
            return from_category(category, CategorySource::Legacy);
        }

        return ResolvedCategory {
            id: label.to_string(),
            name: label.to_string(),
            source: CategorySource::Legacy,
            known: false,
            color: category_color(label).to_string(),
            icon: None,
            display_order: None,
        };
    }

    debug!("Expense {} has no category, bucketing as {}", expense.id, OTHER_CATEGORY_NAME);
    ResolvedCategory {
        id: OTHER_CATEGORY_ID.to_string(),
        name: OTHER_CATEGORY_NAME.to_string(),
        source: CategorySource::Default,
        known: false,
        color: category_color(OTHER_CATEGORY_ID).to_string(),
        icon: None,
        display_order: None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category_id: String,
    pub name: String,
    pub source: CategorySource,
    pub amount: Decimal,
    /// Share of the period total, 0-100. Zero when the period total is zero.
    pub percentage: f64,
    /// Sum of the category's budgets across the period, if any were set.
    pub budget: Option<Decimal>,
    pub color: String,
    pub icon: Option<String>,
    pub currency: Currency,
    pub occurrences: u32,
    #[serde(skip)]
    display_order: Option<i32>,
}

impl CategoryTotal {
    /// Spent / budget as a percentage. `None` without a positive budget.
    pub fn budget_usage(&self) -> Option<f64> {
        let budget = self.budget.filter(|b| *b > Decimal::ZERO)?;
        Some(percentage(self.amount, budget))
    }

    pub fn remaining_budget(&self) -> Option<Decimal> {
        self.budget.and_then(|b| b.checked_sub(self.amount))
    }

    pub fn is_over_budget(&self) -> bool {
        self.budget.is_some_and(|b| self.amount > b)
    }

    pub fn converted(&self, rates: &RateTable, to: Currency) -> Result<Self> {
        let budget = self
            .budget
            .map(|b| rates.convert(b, self.currency, to))
            .transpose()?;
        Ok(Self {
            amount: rates.convert(self.amount, self.currency, to)?,
            budget,
            currency: to,
            ..self.clone()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum BucketKey {
    Known(String),
    Label(String),
    Other,
}

impl BucketKey {
    fn of(resolved: &ResolvedCategory) -> Self {
        match resolved.source {
            _ if resolved.known => BucketKey::Known(resolved.id.clone()),
            CategorySource::Default => BucketKey::Other,
            _ => BucketKey::Label(resolved.id.clone()),
        }
    }
}

struct Bucket {
    resolved: ResolvedCategory,
    amount: Decimal,
    occurrences: u32,
}

pub struct CategoryAggregator<'a> {
    rates: &'a RateTable,
    base: Currency,
}

impl<'a> CategoryAggregator<'a> {
    pub fn new(rates: &'a RateTable, base: Currency) -> Result<Self> {
        if !rates.supports(base) {
            return Err(DashboardError::UnsupportedCurrency(base.to_string()));
        }
        Ok(Self { rates, base })
    }

    pub fn aggregate(
        &self,
        expenses: &[Expense],
        categories: &[Category],
        budgets: &[CategoryBudget],
        period: &MonthRange,
    ) -> Result<Vec<CategoryTotal>> {
        if expenses.is_empty() || categories.is_empty() {
            debug!(
                "Category aggregation short-circuited ({} expenses, {} categories)",
                expenses.len(),
                categories.len()
            );
            return Ok(Vec::new());
        }

        let known: HashMap<&str, &Category> =
            categories.iter().map(|c| (c.id.as_str(), c)).collect();

        // A free-text label that happens to equal a known id stays separate.
        let mut buckets: BTreeMap<BucketKey, Bucket> = BTreeMap::new();
        let mut total = Decimal::ZERO;

        for expense in expenses.iter().filter(|e| !e.is_projection) {
            let contributions = expand_in(expense, period)?;
            if contributions.is_empty() {
                continue;
            }

            let resolved = resolve_category(expense, &known);
            let source = resolved.source;
            let bucket = buckets
                .entry(BucketKey::of(&resolved))
                .or_insert_with(|| Bucket {
                    resolved,
                    amount: Decimal::ZERO,
                    occurrences: 0,
                });
            // Reported as Id if any expense reached it through its id.
            bucket.resolved.source = bucket.resolved.source.min(source);

            for contribution in contributions {
                let amount = self
                    .rates
                    .convert(contribution.amount, expense.currency, self.base)?;
                bucket.amount = add_amounts(bucket.amount, amount, &bucket.resolved.name)?;
                bucket.occurrences = bucket.occurrences.saturating_add(contribution.occurrences);
                total = add_amounts(total, amount, "category total")?;
            }
        }

        let period_budgets = self.budgets_for_period(budgets, period)?;

        let mut totals: Vec<CategoryTotal> = buckets
            .into_values()
            .map(|bucket| {
                let budget = if bucket.resolved.known {
                    period_budgets.get(&bucket.resolved.id).copied()
                } else {
                    None
                };
                CategoryTotal {
                    category_id: bucket.resolved.id,
                    name: bucket.resolved.name,
                    source: bucket.resolved.source,
                    percentage: percentage(bucket.amount, total),
                    amount: bucket.amount,
                    budget,
                    color: bucket.resolved.color,
                    icon: bucket.resolved.icon,
                    currency: self.base,
                    occurrences: bucket.occurrences,
                    display_order: bucket.resolved.display_order,
                }
            })
            .collect();

        totals.sort_by(compare_totals);

        debug!(
            "Aggregated {} categories totalling {} {}",
            totals.len(),
            total,
            self.base
        );

        Ok(totals)
    }

    fn budgets_for_period(
        &self,
        budgets: &[CategoryBudget],
        period: &MonthRange,
    ) -> Result<HashMap<String, Decimal>> {
        let mut summed: HashMap<String, Decimal> = HashMap::new();
        for budget in budgets {
            let month = parse_month_key(&budget.month)?;
            if !period.contains(month) {
                continue;
            }
            let amount = self.rates.convert(budget.amount, budget.currency, self.base)?;
            let entry = summed.entry(budget.category_id.clone()).or_insert(Decimal::ZERO);
            *entry = add_amounts(*entry, amount, "category budget")?;
        }
        Ok(summed)
    }
}

fn compare_totals(a: &CategoryTotal, b: &CategoryTotal) -> Ordering {
    b.amount
        .cmp(&a.amount)
        .then_with(|| match (a.display_order, b.display_order) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.name.cmp(&b.name))
}

pub fn aggregate_by_category(
    expenses: &[Expense],
    categories: &[Category],
    budgets: &[CategoryBudget],
    period: &MonthRange,
    rates: &RateTable,
    base: Currency,
) -> Result<Vec<CategoryTotal>> {
    CategoryAggregator::new(rates, base)?.aggregate(expenses, categories, budgets, period)
}

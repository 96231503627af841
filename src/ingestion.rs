use crate::error::{DashboardError, Result};
use crate::schema::{Category, CategoryBudget, Expense, FinanceSnapshot, IncomeSource};
use crate::utils::parse_month_key;
use log::{debug, info};
use rust_decimal::Decimal;
use std::path::Path;

/// Read access to already-fetched records. Implementations wrap whatever
/// backend holds the data; the aggregation core only sees this trait.
pub trait DataSource {
    fn expenses(&self) -> Result<Vec<Expense>>;
    fn income_sources(&self) -> Result<Vec<IncomeSource>>;
    fn categories(&self) -> Result<Vec<Category>>;
    /// Budgets for one month key in "MMM yyyy" format.
    fn budgets(&self, month_key: &str) -> Result<Vec<CategoryBudget>>;
}

impl DataSource for FinanceSnapshot {
    fn expenses(&self) -> Result<Vec<Expense>> {
        Ok(self.expenses.clone())
    }

    fn income_sources(&self) -> Result<Vec<IncomeSource>> {
        Ok(self.income_sources.clone())
    }

    fn categories(&self) -> Result<Vec<Category>> {
        Ok(self.categories.clone())
    }

    fn budgets(&self, month_key: &str) -> Result<Vec<CategoryBudget>> {
        let month = parse_month_key(month_key)?;
        let mut matching = Vec::new();
        for budget in &self.budgets {
            if parse_month_key(&budget.month)? == month {
                matching.push(budget.clone());
            }
        }
        Ok(matching)
    }
}

impl FinanceSnapshot {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let snapshot: FinanceSnapshot = serde_json::from_str(json)?;
        validate_snapshot(&snapshot)?;
        debug!(
            "Loaded snapshot: {} expenses, {} income sources, {} categories, {} budgets",
            snapshot.expenses.len(),
            snapshot.income_sources.len(),
            snapshot.categories.len(),
            snapshot.budgets.len()
        );
        Ok(snapshot)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading finance snapshot from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Rejects records the aggregators cannot interpret. Missing optional fields
/// (stop dates, budgets, legacy labels) are fine.
pub fn validate_snapshot(snapshot: &FinanceSnapshot) -> Result<()> {
    for expense in &snapshot.expenses {
        if expense.amount < Decimal::ZERO {
            return Err(DashboardError::ValidationError {
                record: format!("expense {}", expense.id),
                details: format!("amount {} is negative", expense.amount),
            });
        }

        if let Some(stop) = expense.stop_date {
            if stop <= expense.date {
                return Err(DashboardError::ValidationError {
                    record: format!("expense {}", expense.id),
                    details: format!("stop date {} is not after start date {}", stop, expense.date),
                });
            }
        }
    }

    for source in &snapshot.income_sources {
        if source.amount < Decimal::ZERO {
            return Err(DashboardError::ValidationError {
                record: format!("income source {}", source.id),
                details: format!("amount {} is negative", source.amount),
            });
        }

        if let Some(end) = source.end_date {
            if end <= source.start_date {
                return Err(DashboardError::ValidationError {
                    record: format!("income source {}", source.id),
                    details: format!("end date {} is not after start date {}", end, source.start_date),
                });
            }
        }
    }

    for budget in &snapshot.budgets {
        parse_month_key(&budget.month)?;
        if budget.amount < Decimal::ZERO {
            return Err(DashboardError::ValidationError {
                record: format!("budget {} / {}", budget.category_id, budget.month),
                details: format!("amount {} is negative", budget.amount),
            });
        }
    }

    Ok(())
}

//! # Finance Dashboard Core
//!
//! Aggregation and projection engine behind a personal finance dashboard.
//! Takes expense, income, category and budget records that were already
//! fetched from storage and derives everything the dashboard displays.
//!
//! ## Core Concepts
//!
//! - **Recurrence expansion**: recurring expenses are expanded into per-month
//!   contributions. A stop date mid-month keeps that month in full. Recurring
//!   income is spread as a monthly equivalent.
//! - **Monthly totals**: income, expenses and savings for a window of months
//!   around the reference month. Future months only hold recurring projections.
//! - **Category totals**: spending per category with percentages, budgets and
//!   stable colors. Unresolved categories fall back to the legacy label, then
//!   to "Other".
//! - **Trends**: month-over-month change. Lower spending and higher savings
//!   both count as improving.
//! - **Single base currency**: everything is summed in the base currency and
//!   converted to the display currency only at the end.
//!
//! ## Example
//!
//! ```rust,ignore
//! use finance_dashboard_core::*;
//! use chrono::NaiveDate;
//!
//! let snapshot = FinanceSnapshot::from_json_file("finance.json")?;
//! let config = DashboardConfig::new(NaiveDate::from_ymd_opt(2024, 1, 20).unwrap())
//!     .with_window(5, 3)
//!     .with_display_currency(Currency::Usd);
//!
//! let dashboard = process_dashboard(&snapshot, &config, &RateTable::fixed())?;
//! for month in &dashboard.monthly {
//!     println!("{}: {} saved", month.label, month.savings);
//! }
//! ```

pub mod categories;
pub mod currency;
pub mod dashboard;
pub mod error;
pub mod ingestion;
pub mod monthly;
pub mod recurrence;
pub mod schema;
pub mod trend;
pub mod utils;
pub mod verification;

#[cfg(feature = "remote-rates")]
pub mod rates;

pub use categories::{
    aggregate_by_category, category_color, resolve_category, CategoryAggregator, CategorySource,
    CategoryTotal, OTHER_CATEGORY_ID, OTHER_CATEGORY_NAME,
};
pub use currency::{convert, RateTable};
pub use dashboard::{Dashboard, DashboardConfig, MonthSnapshot};
pub use error::{DashboardError, Result};
pub use ingestion::{validate_snapshot, DataSource};
pub use monthly::{aggregate, MonthWindow, MonthlyAggregator, MonthlyTotal};
pub use recurrence::{expand, monthly_equivalent, project_expenses, Contribution, Recurring};
pub use schema::*;
pub use trend::{expense_trend, savings_trend, Trend, TrendDirection};
pub use utils::{month_key, parse_month_key, MonthRange};
pub use verification::{verify_dashboard, VerificationResult};

#[cfg(feature = "remote-rates")]
pub use rates::{parse_rate_response, RateClient};

use log::{debug, info};

pub struct DashboardProcessor;

impl DashboardProcessor {
    pub fn process<S: DataSource + ?Sized>(
        source: &S,
        config: &DashboardConfig,
        rates: &RateTable,
    ) -> Result<Dashboard> {
        config.validate(rates)?;

        let reference = utils::month_start(config.reference_date);
        info!(
            "Building dashboard for {} ({} back, {} forward, {} -> {})",
            month_key(reference),
            config.months_back,
            config.months_forward,
            config.base_currency,
            config.display_currency
        );

        let expenses = source.expenses()?;
        let income_sources = source.income_sources()?;
        let categories = source.categories()?;
        let budgets = source.budgets(&month_key(reference))?;

        debug!(
            "Source provided {} expenses, {} income sources, {} categories, {} budgets",
            expenses.len(),
            income_sources.len(),
            categories.len(),
            budgets.len()
        );

        let monthly_aggregator = MonthlyAggregator::new(rates, config.base_currency)?;
        let monthly =
            monthly_aggregator.aggregate(&expenses, &income_sources, config.window(), reference)?;

        let recent = monthly_aggregator.aggregate(
            &expenses,
            &income_sources,
            MonthWindow {
                months_back: 1,
                months_forward: 0,
            },
            reference,
        )?;
        let current_month = match recent.as_slice() {
            [previous, current] => MonthSnapshot::from_totals(current, previous),
            _ => {
                return Err(DashboardError::DateError(format!(
                    "Expected two months around {}, got {}",
                    month_key(reference),
                    recent.len()
                )))
            }
        };

        let category_totals = CategoryAggregator::new(rates, config.base_currency)?.aggregate(
            &expenses,
            &categories,
            &budgets,
            &MonthRange::single(reference),
        )?;

        let projected_expenses =
            project_expenses(&expenses, &config.window().range(reference)?, reference);

        let dashboard = Dashboard {
            reference_month: reference,
            currency: config.base_currency,
            monthly,
            categories: category_totals,
            current_month,
            projected_expenses,
        };

        dashboard.converted(rates, config.display_currency)
    }

    pub fn process_with_verification<S: DataSource + ?Sized>(
        source: &S,
        config: &DashboardConfig,
        rates: &RateTable,
        tolerance: f64,
    ) -> Result<Dashboard> {
        let dashboard = Self::process(source, config, rates)?;

        verify_dashboard(&dashboard, config.window().month_count(), tolerance)?;

        Ok(dashboard)
    }
}

pub fn process_dashboard<S: DataSource + ?Sized>(
    source: &S,
    config: &DashboardConfig,
    rates: &RateTable,
) -> Result<Dashboard> {
    DashboardProcessor::process(source, config, rates)
}

pub fn process_with_verification<S: DataSource + ?Sized>(
    source: &S,
    config: &DashboardConfig,
    rates: &RateTable,
    tolerance: f64,
) -> Result<Dashboard> {
    DashboardProcessor::process_with_verification(source, config, rates, tolerance)
}

use crate::categories::CategoryTotal;
use crate::currency::RateTable;
use crate::error::{DashboardError, Result};
use crate::monthly::{MonthWindow, MonthlyTotal};
use crate::schema::{Currency, Expense};
use crate::trend::{expense_trend, savings_trend, Trend};
use crate::utils::{percentage, sub_amounts, sum_amounts};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Decimal places kept once amounts are converted for display.
pub const DISPLAY_DECIMALS: u32 = 2;

fn default_months_back() -> u32 {
    MonthWindow::default().months_back
}

fn default_months_forward() -> u32 {
    MonthWindow::default().months_forward
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DashboardConfig {
    #[serde(default)]
    #[schemars(description = "Currency all aggregation is carried out in")]
    pub base_currency: Currency,

    #[serde(default)]
    #[schemars(description = "Currency results are converted to as the final step")]
    pub display_currency: Currency,

    #[serde(default = "default_months_back")]
    pub months_back: u32,

    #[serde(default = "default_months_forward")]
    #[schemars(description = "Projected months after the reference month, 0 to 12")]
    pub months_forward: u32,

    #[schemars(
        description = "Any date inside the month treated as 'current'. Fixing it makes a pass reproducible."
    )]
    pub reference_date: NaiveDate,
}

impl DashboardConfig {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self {
            base_currency: Currency::default(),
            display_currency: Currency::default(),
            months_back: default_months_back(),
            months_forward: default_months_forward(),
            reference_date,
        }
    }

    pub fn with_window(mut self, months_back: u32, months_forward: u32) -> Self {
        self.months_back = months_back;
        self.months_forward = months_forward;
        self
    }

    pub fn with_display_currency(mut self, currency: Currency) -> Self {
        self.display_currency = currency;
        self
    }

    pub fn with_base_currency(mut self, currency: Currency) -> Self {
        self.base_currency = currency;
        self
    }

    pub fn window(&self) -> MonthWindow {
        MonthWindow {
            months_back: self.months_back,
            months_forward: self.months_forward,
        }
    }

    pub fn validate(&self, rates: &RateTable) -> Result<()> {
        self.window().validate()?;

        for currency in [self.base_currency, self.display_currency] {
            if !rates.supports(currency) {
                return Err(DashboardError::UnsupportedCurrency(currency.to_string()));
            }
        }

        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Headline figures for the reference month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthSnapshot {
    pub month: NaiveDate,
    pub label: String,
    pub income: Decimal,
    pub expenses: Decimal,
    pub savings: Decimal,
    /// Savings as a share of income; 0 without income.
    pub savings_rate: f64,
    pub currency: Currency,
    pub expense_trend: Trend,
    pub savings_trend: Trend,
}

impl MonthSnapshot {
    pub fn from_totals(current: &MonthlyTotal, previous: &MonthlyTotal) -> Self {
        Self {
            month: current.month,
            label: current.label.clone(),
            income: current.income,
            expenses: current.expenses,
            savings: current.savings,
            savings_rate: percentage(current.savings, current.income),
            currency: current.currency,
            expense_trend: expense_trend(current.expenses, previous.expenses),
            savings_trend: savings_trend(current.savings, previous.savings),
        }
    }

    pub fn converted(&self, rates: &RateTable, to: Currency) -> Result<Self> {
        let income = rates.convert(self.income, self.currency, to)?.round_dp(DISPLAY_DECIMALS);
        let expenses = rates
            .convert(self.expenses, self.currency, to)?
            .round_dp(DISPLAY_DECIMALS);
        Ok(Self {
            income,
            expenses,
            savings: sub_amounts(income, expenses, &self.label)?,
            currency: to,
            ..self.clone()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub reference_month: NaiveDate,
    pub currency: Currency,
    pub monthly: Vec<MonthlyTotal>,
    /// Spending by category for the reference month.
    pub categories: Vec<CategoryTotal>,
    pub current_month: MonthSnapshot,
    /// Synthetic copies of recurring expenses for the projected months.
    pub projected_expenses: Vec<Expense>,
}

impl Dashboard {
    /// Converts every monetary figure to `to` and rounds for display.
    /// Percentages and trends are currency independent and carried over.
    pub fn converted(&self, rates: &RateTable, to: Currency) -> Result<Self> {
        let monthly = self
            .monthly
            .iter()
            .map(|t| t.converted(rates, to)?.round_dp(DISPLAY_DECIMALS))
            .collect::<Result<Vec<_>>>()?;

        let categories = self
            .categories
            .iter()
            .map(|c| {
                let mut converted = c.converted(rates, to)?;
                converted.amount = converted.amount.round_dp(DISPLAY_DECIMALS);
                converted.budget = converted.budget.map(|b| b.round_dp(DISPLAY_DECIMALS));
                Ok(converted)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            reference_month: self.reference_month,
            currency: to,
            monthly,
            categories,
            current_month: self.current_month.converted(rates, to)?,
            projected_expenses: self.projected_expenses.clone(),
        })
    }

    pub fn total_income(&self) -> Result<Decimal> {
        sum_amounts(self.monthly.iter().map(|t| t.income), "total income")
    }

    pub fn total_expenses(&self) -> Result<Decimal> {
        sum_amounts(self.monthly.iter().map(|t| t.expenses), "total expenses")
    }

    pub fn projected_months(&self) -> impl Iterator<Item = &MonthlyTotal> {
        self.monthly.iter().filter(|t| t.is_projected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trend::TrendDirection;
    use rust_decimal_macros::dec;

    fn total(month: u32, income: Decimal, expenses: Decimal) -> MonthlyTotal {
        let month = NaiveDate::from_ymd_opt(2024, month, 1).unwrap();
        MonthlyTotal {
            month,
            label: crate::utils::month_key(month),
            income,
            expenses,
            savings: income - expenses,
            currency: Currency::Thb,
            is_projected: false,
        }
    }

    #[test]
    fn test_config_defaults_from_json() {
        let config = DashboardConfig::from_json_str(r#"{"reference_date": "2024-01-20"}"#).unwrap();
        assert_eq!(config.base_currency, Currency::Thb);
        assert_eq!(config.display_currency, Currency::Thb);
        assert_eq!(config.window(), MonthWindow::default());
    }

    #[test]
    fn test_config_validation() {
        let rates = RateTable::new(Currency::Thb, [(Currency::Usd, dec!(0.03))]).unwrap();
        let reference = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();

        assert!(DashboardConfig::new(reference).validate(&rates).is_ok());
        assert!(matches!(
            DashboardConfig::new(reference).with_window(2, 13).validate(&rates),
            Err(DashboardError::InvalidWindow { .. })
        ));
        assert!(matches!(
            DashboardConfig::new(reference)
                .with_display_currency(Currency::Jpy)
                .validate(&rates),
            Err(DashboardError::UnsupportedCurrency(code)) if code == "JPY"
        ));
    }

    #[test]
    fn test_snapshot_trends_and_rate() {
        let previous = total(1, dec!(40000), dec!(30000));
        let current = total(2, dec!(40000), dec!(24000));

        let snapshot = MonthSnapshot::from_totals(&current, &previous);
        assert_eq!(snapshot.label, "Feb 2024");
        assert_eq!(snapshot.savings, dec!(16000));
        assert_eq!(snapshot.savings_rate, 40.0);
        assert_eq!(snapshot.expense_trend.magnitude, 20.0);
        assert!(snapshot.expense_trend.improving);
        assert_eq!(snapshot.savings_trend.magnitude, 60.0);
        assert_eq!(snapshot.savings_trend.direction, TrendDirection::Up);
        assert!(snapshot.savings_trend.improving);
    }

    #[test]
    fn test_snapshot_without_income() {
        let snapshot = MonthSnapshot::from_totals(&total(2, dec!(0), dec!(100)), &total(1, dec!(0), dec!(0)));
        assert_eq!(snapshot.savings_rate, 0.0);
        assert_eq!(snapshot.expense_trend.magnitude, 0.0);
    }

    #[test]
    fn test_snapshot_conversion_rounds() {
        let rates = RateTable::new(Currency::Thb, [(Currency::Usd, dec!(0.0287))]).unwrap();
        let snapshot = MonthSnapshot::from_totals(&total(2, dec!(1000), dec!(333)), &total(1, dec!(1000), dec!(500)));

        let usd = snapshot.converted(&rates, Currency::Usd).unwrap();
        assert_eq!(usd.income, dec!(28.70));
        assert_eq!(usd.expenses, dec!(9.56));
        assert_eq!(usd.savings, dec!(19.14));
        assert_eq!(usd.savings_rate, snapshot.savings_rate);
        assert_eq!(usd.expense_trend, snapshot.expense_trend);
    }
}

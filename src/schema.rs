use crate::error::DashboardError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[schemars(description = "Thai baht")]
    Thb,
    #[schemars(description = "US dollar")]
    Usd,
    #[schemars(description = "Euro")]
    Eur,
    #[schemars(description = "Pound sterling")]
    Gbp,
    #[schemars(description = "Japanese yen")]
    Jpy,
    #[schemars(description = "Singapore dollar")]
    Sgd,
    #[schemars(description = "Australian dollar")]
    Aud,
    #[schemars(description = "Chinese yuan")]
    Cny,
}

impl Currency {
    pub const ALL: [Currency; 8] = [
        Currency::Thb,
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Jpy,
        Currency::Sgd,
        Currency::Aud,
        Currency::Cny,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Thb => "THB",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Sgd => "SGD",
            Currency::Aud => "AUD",
            Currency::Cny => "CNY",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::Thb
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Currency::ALL
            .iter()
            .copied()
            .find(|c| c.code() == code)
            .ok_or_else(|| DashboardError::UnsupportedCurrency(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceInterval {
    #[schemars(description = "Repeats every day; occurrences are summed into the month they fall in")]
    Daily,
    #[schemars(description = "Repeats every 7 days; occurrences are summed into the month they fall in")]
    Weekly,
    #[schemars(description = "Repeats once per calendar month")]
    Monthly,
    #[schemars(description = "Repeats once per year in the anniversary month")]
    Yearly,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Expense {
    pub id: String,

    #[schemars(description = "Amount spent per occurrence, in `currency`")]
    pub amount: Decimal,

    pub currency: Currency,

    #[serde(default)]
    pub description: String,

    #[schemars(
        description = "Date of the expense. For recurring expenses this is the first occurrence."
    )]
    pub date: NaiveDate,

    #[serde(default)]
    #[schemars(description = "Reference to a Category id")]
    pub category_id: Option<String>,

    #[serde(default)]
    #[schemars(
        description = "Legacy free-text category label, used only when category_id does not resolve"
    )]
    pub category: Option<String>,

    #[serde(default)]
    pub is_recurring: bool,

    #[serde(default)]
    #[schemars(description = "Recurrence interval. Recurring expenses without one repeat monthly.")]
    pub recurring_interval: Option<RecurrenceInterval>,

    #[serde(default)]
    #[schemars(
        description = "Exclusive stop date. A stop date falling mid-month still counts that month in full."
    )]
    pub stop_date: Option<NaiveDate>,

    #[serde(default)]
    #[schemars(
        description = "Marks a synthetic projected copy rather than a stored record. Ignored by aggregation."
    )]
    pub is_projection: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct IncomeSource {
    pub id: String,

    #[serde(default)]
    pub description: String,

    pub amount: Decimal,

    pub currency: Currency,

    #[serde(default)]
    pub is_recurring: bool,

    #[serde(default)]
    pub recurring_interval: Option<RecurrenceInterval>,

    #[schemars(description = "First payment date. One-time income is received on this date.")]
    pub start_date: NaiveDate,

    #[serde(default)]
    #[schemars(description = "Exclusive end date, same month policy as expense stop dates")]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct Category {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub icon: Option<String>,

    #[serde(default)]
    #[schemars(description = "Hex color. When absent a stable palette color is derived from the id.")]
    pub color: Option<String>,

    #[serde(default)]
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct CategoryBudget {
    pub category_id: String,

    #[schemars(description = "Month key in 'MMM yyyy' format, e.g. 'Jan 2024'")]
    pub month: String,

    pub amount: Decimal,

    pub currency: Currency,
}

/// Everything the aggregation core reads, already fetched from storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FinanceSnapshot {
    #[serde(default)]
    pub expenses: Vec<Expense>,

    #[serde(default)]
    pub income_sources: Vec<IncomeSource>,

    #[serde(default)]
    pub categories: Vec<Category>,

    #[serde(default)]
    pub budgets: Vec<CategoryBudget>,
}

impl FinanceSnapshot {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(FinanceSnapshot)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_schema_generation() {
        let schema_json = FinanceSnapshot::schema_as_json().unwrap();
        assert!(schema_json.contains("expenses"));
        assert!(schema_json.contains("income_sources"));
        assert!(schema_json.contains("stop_date"));
    }

    #[test]
    fn test_currency_parsing() {
        assert_eq!("thb".parse::<Currency>().unwrap(), Currency::Thb);
        assert_eq!(" USD ".parse::<Currency>().unwrap(), Currency::Usd);
        assert!(matches!(
            "XYZ".parse::<Currency>(),
            Err(DashboardError::UnsupportedCurrency(code)) if code == "XYZ"
        ));
    }

    #[test]
    fn test_expense_deserialization_defaults() {
        let json = r#"{
            "id": "e1",
            "amount": 120.5,
            "currency": "THB",
            "date": "2024-01-15"
        }"#;

        let expense: Expense = serde_json::from_str(json).unwrap();
        assert_eq!(expense.amount, dec!(120.5));
        assert!(!expense.is_recurring);
        assert!(!expense.is_projection);
        assert_eq!(expense.category_id, None);
        assert_eq!(expense.stop_date, None);
    }

    #[test]
    fn test_unknown_currency_is_rejected() {
        let json = r#"{"id": "e1", "amount": 1, "currency": "XYZ", "date": "2024-01-15"}"#;
        assert!(serde_json::from_str::<Expense>(json).is_err());
    }
}

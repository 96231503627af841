use crate::categories::CategoryTotal;
use crate::dashboard::Dashboard;
use crate::error::{DashboardError, Result};
use crate::monthly::MonthlyTotal;
use crate::utils::{month_key, sum_amounts};
use log::debug;
use rust_decimal::Decimal;

fn savings_identity_holds(income: Decimal, expenses: Decimal, savings: Decimal) -> bool {
    income.checked_sub(expenses) == Some(savings)
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerificationResult {
    pub months_checked: usize,
    pub categories_checked: usize,
    pub percentage_total: f64,
}

/// Checks window length, strictly ascending months and the savings identity.
pub fn verify_monthly_totals(totals: &[MonthlyTotal], expected_len: usize) -> Result<()> {
    if totals.len() != expected_len {
        return Err(DashboardError::IntegrityViolation {
            month: "window".to_string(),
            details: format!("expected {} months, got {}", expected_len, totals.len()),
        });
    }

    for pair in totals.windows(2) {
        if pair[0].month >= pair[1].month {
            return Err(DashboardError::IntegrityViolation {
                month: month_key(pair[1].month),
                details: format!("not after {}", month_key(pair[0].month)),
            });
        }
    }

    for total in totals {
        if !savings_identity_holds(total.income, total.expenses, total.savings) {
            return Err(DashboardError::IntegrityViolation {
                month: total.label.clone(),
                details: format!(
                    "savings {} != income {} - expenses {}",
                    total.savings, total.income, total.expenses
                ),
            });
        }
    }

    Ok(())
}

/// Percentages must sum to 100 (within `tolerance`) when anything was spent,
/// and must all be zero otherwise. Returns the percentage sum.
pub fn verify_category_percentages(categories: &[CategoryTotal], tolerance: f64) -> Result<f64> {
    if categories.is_empty() {
        return Ok(0.0);
    }

    let amount_total = sum_amounts(categories.iter().map(|c| c.amount), "category amounts")?;
    let percentage_total: f64 = categories.iter().map(|c| c.percentage).sum();

    if amount_total > Decimal::ZERO {
        if (percentage_total - 100.0).abs() > tolerance {
            return Err(DashboardError::IntegrityViolation {
                month: "categories".to_string(),
                details: format!("percentages sum to {:.6}, expected 100", percentage_total),
            });
        }
    } else if let Some(category) = categories.iter().find(|c| c.percentage != 0.0) {
        return Err(DashboardError::IntegrityViolation {
            month: "categories".to_string(),
            details: format!(
                "{} has {:.6}% of a zero total",
                category.name, category.percentage
            ),
        });
    }

    Ok(percentage_total)
}

pub fn verify_dashboard(
    dashboard: &Dashboard,
    expected_len: usize,
    tolerance: f64,
) -> Result<VerificationResult> {
    verify_monthly_totals(&dashboard.monthly, expected_len)?;
    let percentage_total = verify_category_percentages(&dashboard.categories, tolerance)?;

    let snapshot = &dashboard.current_month;
    if !savings_identity_holds(snapshot.income, snapshot.expenses, snapshot.savings) {
        return Err(DashboardError::IntegrityViolation {
            month: snapshot.label.clone(),
            details: "current month savings do not match income - expenses".to_string(),
        });
    }

    debug!(
        "Verified {} months and {} categories",
        dashboard.monthly.len(),
        dashboard.categories.len()
    );

    Ok(VerificationResult {
        months_checked: dashboard.monthly.len(),
        categories_checked: dashboard.categories.len(),
        percentage_total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::aggregate_by_category;
    use crate::currency::RateTable;
    use crate::dashboard::MonthSnapshot;
    use crate::schema::{Category, Currency, Expense};
    use crate::utils::MonthRange;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn category_totals(amounts: &[Decimal]) -> Vec<CategoryTotal> {
        let categories: Vec<Category> = (0..amounts.len())
            .map(|i| Category {
                id: format!("c{}", i),
                name: format!("Category {}", i),
                icon: None,
                color: None,
                display_order: None,
            })
            .collect();
        let expenses: Vec<Expense> = amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| Expense {
                id: format!("e{}", i),
                amount: *amount,
                currency: Currency::Thb,
                description: String::new(),
                date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                category_id: Some(format!("c{}", i)),
                category: None,
                is_recurring: false,
                recurring_interval: None,
                stop_date: None,
                is_projection: false,
            })
            .collect();

        aggregate_by_category(
            &expenses,
            &categories,
            &[],
            &MonthRange::single(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            &RateTable::fixed(),
            Currency::Thb,
        )
        .unwrap()
    }

    fn dashboard(categories: Vec<CategoryTotal>) -> Dashboard {
        let previous = total(1, dec!(100), dec!(50));
        let current = total(2, dec!(100), dec!(80));
        Dashboard {
            reference_month: current.month,
            currency: Currency::Thb,
            current_month: MonthSnapshot::from_totals(&current, &previous),
            monthly: vec![previous, current],
            categories,
            projected_expenses: Vec::new(),
        }
    }

    fn total(month: u32, income: Decimal, expenses: Decimal) -> MonthlyTotal {
        let month = NaiveDate::from_ymd_opt(2024, month, 1).unwrap();
        MonthlyTotal {
            month,
            label: month_key(month),
            income,
            expenses,
            savings: income - expenses,
            currency: Currency::Thb,
            is_projected: false,
        }
    }

    #[test]
    fn test_valid_totals_pass() {
        let totals = vec![total(1, dec!(10), dec!(5)), total(2, dec!(10), dec!(20))];
        assert!(verify_monthly_totals(&totals, 2).is_ok());
    }

    #[test]
    fn test_wrong_length_fails() {
        let totals = vec![total(1, dec!(10), dec!(5))];
        assert!(matches!(
            verify_monthly_totals(&totals, 3),
            Err(DashboardError::IntegrityViolation { month, .. }) if month == "window"
        ));
    }

    #[test]
    fn test_out_of_order_fails() {
        let totals = vec![total(3, dec!(10), dec!(5)), total(2, dec!(10), dec!(5))];
        assert!(verify_monthly_totals(&totals, 2).is_err());
    }

    #[test]
    fn test_category_percentages_pass() {
        let categories = category_totals(&[dec!(30), dec!(70)]);
        let sum = verify_category_percentages(&categories, 1e-9).unwrap();
        assert!((sum - 100.0).abs() < 1e-9);
        assert_eq!(verify_category_percentages(&[], 1e-9).unwrap(), 0.0);
    }

    #[test]
    fn test_percentages_not_summing_to_hundred_fail() {
        let mut categories = category_totals(&[dec!(30), dec!(70)]);
        categories[0].percentage = 20.0;

        let err = verify_category_percentages(&categories, 1e-6).unwrap_err();
        assert!(matches!(err, DashboardError::IntegrityViolation { month, .. } if month == "categories"));
    }

    #[test]
    fn test_nonzero_percentage_of_zero_total_fails() {
        let mut categories = category_totals(&[dec!(0), dec!(0)]);
        assert!(verify_category_percentages(&categories, 1e-6).is_ok());

        categories[1].percentage = 50.0;
        let err = verify_category_percentages(&categories, 1e-6).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::IntegrityViolation { details, .. } if details.contains("zero total")
        ));
    }

    #[test]
    fn test_dashboard_checks_current_month_identity() {
        let valid = dashboard(category_totals(&[dec!(80)]));
        let result = verify_dashboard(&valid, 2, 1e-9).unwrap();
        assert_eq!(result.months_checked, 2);
        assert_eq!(result.categories_checked, 1);

        let mut broken = valid.clone();
        broken.current_month.savings = dec!(21);
        let err = verify_dashboard(&broken, 2, 1e-9).unwrap_err();
        assert!(matches!(err, DashboardError::IntegrityViolation { month, .. } if month == "Feb 2024"));
    }

    #[test]
    fn test_overflowing_identity_is_a_violation() {
        let mut broken = total(1, Decimal::MAX, dec!(0));
        broken.expenses = Decimal::MIN;
        broken.savings = Decimal::MAX;
        assert!(matches!(
            verify_monthly_totals(&[broken], 1),
            Err(DashboardError::IntegrityViolation { .. })
        ));
    }

    #[test]
    fn test_broken_savings_identity_fails() {
        let mut broken = total(1, dec!(10), dec!(5));
        broken.savings = dec!(6);
        let err = verify_monthly_totals(&[broken], 1).unwrap_err();
        assert!(matches!(err, DashboardError::IntegrityViolation { month, .. } if month == "Jan 2024"));
    }
}

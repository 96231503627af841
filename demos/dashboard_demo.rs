use chrono::NaiveDate;
use finance_dashboard_core::*;
use rust_decimal_macros::dec;

fn main() {
    let snapshot = FinanceSnapshot {
        expenses: vec![
            // Rent on the 1st, every month
            Expense {
                id: "rent".to_string(),
                amount: dec!(15000),
                currency: Currency::Thb,
                description: "Condo rent".to_string(),
                date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
                category_id: Some("housing".to_string()),
                category: None,
                is_recurring: true,
                recurring_interval: Some(RecurrenceInterval::Monthly),
                stop_date: None,
                is_projection: false,
            },
            // Streaming subscription billed in USD, cancelled mid-March
            Expense {
                id: "streaming".to_string(),
                amount: dec!(15.99),
                currency: Currency::Usd,
                description: "Streaming".to_string(),
                date: NaiveDate::from_ymd_opt(2023, 11, 20).unwrap(),
                category_id: Some("fun".to_string()),
                category: None,
                is_recurring: true,
                recurring_interval: Some(RecurrenceInterval::Monthly),
                stop_date: Some(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()),
                is_projection: false,
            },
            // Old record with only a free-text category
            Expense {
                id: "market".to_string(),
                amount: dec!(2350),
                currency: Currency::Thb,
                description: "Weekend market".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, 13).unwrap(),
                category_id: None,
                category: Some("Groceries".to_string()),
                is_recurring: false,
                recurring_interval: None,
                stop_date: None,
                is_projection: false,
            },
            Expense {
                id: "dinner".to_string(),
                amount: dec!(1800),
                currency: Currency::Thb,
                description: "Dinner out".to_string(),
                date: NaiveDate::from_ymd_opt(2023, 12, 22).unwrap(),
                category_id: Some("fun".to_string()),
                category: None,
                is_recurring: false,
                recurring_interval: None,
                stop_date: None,
                is_projection: false,
            },
        ],
        income_sources: vec![IncomeSource {
            id: "salary".to_string(),
            description: "Salary".to_string(),
            amount: dec!(55000),
            currency: Currency::Thb,
            is_recurring: true,
            recurring_interval: Some(RecurrenceInterval::Monthly),
            start_date: NaiveDate::from_ymd_opt(2022, 1, 25).unwrap(),
            end_date: None,
        }],
        categories: vec![
            Category {
                id: "housing".to_string(),
                name: "Housing".to_string(),
                icon: Some("home".to_string()),
                color: None,
                display_order: Some(1),
            },
            Category {
                id: "fun".to_string(),
                name: "Entertainment".to_string(),
                icon: Some("film".to_string()),
                color: Some("#8E44AD".to_string()),
                display_order: Some(2),
            },
        ],
        budgets: vec![CategoryBudget {
            category_id: "fun".to_string(),
            month: "Jan 2024".to_string(),
            amount: dec!(500),
            currency: Currency::Thb,
        }],
    };

    let rates = RateTable::fixed();
    let config = DashboardConfig::new(NaiveDate::from_ymd_opt(2024, 1, 20).unwrap())
        .with_window(2, 3)
        .with_display_currency(Currency::Usd);

    println!("📋 Configuration:");
    println!("  Reference month: {}", month_key(utils::month_start(config.reference_date)));
    println!("  Window: {} back, {} forward", config.months_back, config.months_forward);
    println!(
        "  Aggregating in {}, displaying in {}",
        config.base_currency, config.display_currency
    );
    println!("\n🔄 Expected behavior:");
    println!("  Streaming stops on 10 Mar 2024, so March is still charged in full");
    println!("  The weekend market lands in a 'Groceries' bucket from its legacy label");
    println!("  Projected months only carry recurring expenses\n");

    match process_with_verification(&snapshot, &config, &rates, 1e-6) {
        Ok(dashboard) => {
            println!("✅ Monthly totals ({}):\n", dashboard.currency);
            for month in &dashboard.monthly {
                println!(
                    "  {}{:<9} income {:>10}  expenses {:>10}  savings {:>10}",
                    if month.is_projected { "~" } else { " " },
                    month.label,
                    month.income,
                    month.expenses,
                    month.savings
                );
            }

            println!("\n📊 Categories for {}:", dashboard.current_month.label);
            for category in &dashboard.categories {
                let budget = match category.budget {
                    Some(budget) if category.is_over_budget() => format!(" (over budget {})", budget),
                    Some(budget) => format!(" (budget {})", budget),
                    None => String::new(),
                };
                println!(
                    "  {} {:<14} {:>10} {:>6.2}%{}",
                    category.color, category.name, category.amount, category.percentage, budget
                );
            }

            let snapshot = &dashboard.current_month;
            println!("\n📈 Trends vs previous month:");
            println!(
                "  Expenses: {:?} {:.1}% (improving: {})",
                snapshot.expense_trend.direction,
                snapshot.expense_trend.magnitude,
                snapshot.expense_trend.improving
            );
            println!(
                "  Savings:  {:?} {:.1}% (improving: {})",
                snapshot.savings_trend.direction,
                snapshot.savings_trend.magnitude,
                snapshot.savings_trend.improving
            );
            println!("  Savings rate: {:.1}%", snapshot.savings_rate);

            println!("\n🔮 Projected expenses: {}", dashboard.projected_expenses.len());
            for expense in &dashboard.projected_expenses {
                println!("  {} {} {}", expense.date, expense.amount, expense.currency);
            }
        }
        Err(e) => {
            eprintln!("❌ Error: {}", e);
        }
    }
}

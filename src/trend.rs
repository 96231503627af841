//! Period-over-period trends.
//!
//! Expenses and savings read in opposite directions: less spending is an
//! improvement, more savings is an improvement. They are kept as two
//! separate computations.

use crate::utils::{percentage, to_f64};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    /// |current - previous| / |previous| * 100, or 0 when previous is zero.
    pub magnitude: f64,
    pub direction: TrendDirection,
    pub improving: bool,
}

fn change(current: Decimal, previous: Decimal) -> (f64, TrendDirection) {
    let direction = match current.cmp(&previous) {
        std::cmp::Ordering::Greater => TrendDirection::Up,
        std::cmp::Ordering::Less => TrendDirection::Down,
        std::cmp::Ordering::Equal => TrendDirection::Flat,
    };

    if previous.is_zero() {
        return (0.0, direction);
    }

    let magnitude = match current.checked_sub(previous) {
        Some(delta) => percentage(delta.abs(), previous.abs()),
        None => (to_f64(current) - to_f64(previous)).abs() / to_f64(previous).abs() * 100.0,
    };

    (magnitude, direction)
}

/// Spending trend: a decrease is improving.
pub fn expense_trend(current: Decimal, previous: Decimal) -> Trend {
    let (magnitude, direction) = change(current, previous);
    Trend {
        magnitude,
        direction,
        improving: direction == TrendDirection::Down,
    }
}

/// Savings trend: an increase is improving.
pub fn savings_trend(current: Decimal, previous: Decimal) -> Trend {
    let (magnitude, direction) = change(current, previous);
    Trend {
        magnitude,
        direction,
        improving: direction == TrendDirection::Up,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_zero_previous_has_zero_magnitude() {
        for current in [dec!(0), dec!(1), dec!(-250.5), dec!(1000000)] {
            assert_eq!(expense_trend(current, Decimal::ZERO).magnitude, 0.0);
            assert_eq!(savings_trend(current, Decimal::ZERO).magnitude, 0.0);
        }
    }

    #[test]
    fn test_expense_decrease_is_improving() {
        let trend = expense_trend(dec!(800), dec!(1000));
        assert_eq!(trend.magnitude, 20.0);
        assert_eq!(trend.direction, TrendDirection::Down);
        assert!(trend.improving);

        let worse = expense_trend(dec!(1500), dec!(1000));
        assert_eq!(worse.magnitude, 50.0);
        assert!(!worse.improving);
    }

    #[test]
    fn test_savings_increase_is_improving() {
        let trend = savings_trend(dec!(1200), dec!(1000));
        assert_eq!(trend.magnitude, 20.0);
        assert_eq!(trend.direction, TrendDirection::Up);
        assert!(trend.improving);

        assert!(!savings_trend(dec!(900), dec!(1000)).improving);
    }

    #[test]
    fn test_conventions_are_opposite() {
        let (current, previous) = (dec!(700), dec!(1000));
        assert_ne!(
            expense_trend(current, previous).improving,
            savings_trend(current, previous).improving
        );
    }

    #[test]
    fn test_negative_previous_savings() {
        // From -1000 to -500: savings went up by half of the previous deficit.
        let trend = savings_trend(dec!(-500), dec!(-1000));
        assert_eq!(trend.magnitude, 50.0);
        assert!(trend.improving);
    }

    #[test]
    fn test_extreme_values_do_not_overflow() {
        let trend = expense_trend(Decimal::MAX, Decimal::MIN);
        assert!(trend.magnitude.is_finite());
        assert!((trend.magnitude - 200.0).abs() < 1e-9);
        assert_eq!(trend.direction, TrendDirection::Up);

        let tiny = savings_trend(Decimal::MAX, dec!(0.0000001));
        assert!(tiny.magnitude.is_finite() && tiny.magnitude > 1e30);
        assert!(tiny.improving);
    }

    #[test]
    fn test_flat_is_not_improving() {
        let trend = expense_trend(dec!(10), dec!(10));
        assert_eq!(trend.direction, TrendDirection::Flat);
        assert_eq!(trend.magnitude, 0.0);
        assert!(!trend.improving);
        assert!(!savings_trend(dec!(10), dec!(10)).improving);
    }
}

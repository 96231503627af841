//! Currency conversion over a single, immutable rate table.
//!
//! Rates are quoted as units of a currency per one unit of the table's base
//! currency. A table is built once before a computation pass and shared by
//! reference, so every conversion in the pass sees the same rates.

use crate::error::{DashboardError, Result};
use crate::schema::Currency;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    base: Currency,
    rates: BTreeMap<Currency, Decimal>,
}

impl RateTable {
    pub fn new(
        base: Currency,
        rates: impl IntoIterator<Item = (Currency, Decimal)>,
    ) -> Result<Self> {
        let mut table = BTreeMap::new();
        table.insert(base, Decimal::ONE);

        for (currency, rate) in rates {
            if rate <= Decimal::ZERO {
                return Err(DashboardError::InvalidRate {
                    currency: currency.to_string(),
                    rate: rate.to_string(),
                });
            }
            if currency == base && rate != Decimal::ONE {
                return Err(DashboardError::InvalidRate {
                    currency: currency.to_string(),
                    rate: rate.to_string(),
                });
            }
            table.insert(currency, rate);
        }

        debug!("Built rate table with base {} and {} currencies", base, table.len());

        Ok(Self { base, rates: table })
    }

    /// Built-in THB-based table for offline use.
    pub fn fixed() -> Self {
        let rates = [
            (Currency::Thb, Decimal::ONE),
            (Currency::Usd, Decimal::new(28, 3)),
            (Currency::Eur, Decimal::new(26, 3)),
            (Currency::Gbp, Decimal::new(22, 3)),
            (Currency::Jpy, Decimal::new(425, 2)),
            (Currency::Sgd, Decimal::new(38, 3)),
            (Currency::Aud, Decimal::new(43, 3)),
            (Currency::Cny, Decimal::new(20, 2)),
        ];

        Self {
            base: Currency::Thb,
            rates: rates.into_iter().collect(),
        }
    }

    pub fn base(&self) -> Currency {
        self.base
    }

    pub fn supports(&self, currency: Currency) -> bool {
        self.rates.contains_key(&currency)
    }

    pub fn currencies(&self) -> impl Iterator<Item = Currency> + '_ {
        self.rates.keys().copied()
    }

    pub fn rate(&self, currency: Currency) -> Result<Decimal> {
        self.rates
            .get(&currency)
            .copied()
            .ok_or_else(|| DashboardError::UnsupportedCurrency(currency.to_string()))
    }

    pub fn convert(&self, amount: Decimal, from: Currency, to: Currency) -> Result<Decimal> {
        if from == to {
            return Ok(amount);
        }

        let from_rate = self.rate(from)?;
        let to_rate = self.rate(to)?;

        amount
            .checked_div(from_rate)
            .and_then(|in_base| in_base.checked_mul(to_rate))
            .ok_or_else(|| DashboardError::ValidationError {
                record: format!("{} {}", amount, from),
                details: format!("conversion to {} overflowed", to),
            })
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::fixed()
    }
}

pub fn convert(amount: Decimal, from: Currency, to: Currency, rates: &RateTable) -> Result<Decimal> {
    rates.convert(amount, from, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn usd_table() -> RateTable {
        RateTable::new(
            Currency::Usd,
            [(Currency::Thb, dec!(35)), (Currency::Eur, dec!(0.9))],
        )
        .unwrap()
    }

    #[test]
    fn test_identity_conversion() {
        let table = usd_table();
        assert_eq!(
            table.convert(dec!(12.34), Currency::Thb, Currency::Thb).unwrap(),
            dec!(12.34)
        );
        // Identity holds even for currencies the table does not know.
        assert_eq!(
            table.convert(dec!(5), Currency::Jpy, Currency::Jpy).unwrap(),
            dec!(5)
        );
    }

    #[test]
    fn test_cross_conversion_through_base() {
        let table = usd_table();
        assert_eq!(
            table.convert(dec!(70), Currency::Thb, Currency::Usd).unwrap(),
            dec!(2)
        );
        assert_eq!(
            table.convert(dec!(350), Currency::Thb, Currency::Eur).unwrap(),
            dec!(9)
        );
        assert_eq!(
            convert(dec!(10), Currency::Usd, Currency::Thb, &table).unwrap(),
            dec!(350)
        );
    }

    #[test]
    fn test_unknown_currency_fails() {
        let table = usd_table();
        let err = table
            .convert(dec!(1), Currency::Gbp, Currency::Usd)
            .unwrap_err();
        assert!(matches!(err, DashboardError::UnsupportedCurrency(code) if code == "GBP"));
    }

    #[test]
    fn test_invalid_rates_rejected() {
        assert!(matches!(
            RateTable::new(Currency::Usd, [(Currency::Thb, dec!(0))]),
            Err(DashboardError::InvalidRate { .. })
        ));
        assert!(matches!(
            RateTable::new(Currency::Usd, [(Currency::Usd, dec!(2))]),
            Err(DashboardError::InvalidRate { .. })
        ));
    }

    #[test]
    fn test_fixed_table_supports_every_currency() {
        let table = RateTable::fixed();
        assert_eq!(table.base(), Currency::Thb);
        for currency in Currency::ALL {
            assert!(table.supports(currency), "missing {}", currency);
        }
    }
}

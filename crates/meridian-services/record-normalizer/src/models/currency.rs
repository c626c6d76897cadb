use meridian_error::MeridianError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Conversion table from record currencies into a single reporting
/// currency. Supplied by the caller per batch; a missing rate is an
/// `UnknownCurrency` failure for that record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyTable {
    pub reporting_currency: String,
    /// Multiplicative rate: amount_in_reporting = amount * rate
    rates: HashMap<String, Decimal>,
}

impl CurrencyTable {
    /// Create a table with the given reporting currency.
    ///
    /// The reporting currency itself always converts at rate 1.
    pub fn new(reporting_currency: impl Into<String>) -> Self {
        let reporting_currency = reporting_currency.into();
        let mut rates = HashMap::new();
        rates.insert(reporting_currency.clone(), Decimal::ONE);
        Self {
            reporting_currency,
            rates,
        }
    }

    /// Register a conversion rate into the reporting currency
    pub fn with_rate(mut self, currency: impl Into<String>, rate: Decimal) -> Self {
        self.rates.insert(currency.into(), rate);
        self
    }

    /// Convert an amount into the reporting currency
    pub fn convert(&self, amount: Decimal, currency: &str) -> crate::error::Result<Decimal> {
        let rate = self
            .rates
            .get(currency)
            .ok_or_else(|| MeridianError::unknown_currency(currency))?;
        Ok(amount * rate)
    }
}

//! Currency conversion against a static rate table
//!
//! Every rate is expressed relative to a single base currency (PKR = 1), so a
//! conversion goes `amount / rate(from) * rate(to)`. The table is built once,
//! never mutated, and passed explicitly to every call.
//!
//! Codes missing from the table are not errors: they convert at rate 1 as if
//! they were the base currency. Each such lookup is logged under the
//! `finboard::currency` target and flagged on the [`ConversionResult`].

use finboard_config::CurrencyConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult};

/// Base currency of the built-in table
pub const BASE_CURRENCY: &str = finboard_config::BASE_CURRENCY;

/// Source currency assumed for records whose owner has no currency set
pub const DEFAULT_CURRENCY: &str = "PKR";

/// Round to cents with ties going toward positive infinity
pub fn round_to_cents(value: f64) -> f64 {
    round_half_up(value * 100.0) / 100.0
}

/// `Math.round`-style rounding: ties go toward positive infinity
pub fn round_half_up(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let floor = value.floor();
    if value - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

/// Exchange rates keyed by currency code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRateTable {
    base: String,
    rates: BTreeMap<String, f64>,
}

impl Default for ExchangeRateTable {
    /// The rates shipped in the default configuration
    fn default() -> Self {
        Self::from_config(&CurrencyConfig::default())
    }
}

impl ExchangeRateTable {
    /// Build a table from `(code, rate)` pairs
    pub fn new<I, S>(base: &str, rates: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            base: base.to_string(),
            rates: rates.into_iter().map(|(code, rate)| (code.into(), rate)).collect(),
        }
    }

    /// Build the table from validated configuration
    pub fn from_config(config: &CurrencyConfig) -> Self {
        Self {
            base: config.base_currency.clone(),
            rates: config.rates.clone(),
        }
    }

    pub fn base_currency(&self) -> &str {
        &self.base
    }

    /// Configured rate for a code
    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rates.contains_key(code)
    }

    /// Codes with a configured rate, sorted
    pub fn currencies(&self) -> impl Iterator<Item = &str> {
        self.rates.keys().map(String::as_str)
    }

    /// Strict lookup for callers that must not guess
    pub fn require_rate(&self, code: &str) -> CoreResult<f64> {
        self.rate(code).ok_or_else(|| CoreError::UnknownCurrencyCode {
            code: code.to_string(),
        })
    }

    /// Rate lookup with the silent fallback to 1.
    ///
    /// Returns the rate and whether the fallback was taken.
    fn rate_or_base(&self, code: &str) -> (f64, bool) {
        match self.rate(code) {
            Some(rate) => (rate, false),
            None => {
                log::warn!(
                    target: "finboard::currency",
                    "No exchange rate for '{}', treating it as {} (rate 1)",
                    code,
                    self.base
                );
                (1.0, true)
            }
        }
    }

    fn convert_inner(&self, amount: f64, from: &str, to: &str) -> (f64, bool) {
        if amount == 0.0 || amount.is_nan() {
            return (0.0, false);
        }
        if from == to {
            return (amount, false);
        }

        let (from_rate, from_fallback) = self.rate_or_base(from);
        let (to_rate, to_fallback) = self.rate_or_base(to);

        let base = amount / from_rate;
        (round_to_cents(base * to_rate), from_fallback || to_fallback)
    }

    /// Convert `amount` from one currency to another.
    ///
    /// Zero and NaN convert to 0. Identical codes return the amount untouched;
    /// every other conversion is rounded to cents.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> f64 {
        self.convert_inner(amount, from, to).0
    }

    /// Like [`convert`](Self::convert) but rejects non-finite amounts
    pub fn try_convert(&self, amount: f64, from: &str, to: &str) -> CoreResult<f64> {
        if !amount.is_finite() {
            return Err(CoreError::InvalidAmount {
                value: amount.to_string(),
            });
        }
        Ok(self.convert(amount, from, to))
    }

    /// Convert and keep both sides of the conversion for display
    pub fn convert_for_display(&self, amount: f64, from: &str, target: &str) -> ConversionResult {
        if from == target {
            return ConversionResult {
                original_amount: amount,
                original_currency: from.to_string(),
                converted_amount: amount,
                target_currency: target.to_string(),
                label: from.to_string(),
                rate_fallback: false,
            };
        }

        let (converted, rate_fallback) = self.convert_inner(amount, from, target);
        ConversionResult {
            original_amount: amount,
            original_currency: from.to_string(),
            converted_amount: converted,
            target_currency: target.to_string(),
            label: format!("{} → {}", from, target),
            rate_fallback,
        }
    }
}

/// Outcome of a single display conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub original_amount: f64,
    pub original_currency: String,
    pub converted_amount: f64,
    pub target_currency: String,
    /// `"USD → PKR"`, or just the code when nothing was converted
    pub label: String,
    /// A code was missing from the table and rate 1 was used
    pub rate_fallback: bool,
}

impl ConversionResult {
    pub fn is_converted(&self) -> bool {
        self.original_currency != self.target_currency
    }
}

/// Coerce a JSON amount the way the data service hands them out.
///
/// Numbers pass through, numeric strings are parsed, and null means 0.
/// Anything else is an [`CoreError::InvalidAmount`].
pub fn parse_amount(value: &serde_json::Value) -> CoreResult<f64> {
    use serde_json::Value;

    let invalid = || CoreError::InvalidAmount {
        value: value.to_string(),
    };

    match value {
        Value::Null => Ok(0.0),
        Value::Number(n) => n.as_f64().ok_or_else(invalid),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(0.0);
            }
            match trimmed.parse::<f64>() {
                Ok(parsed) if parsed.is_finite() => Ok(parsed),
                _ => Err(invalid()),
            }
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> ExchangeRateTable {
        ExchangeRateTable::default()
    }

    #[test]
    fn test_pkr_to_usd() {
        assert_eq!(table().convert(1000.0, "PKR", "USD"), 3.6);
    }

    #[test]
    fn test_usd_to_pkr_rounds_to_cents() {
        assert_eq!(table().convert(100.0, "USD", "PKR"), 27777.78);
        assert_eq!(table().convert(200.0, "USD", "PKR"), 55555.56);
    }

    #[test]
    fn test_identity_skips_rounding() {
        let t = table();
        for code in ["PKR", "USD", "EUR", "GBP", "JPY", "XYZ"] {
            assert_eq!(t.convert(123.456789, code, code), 123.456789);
        }
    }

    #[test]
    fn test_zero_and_nan_convert_to_zero() {
        let t = table();
        assert_eq!(t.convert(0.0, "USD", "EUR"), 0.0);
        assert_eq!(t.convert(f64::NAN, "USD", "EUR"), 0.0);
        assert_eq!(t.convert(0.0, "USD", "USD"), 0.0);
    }

    #[test]
    fn test_negative_amounts_convert() {
        assert_eq!(table().convert(-1000.0, "PKR", "USD"), -3.6);
    }

    #[test]
    fn test_cross_rate_through_base() {
        // 100 EUR -> 30303.03... PKR -> 84.848... GBP
        assert_eq!(table().convert(100.0, "EUR", "GBP"), 84.85);
    }

    #[test]
    fn test_general_path_has_two_decimals() {
        let t = table();
        for amount in [1.0, 7.77, 1234.5678, 99999.999, -42.4242] {
            for (from, to) in [("PKR", "USD"), ("USD", "JPY"), ("GBP", "EUR")] {
                let converted = t.convert(amount, from, to);
                let cents = converted * 100.0;
                assert!((cents - cents.round()).abs() < 1e-6, "{} {}->{}", amount, from, to);
            }
        }
    }

    #[test]
    fn test_round_trip_within_a_cent() {
        let t = table();
        for amount in [100.0, 250.0, 1999.99, 50000.0] {
            let there = t.convert(amount, "EUR", "GBP");
            let back = t.convert(there, "GBP", "EUR");
            assert!((back - amount).abs() <= 0.01 + 1e-9, "{} -> {} -> {}", amount, there, back);
        }
    }

    #[test]
    fn test_unknown_currency_falls_back_to_rate_one() {
        let t = table();
        assert_eq!(t.convert(500.0, "CHF", "PKR"), 500.0);
        assert_eq!(t.convert(1000.0, "CHF", "USD"), 3.6);

        let result = t.convert_for_display(1000.0, "CHF", "USD");
        assert!(result.rate_fallback);
        assert_eq!(result.converted_amount, 3.6);
    }

    #[test]
    fn test_require_rate() {
        let t = table();
        assert_eq!(t.require_rate("USD").unwrap(), 0.0036);
        assert!(matches!(
            t.require_rate("CHF"),
            Err(CoreError::UnknownCurrencyCode { .. })
        ));
    }

    #[test]
    fn test_try_convert_rejects_non_finite() {
        let t = table();
        assert!(t.try_convert(f64::INFINITY, "USD", "PKR").is_err());
        assert!(t.try_convert(f64::NAN, "USD", "PKR").is_err());
        assert_eq!(t.try_convert(1000.0, "PKR", "USD").unwrap(), 3.6);
    }

    #[test]
    fn test_convert_for_display_same_currency() {
        let result = table().convert_for_display(10.005, "USD", "USD");
        assert_eq!(result.converted_amount, 10.005);
        assert_eq!(result.original_amount, 10.005);
        assert_eq!(result.label, "USD");
        assert!(!result.is_converted());
        assert!(!result.rate_fallback);
    }

    #[test]
    fn test_convert_for_display_label() {
        let result = table().convert_for_display(100.0, "USD", "PKR");
        assert_eq!(result.label, "USD → PKR");
        assert_eq!(result.original_amount, 100.0);
        assert_eq!(result.converted_amount, 27777.78);
        assert!(result.is_converted());
    }

    #[test]
    fn test_round_half_up_matches_math_round() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-2.6), -3.0);
        assert_eq!(round_half_up(0.49999999999999994), 0.0);
    }

    #[test]
    fn test_from_config() {
        let config = CurrencyConfig::default();
        let t = ExchangeRateTable::from_config(&config);
        assert_eq!(t.base_currency(), "PKR");
        assert_eq!(t.currencies().collect::<Vec<_>>(), vec!["EUR", "GBP", "JPY", "PKR", "USD"]);
        assert_eq!(t.rate("USD"), Some(0.0036));
        assert_eq!(t.rate("JPY"), Some(0.54));
        assert_eq!(ExchangeRateTable::default(), t);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(&json!(12.5)).unwrap(), 12.5);
        assert_eq!(parse_amount(&json!(7)).unwrap(), 7.0);
        assert_eq!(parse_amount(&json!("  42.10 ")).unwrap(), 42.1);
        assert_eq!(parse_amount(&json!(null)).unwrap(), 0.0);
        assert_eq!(parse_amount(&json!("")).unwrap(), 0.0);
        assert!(parse_amount(&json!("abc")).is_err());
        assert!(parse_amount(&json!("NaN")).is_err());
        assert!(parse_amount(&json!(true)).is_err());
        assert!(parse_amount(&json!([1])).is_err());
    }
}

//! Aggregation of converted amounts across record collections

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::currency::{round_half_up, ExchangeRateTable, DEFAULT_CURRENCY};
use crate::error::{CoreError, CoreResult};

/// Converted subtotal per source currency
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyBreakdown(BTreeMap<String, f64>);

impl CurrencyBreakdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a converted amount under its source currency
    pub fn add(&mut self, source_currency: &str, converted: f64) {
        *self.0.entry(source_currency.to_string()).or_insert(0.0) += converted;
    }

    pub fn get(&self, source_currency: &str) -> Option<f64> {
        self.0.get(source_currency).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(code, amount)| (code.as_str(), *amount))
    }

    pub fn currencies(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn sum(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Converted total plus where it came from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub total: f64,
    pub target_currency: String,
    pub breakdown: CurrencyBreakdown,
    /// Records that went through the rate-1 fallback
    pub fallback_count: usize,
    /// Records skipped because their amount was NaN or infinite
    pub invalid_count: usize,
}

impl Aggregate {
    pub fn empty(target_currency: &str) -> Self {
        Self {
            target_currency: target_currency.to_string(),
            ..Self::default()
        }
    }
}

/// Convert every record into `target` and sum the results.
///
/// Records are visited once, in order. `currency_of` returning `None` means
/// the owner's currency is unknown and [`DEFAULT_CURRENCY`] is assumed. A
/// record contributing exactly zero leaves no key in the breakdown. Records
/// with a non-finite amount are logged, counted in `invalid_count` and
/// skipped, so the total stays finite.
pub fn aggregate<'a, 's, T, A, C>(
    rates: &ExchangeRateTable,
    records: impl IntoIterator<Item = &'a T>,
    amount_of: A,
    currency_of: C,
    target: &str,
) -> Aggregate
where
    T: 'a,
    A: Fn(&'a T) -> f64,
    C: Fn(&'a T) -> Option<&'s str>,
{
    let mut result = Aggregate::empty(target);

    for record in records {
        let source = currency_of(record).unwrap_or(DEFAULT_CURRENCY);
        let amount = amount_of(record);
        if !amount.is_finite() {
            let err = CoreError::InvalidAmount {
                value: amount.to_string(),
            };
            log::warn!(target: "finboard::currency", "Skipping {} record: {}", source, err);
            result.invalid_count += 1;
            continue;
        }

        let conversion = rates.convert_for_display(amount, source, target);

        if conversion.rate_fallback {
            result.fallback_count += 1;
        }
        if conversion.converted_amount == 0.0 {
            continue;
        }

        result.total += conversion.converted_amount;
        result.breakdown.add(source, conversion.converted_amount);
    }

    result
}

/// `part` as a whole-number percentage of `whole`, capped at 100.
///
/// Fails with [`CoreError::DivisionByZero`] when `whole` is not positive.
pub fn try_percentage(part: f64, whole: f64) -> CoreResult<f64> {
    if !whole.is_finite() || whole <= 0.0 || !part.is_finite() {
        return Err(CoreError::DivisionByZero { part });
    }
    Ok(round_half_up(part / whole * 100.0).min(100.0))
}

/// [`try_percentage`] with 0 for an empty or missing whole
pub fn percentage(part: f64, whole: f64) -> f64 {
    try_percentage(part, whole).unwrap_or(0.0)
}

/// Month-over-month change in percent.
///
/// Growth from nothing counts as 100%; no activity in either month is 0%.
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else if current > 0.0 {
        100.0
    } else {
        0.0
    }
}

/// Width of a progress bar relative to the largest value on screen
pub fn bar_width(value: f64, max_value: f64) -> f64 {
    let max_value = if max_value > 0.0 { max_value } else { 1.0 };
    (value.abs() / max_value * 100.0).min(100.0)
}

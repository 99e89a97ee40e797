//! Number and money formatting helpers

/// Insert thousands separators into the digits of an integer string.
///
/// A leading `-` is kept in front of the grouped digits.
pub fn format_number<T: ToString>(n: T) -> String {
    group_digits(&n.to_string(), ",")
}

fn group_digits(s: &str, separator: &str) -> String {
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s),
    };

    let mut result = String::new();
    let mut count = 0;
    for c in digits.chars().rev() {
        if count == 3 {
            result.push_str(&separator.chars().rev().collect::<String>());
            count = 0;
        }
        result.push(c);
        count += 1;
    }
    let grouped: String = result.chars().rev().collect();
    format!("{}{}", sign, grouped)
}

/// Number formatting options
#[derive(Debug, Clone, PartialEq)]
pub struct NumberFormat {
    pub decimal_places: usize,
    pub thousands_separator: String,
    pub decimal_separator: String,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            decimal_places: 2,
            thousands_separator: ",".to_string(),
            decimal_separator: ".".to_string(),
        }
    }
}

/// Render a value with fixed decimals and grouped thousands, e.g. `1,234.50`
pub fn format_amount(value: f64, format: &NumberFormat) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.*}", format.decimal_places, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    // -0.00 renders as 0.00
    let negative = value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&group_digits(int_part, &format.thousands_separator));
    if let Some(frac) = frac_part {
        out.push_str(&format.decimal_separator);
        out.push_str(frac);
    }
    out
}

/// Prefix a formatted amount with a currency symbol: `Rs 5,000.00`
pub fn format_money(value: f64, symbol: &str, format: &NumberFormat) -> String {
    format!("{} {}", symbol, format_amount(value, format))
}

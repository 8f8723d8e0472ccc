//! Monetary amounts in minor units

use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency used when a row omits one
pub const DEFAULT_CURRENCY: &str = "NGN";

/// Amount in minor units (kobo, cents) with an ISO currency code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    pub amount_minor: i64,
    pub currency: String,
}

impl Money {
    #[inline]
    #[must_use]
    pub fn new(amount_minor: i64, currency: impl Into<String>) -> Self {
        Self {
            amount_minor,
            currency: currency.into().trim().to_uppercase(),
        }
    }

    /// Parse a decimal major-unit amount such as `"1,250.5"`
    ///
    /// At most two fractional digits are accepted.
    #[must_use]
    pub fn parse_major(text: &str) -> Option<i64> {
        let cleaned: String = text
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ',')
            .collect();
        let (negative, digits) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, cleaned.as_str()),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() && frac.is_empty() {
            return None;
        }
        if frac.len() > 2
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return None;
        }
        let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().ok()? * 10,
            _ => frac.parse().ok()?,
        };
        let minor = whole.checked_mul(100)?.checked_add(frac)?;
        Some(if negative { -minor } else { minor })
    }

    /// Plain decimal rendering, e.g. `"1250.50"`
    #[must_use]
    pub fn to_decimal_string(&self) -> String {
        format_minor(self.amount_minor)
    }
}

/// Render a minor-unit amount as a two-place decimal
#[must_use]
pub fn format_minor(amount_minor: i64) -> String {
    let sign = if amount_minor < 0 { "-" } else { "" };
    let abs = amount_minor.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.currency, self.to_decimal_string())
    }
}

//! Currency rates and USD price formatting.
//!
//! Prices are stored canonically in USD and converted to the storefront's
//! active currency only at display time. A rate is expressed as units of the
//! currency per 1 USD, so conversion is always a multiplication - the
//! formatter never divides.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// An exchange rate entry in the configuration document.
///
/// `rate` is the number of units of this currency per 1 USD and must be
/// positive. Rates are edited through the CMS, not fetched from a feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyRate {
    /// ISO 4217 currency code (e.g., "USD", "NGN").
    pub code: String,
    /// Display symbol prefixed to formatted amounts (e.g., "₦").
    pub symbol: String,
    /// Units of this currency per 1 USD.
    pub rate: Decimal,
}

impl CurrencyRate {
    /// Create a new rate entry.
    #[must_use]
    pub fn new(code: &str, symbol: &str, rate: Decimal) -> Self {
        Self {
            code: code.to_string(),
            symbol: symbol.to_string(),
            rate,
        }
    }

    /// The built-in US dollar entry used as the fallback when the active
    /// currency is missing from the document.
    #[must_use]
    pub fn usd() -> Self {
        Self::new("USD", "$", Decimal::ONE)
    }
}

impl Default for CurrencyRate {
    fn default() -> Self {
        Self::usd()
    }
}

/// Format a USD amount in the active display currency.
///
/// Looks up `active` in `currencies`; if absent, falls back to the built-in
/// USD entry so formatting never fails. The converted amount is rounded to
/// the nearest whole unit (half away from zero) and rendered with the
/// currency symbol prefixed and comma thousands separators:
///
/// ```
/// use std::collections::BTreeMap;
/// use rust_decimal::Decimal;
/// use velluto_core::currency::{CurrencyRate, format_usd};
///
/// let mut currencies = BTreeMap::new();
/// currencies.insert("NGN".to_string(), CurrencyRate::new("NGN", "₦", Decimal::new(1550, 0)));
/// assert_eq!(format_usd(Decimal::new(1000, 0), "NGN", &currencies), "₦1,550,000");
/// ```
///
/// Negative amounts (refunds, credits) pass through the same formatting with
/// a leading minus sign.
#[must_use]
pub fn format_usd(
    amount_usd: Decimal,
    active: &str,
    currencies: &BTreeMap<String, CurrencyRate>,
) -> String {
    let fallback = CurrencyRate::usd();
    let entry = currencies.get(active).unwrap_or(&fallback);

    let converted = (amount_usd * entry.rate)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    format!("{}{}", entry.symbol, group_thousands(converted))
}

/// Render a whole-unit decimal with comma thousands separators.
fn group_thousands(whole: Decimal) -> String {
    // The amounts in play (vehicle prices times exchange rates) fit in i128
    // comfortably; if something absurd overflows, render it ungrouped.
    let Some(n) = whole.to_i128() else {
        return whole.to_string();
    };

    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

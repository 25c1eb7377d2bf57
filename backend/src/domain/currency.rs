//! ISO 4217 currency codes and amount formatting.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Validation errors for [`CurrencyCode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CurrencyCodeError {
    /// The code was not exactly three ASCII letters.
    #[error("currency code must be three ASCII letters, got {0:?}")]
    Malformed(String),
}

/// Upper-case three letter ISO 4217 code.
///
/// # Examples
/// ```
/// use tally::domain::CurrencyCode;
///
/// let code = CurrencyCode::new("eur").expect("valid code");
/// assert_eq!(code.as_ref(), "EUR");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Validate and normalise a currency code.
    pub fn new(code: impl AsRef<str>) -> Result<Self, CurrencyCodeError> {
        let raw = code.as_ref().trim();
        if raw.len() != 3 || !raw.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CurrencyCodeError::Malformed(raw.to_owned()));
        }
        Ok(Self(raw.to_ascii_uppercase()))
    }

    /// The currency assigned to provisional profiles.
    pub fn usd() -> Self {
        Self("USD".to_owned())
    }

    /// Number of minor-unit digits used when formatting.
    pub fn minor_digits(&self) -> u32 {
        match self.0.as_str() {
            "JPY" | "KRW" | "VND" | "CLP" | "ISK" => 0,
            _ => 2,
        }
    }

    /// Symbol from the picker table, if this currency is offered there.
    pub fn symbol(&self) -> Option<&'static str> {
        SUPPORTED_CURRENCIES
            .iter()
            .find(|option| option.code == self.0)
            .map(|option| option.symbol)
    }

    fn prefix(&self) -> String {
        match self.symbol() {
            Some(symbol) => symbol.to_owned(),
            None => format!("{}\u{a0}", self.0),
        }
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.0
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Entry of the profile-completion currency picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CurrencyOption {
    /// ISO code.
    pub code: &'static str,
    /// Symbol shown next to the code.
    pub symbol: &'static str,
    /// English name.
    pub name: &'static str,
}

/// Currencies offered when completing a profile.
///
/// [`format_amount`] prefixes amounts with these symbols.
pub const SUPPORTED_CURRENCIES: [CurrencyOption; 8] = [
    CurrencyOption { code: "USD", symbol: "$", name: "US Dollar" },
    CurrencyOption { code: "EUR", symbol: "€", name: "Euro" },
    CurrencyOption { code: "GBP", symbol: "£", name: "British Pound" },
    CurrencyOption { code: "JPY", symbol: "¥", name: "Japanese Yen" },
    CurrencyOption { code: "CAD", symbol: "CA$", name: "Canadian Dollar" },
    CurrencyOption { code: "AUD", symbol: "A$", name: "Australian Dollar" },
    CurrencyOption { code: "INR", symbol: "₹", name: "Indian Rupee" },
    CurrencyOption { code: "CNY", symbol: "CN¥", name: "Chinese Yuan" },
];

/// Format `amount` in the `en-US` currency style.
///
/// Negative values carry a leading `-` before the symbol; zero and positive
/// values are unsigned. Rounding is half away from zero.
///
/// # Examples
/// ```
/// use rust_decimal::Decimal;
/// use tally::domain::{CurrencyCode, format_amount};
///
/// let eur = CurrencyCode::new("EUR").expect("valid code");
/// assert_eq!(format_amount(Decimal::new(-4250, 2), &eur), "-€42.50");
/// assert_eq!(format_amount(Decimal::new(123456789, 2), &eur), "€1,234,567.89");
/// ```
pub fn format_amount(amount: Decimal, currency: &CurrencyCode) -> String {
    let digits = currency.minor_digits();
    let rounded = amount.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let magnitude = rounded.abs();
    let fixed = format!("{magnitude:.prec$}", prec = digits as usize);
    let (whole, fraction) = match fixed.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (fixed.as_str(), None),
    };
    let grouped = group_thousands(whole);
    let mut out = format!("{sign}{}{grouped}", currency.prefix());
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("usd", "USD")]
    #[case(" Eur ", "EUR")]
    #[case("jpy", "JPY")]
    fn normalises_codes(#[case] raw: &str, #[case] expected: &str) {
        let code = CurrencyCode::new(raw).expect("valid code");
        assert_eq!(code.as_ref(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("EU")]
    #[case("EURO")]
    #[case("E1R")]
    fn rejects_malformed_codes(#[case] raw: &str) {
        assert!(matches!(
            CurrencyCode::new(raw),
            Err(CurrencyCodeError::Malformed(_))
        ));
    }

    #[rstest]
    #[case(Decimal::ZERO, "EUR", "€0.00")]
    #[case(Decimal::new(4250, 2), "EUR", "€42.50")]
    #[case(Decimal::new(-4250, 2), "EUR", "-€42.50")]
    #[case(Decimal::new(1_000_000, 0), "USD", "$1,000,000.00")]
    #[case(Decimal::new(12_345, 1), "JPY", "¥1,235")]
    #[case(Decimal::new(5, 3), "GBP", "£0.01")]
    #[case(Decimal::new(-1, 3), "USD", "$0.00")]
    #[case(Decimal::new(999, 0), "CHF", "CHF\u{a0}999.00")]
    fn formats_amounts(#[case] amount: Decimal, #[case] code: &str, #[case] expected: &str) {
        let currency = CurrencyCode::new(code).expect("valid code");
        assert_eq!(format_amount(amount, &currency), expected);
    }

    #[test]
    fn picker_symbols_match_formatted_amounts() {
        let mut symbols: Vec<_> = SUPPORTED_CURRENCIES.iter().map(|c| c.symbol).collect();
        symbols.sort_unstable();
        symbols.dedup();
        assert_eq!(symbols.len(), SUPPORTED_CURRENCIES.len());
        for option in SUPPORTED_CURRENCIES {
            let currency = CurrencyCode::new(option.code).expect("valid code");
            let formatted = format_amount(Decimal::ONE, &currency);
            assert!(
                formatted.starts_with(option.symbol),
                "{} formats as {formatted}",
                option.code
            );
        }
    }

    #[test]
    fn picker_lists_eight_distinct_codes() {
        let mut codes: Vec<_> = SUPPORTED_CURRENCIES.iter().map(|c| c.code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 8);
        for code in codes {
            assert!(CurrencyCode::new(code).is_ok());
        }
    }
}

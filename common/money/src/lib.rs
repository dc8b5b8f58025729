use bigdecimal::BigDecimal;
use bigdecimal::ToPrimitive;
use std::str::FromStr;
use thiserror::Error;

/// Minor units per rupee.
pub const MINOR_PER_MAJOR: i64 = 100;

/// Longest amount text accepted. Caps the work done before any arithmetic.
const MAX_AMOUNT_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount is not a decimal number: {0}")]
    Unparseable(String),
    #[error("amount must be positive")]
    NotPositive,
    #[error("amount is below one paisa")]
    BelowMinorUnit,
    #[error("amount is too large")]
    Overflow,
}

// Plain `digits[.digits]`: no sign, no exponent.
fn is_plain_decimal(s: &str) -> bool {
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    match s.split_once('.') {
        Some((int, frac)) => all_digits(int) && all_digits(frac),
        None => all_digits(s),
    }
}

/// Parse a user-supplied amount (JSON number text or numeric string) into a
/// positive decimal worth at least one paisa.
pub fn parse_amount(raw: &str) -> Result<BigDecimal, MoneyError> {
    let trimmed = raw.trim();
    if trimmed.len() > MAX_AMOUNT_LEN || !is_plain_decimal(trimmed) {
        return Err(MoneyError::Unparseable(trimmed.chars().take(MAX_AMOUNT_LEN).collect()));
    }
    let value = BigDecimal::from_str(trimmed).map_err(|_| MoneyError::Unparseable(trimmed.to_string()))?;
    if value <= BigDecimal::from(0) {
        return Err(MoneyError::NotPositive);
    }
    // Must be representable in minor units.
    if to_minor_units_floor(&value)? == 0 {
        return Err(MoneyError::BelowMinorUnit);
    }
    Ok(value)
}

/// Amount in minor units (paise), rounded down: `floor(amount * 100)`.
/// Only meaningful for non-negative amounts, where truncation equals floor.
pub fn to_minor_units_floor(value: &BigDecimal) -> Result<i64, MoneyError> {
    let scaled = (value * BigDecimal::from(MINOR_PER_MAJOR)).with_scale(0);
    scaled.to_i64().ok_or(MoneyError::Overflow)
}

/// Canonical text form used on the wire and inside deep links.
pub fn display_amount(value: &BigDecimal) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integers_and_decimals() {
        assert_eq!(display_amount(&parse_amount("100").unwrap()), "100");
        assert_eq!(display_amount(&parse_amount(" 99.5 ").unwrap()), "99.5");
    }

    #[test]
    fn rejects_non_positive_and_garbage() {
        assert_eq!(parse_amount("0"), Err(MoneyError::NotPositive));
        assert_eq!(parse_amount("0.00"), Err(MoneyError::NotPositive));
        assert!(matches!(parse_amount("-5"), Err(MoneyError::Unparseable(_))));
        assert!(matches!(parse_amount("ten"), Err(MoneyError::Unparseable(_))));
        assert!(matches!(parse_amount("1."), Err(MoneyError::Unparseable(_))));
        assert!(matches!(parse_amount(".5"), Err(MoneyError::Unparseable(_))));
        assert_eq!(parse_amount("99999999999999999999"), Err(MoneyError::Overflow));
    }

    #[test]
    fn rejects_exponents_and_oversized_text() {
        for raw in ["1e-10000000", "1e10000000", "1E2", "+5", "NaN", "inf"] {
            assert!(matches!(parse_amount(raw), Err(MoneyError::Unparseable(_))), "{raw}");
        }
        let long = format!("1.{}", "0".repeat(MAX_AMOUNT_LEN));
        match parse_amount(&long) {
            Err(MoneyError::Unparseable(echo)) => assert_eq!(echo.len(), MAX_AMOUNT_LEN),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn sub_paisa_amounts_are_rejected() {
        assert_eq!(parse_amount("0.009"), Err(MoneyError::BelowMinorUnit));
        assert_eq!(display_amount(&parse_amount("0.01").unwrap()), "0.01");
    }

    #[test]
    fn minor_units_are_floored() {
        let v = BigDecimal::from_str("12.349").unwrap();
        assert_eq!(to_minor_units_floor(&v).unwrap(), 1234);
        let v = BigDecimal::from_str("100").unwrap();
        assert_eq!(to_minor_units_floor(&v).unwrap(), 10000);
        let v = BigDecimal::from_str("0.009").unwrap();
        assert_eq!(to_minor_units_floor(&v).unwrap(), 0);
    }
}

//! Conversion between decimal token amounts and base units.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::Balance;

/// Largest exponent a `Decimal` can scale by.
pub const MAX_UNITS: u8 = 28;

/// Amount conversion error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Invalid amount: {0}")]
    Invalid(String),
    #[error("Amount must not be negative")]
    Negative,
    #[error("Amount does not fit in base units")]
    Overflow,
    #[error("Unsupported unit exponent: {0}")]
    Units(u8),
}

fn unit_factor(units: u8) -> Result<Decimal, AmountError> {
    if units > MAX_UNITS {
        return Err(AmountError::Units(units));
    }
    Ok(Decimal::from_i128_with_scale(10i128.pow(units as u32), 0))
}

/// Convert a decimal amount to base units: `floor(amount * 10^units)`.
///
/// Digits below one base unit are dropped, never rounded up, so the encoded
/// value never exceeds what the user approved.
pub fn encode_amount(amount: Decimal, units: u8) -> Result<Balance, AmountError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AmountError::Negative);
    }
    let factor = unit_factor(units)?;
    let truncated = amount.round_dp_with_strategy(units as u32, RoundingStrategy::ToZero);
    truncated
        .checked_mul(factor)
        .and_then(|scaled| scaled.trunc().to_u128())
        .ok_or(AmountError::Overflow)
}

/// Convert base units to a decimal amount.
///
/// Saturates at `Decimal::MAX` for balances beyond its 96-bit mantissa.
pub fn planck_to_unit(planck: Balance, units: u8) -> Decimal {
    let scale = units.min(MAX_UNITS) as u32;
    i128::try_from(planck)
        .ok()
        .and_then(|num| Decimal::try_from_i128_with_scale(num, scale).ok())
        .unwrap_or(Decimal::MAX)
        .normalize()
}

/// Parse user input into a non-negative decimal amount.
pub fn parse_amount(input: &str) -> Result<Decimal, AmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Invalid("empty input".to_string()));
    }
    let value: Decimal = trimmed
        .parse()
        .map_err(|e: rust_decimal::Error| AmountError::Invalid(format!("{trimmed}: {e}")))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AmountError::Negative);
    }
    Ok(value.normalize())
}

/// Subtract, clamping the result to `[0, Decimal::MAX]`.
pub fn saturating_sub(a: Decimal, b: Decimal) -> Decimal {
    match a.checked_sub(b) {
        Some(d) => d.max(Decimal::ZERO),
        None if b.is_sign_negative() => Decimal::MAX,
        None => Decimal::ZERO,
    }
}

/// Format a base-unit balance with its token symbol.
pub fn format_balance(planck: Balance, units: u8, symbol: &str) -> String {
    format!("{} {}", planck_to_unit(planck, units), symbol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_encode_whole_amount() {
        assert_eq!(encode_amount(dec!(50), 10).unwrap(), 500_000_000_000);
        assert_eq!(encode_amount(dec!(1), 12).unwrap(), 1_000_000_000_000);
    }

    #[test]
    fn test_encode_truncates_sub_unit_digits() {
        // 11 fractional digits on a 10-decimal network: last digit dropped.
        assert_eq!(
            encode_amount(dec!(1.00000000019), 10).unwrap(),
            10_000_000_001
        );
        assert_eq!(encode_amount(dec!(0.00000000009), 10).unwrap(), 0);
    }

    #[test]
    fn test_encode_never_rounds_up_at_precision_limit() {
        let amount = dec!(0.9999999999999999999999999999);
        assert_eq!(encode_amount(amount, 10).unwrap(), 9_999_999_999);
    }

    #[test]
    fn test_encode_zero() {
        assert_eq!(encode_amount(Decimal::ZERO, 10).unwrap(), 0);
    }

    #[test]
    fn test_encode_negative_rejected() {
        assert_eq!(encode_amount(dec!(-1), 10), Err(AmountError::Negative));
    }

    #[test]
    fn test_encode_bad_units() {
        assert_eq!(encode_amount(dec!(1), 29), Err(AmountError::Units(29)));
    }

    #[test]
    fn test_encode_overflow() {
        assert_eq!(encode_amount(Decimal::MAX, 10), Err(AmountError::Overflow));
    }

    #[test]
    fn test_planck_to_unit() {
        assert_eq!(planck_to_unit(200_000_000_000, 10), dec!(20));
        assert_eq!(planck_to_unit(15_000_000_000, 10), dec!(1.5));
        assert_eq!(planck_to_unit(1, 12), dec!(0.000000000001));
        assert_eq!(planck_to_unit(0, 10), Decimal::ZERO);
    }

    #[test]
    fn test_planck_to_unit_saturates() {
        assert_eq!(planck_to_unit(u128::MAX, 10), Decimal::MAX);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("12.5").unwrap(), dec!(12.5));
        assert_eq!(parse_amount("  3 ").unwrap(), dec!(3));
        assert_eq!(parse_amount("0").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_parse_amount_errors() {
        assert!(matches!(parse_amount(""), Err(AmountError::Invalid(_))));
        assert!(matches!(parse_amount("abc"), Err(AmountError::Invalid(_))));
        assert_eq!(parse_amount("-4"), Err(AmountError::Negative));
    }

    #[test]
    fn test_saturating_sub_clamps() {
        assert_eq!(saturating_sub(dec!(100), dec!(20)), dec!(80));
        assert_eq!(saturating_sub(dec!(10), dec!(20)), Decimal::ZERO);
        assert_eq!(saturating_sub(Decimal::MIN, dec!(1)), Decimal::ZERO);
        assert_eq!(saturating_sub(Decimal::MAX, dec!(-1)), Decimal::MAX);
    }

    #[test]
    fn test_format_balance() {
        assert_eq!(format_balance(15_000_000_000, 10, "DOT"), "1.5 DOT");
    }

    proptest! {
        #[test]
        fn prop_encode_never_exceeds_amount(
            mantissa in 0i64..1_000_000_000_000,
            scale in 0u32..=18,
            units in 0u8..=12,
        ) {
            let amount = Decimal::new(mantissa, scale);
            let encoded = encode_amount(amount, units).unwrap();
            prop_assert!(planck_to_unit(encoded, units) <= amount);
        }

        #[test]
        fn prop_encode_exact_when_integral(planck in 0u64..u64::MAX, units in 0u8..=18) {
            let amount = planck_to_unit(planck as u128, units);
            prop_assert_eq!(encode_amount(amount, units).unwrap(), planck as u128);
        }
    }
}

//! Decimal coin amounts and their droplet representation.
//!
//! A droplet is the indivisible integer unit. A coin with `decimals = 6`
//! has 1 coin = 1_000_000 droplets. Networks may further restrict how many
//! of those decimal places a spend may use (`max_decimals`).

use crate::error::AmountError;

/// Upper bound on supported decimal places; 10^19 overflows u64.
pub const MAX_DECIMALS: u32 = 18;

/// `10^decimals` droplets per whole coin.
pub fn droplets_per_coin(decimals: u32) -> Result<u64, AmountError> {
    10u64.checked_pow(decimals).ok_or(AmountError::Overflow)
}

/// Parse a decimal string such as `"10"`, `"10.5"` or `"10.000000"` into droplets.
///
/// Rejects signs, exponents, whitespace inside the number, more than one
/// decimal point, more fractional digits than `decimals`, and values that
/// overflow `u64`.
pub fn parse_droplets(s: &str, decimals: u32) -> Result<u64, AmountError> {
    if decimals > MAX_DECIMALS {
        return Err(AmountError::Overflow);
    }
    let s = s.trim();
    if s.is_empty() {
        return Err(AmountError::Empty);
    }

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(AmountError::Empty);
    }
    if let Some(c) = whole.chars().chain(frac.chars()).find(|c| !c.is_ascii_digit()) {
        return Err(AmountError::InvalidCharacter(c));
    }

    let frac_digits = frac.len() as u32;
    if frac_digits > decimals {
        return Err(AmountError::TooManyDecimals {
            got: frac_digits,
            max: decimals,
        });
    }

    let unit = droplets_per_coin(decimals)?;
    let whole_value = if whole.is_empty() {
        0
    } else {
        whole.parse::<u64>().map_err(|_| AmountError::Overflow)?
    };
    let frac_value = if frac.is_empty() {
        0
    } else {
        let scale = droplets_per_coin(decimals - frac_digits)?;
        frac.parse::<u64>().map_err(|_| AmountError::Overflow)? * scale
    };

    whole_value
        .checked_mul(unit)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or(AmountError::Overflow)
}

/// Format droplets as a decimal string with exactly `decimals` fractional digits.
pub fn format_droplets(droplets: u64, decimals: u32) -> String {
    if decimals == 0 {
        return droplets.to_string();
    }
    match droplets_per_coin(decimals) {
        Ok(unit) => format!(
            "{}.{:0width$}",
            droplets / unit,
            droplets % unit,
            width = decimals as usize
        ),
        Err(_) => droplets.to_string(),
    }
}

/// Number of fractional decimal places `droplets` actually uses.
///
/// `1_500_000` at 6 decimals uses 1 place; `1_000_001` uses 6.
pub fn used_decimals(droplets: u64, decimals: u32) -> u32 {
    let mut used = decimals;
    let mut rest = droplets;
    while used > 0 && rest % 10 == 0 {
        rest /= 10;
        used -= 1;
    }
    used
}

/// Check that `droplets` uses no more than `max_decimals` fractional places.
pub fn check_precision(droplets: u64, decimals: u32, max_decimals: u32) -> Result<(), AmountError> {
    let used = used_decimals(droplets, decimals);
    if used > max_decimals {
        return Err(AmountError::TooManyDecimals {
            got: used,
            max: max_decimals,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_whole_and_fractional() {
        assert_eq!(parse_droplets("10", 6).unwrap(), 10_000_000);
        assert_eq!(parse_droplets("10.5", 6).unwrap(), 10_500_000);
        assert_eq!(parse_droplets("10.000000", 6).unwrap(), 10_000_000);
        assert_eq!(parse_droplets("0.000001", 6).unwrap(), 1);
        assert_eq!(parse_droplets(".5", 6).unwrap(), 500_000);
        assert_eq!(parse_droplets("3.", 6).unwrap(), 3_000_000);
        assert_eq!(parse_droplets(" 7 ", 6).unwrap(), 7_000_000);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert_eq!(parse_droplets("", 6).unwrap_err(), AmountError::Empty);
        assert_eq!(parse_droplets(".", 6).unwrap_err(), AmountError::Empty);
        assert_eq!(parse_droplets("-1", 6).unwrap_err(), AmountError::InvalidCharacter('-'));
        assert_eq!(parse_droplets("1e5", 6).unwrap_err(), AmountError::InvalidCharacter('e'));
        assert_eq!(parse_droplets("1.2.3", 6).unwrap_err(), AmountError::InvalidCharacter('.'));
    }

    #[test]
    fn parse_rejects_excess_decimals() {
        assert_eq!(
            parse_droplets("1.0000001", 6).unwrap_err(),
            AmountError::TooManyDecimals { got: 7, max: 6 }
        );
    }

    #[test]
    fn parse_rejects_overflow() {
        assert_eq!(
            parse_droplets("18446744073709551616", 0).unwrap_err(),
            AmountError::Overflow
        );
        assert_eq!(
            parse_droplets("18446744073710", 6).unwrap_err(),
            AmountError::Overflow
        );
    }

    #[test]
    fn format_pads_fraction() {
        assert_eq!(format_droplets(10_500_000, 6), "10.500000");
        assert_eq!(format_droplets(1, 6), "0.000001");
        assert_eq!(format_droplets(42, 0), "42");
    }

    #[test]
    fn precision_check() {
        assert!(check_precision(1_000, 6, 3).is_ok());
        assert!(check_precision(1_234_000, 6, 3).is_ok());
        assert_eq!(
            check_precision(1_234_500, 6, 3).unwrap_err(),
            AmountError::TooManyDecimals { got: 4, max: 3 }
        );
        assert_eq!(used_decimals(0, 6), 0);
        assert_eq!(used_decimals(1, 6), 6);
    }

    proptest! {
        #[test]
        fn format_then_parse_is_identity(droplets in any::<u64>(), decimals in 0u32..=9) {
            let s = format_droplets(droplets, decimals);
            prop_assert_eq!(parse_droplets(&s, decimals).unwrap(), droplets);
        }

        #[test]
        fn precision_accepts_multiples_of_divisor(units in 0u64..1_000_000_000) {
            prop_assert!(check_precision(units * 1_000, 6, 3).is_ok());
        }
    }
}

//! Bounds for money amounts, matching the `NUMERIC(12, 2)` columns.

use rust_decimal::Decimal;

/// Whole-number digits a stored amount may have.
pub const MAX_WHOLE_DIGITS: u32 = 10;

/// Fractional digits a stored amount may have.
pub const MAX_SCALE: u32 = 2;

/// Why `amount` cannot be stored, or `None` if it fits.
pub fn out_of_range(amount: Decimal) -> Option<String> {
    if amount.normalize().scale() > MAX_SCALE {
        return Some(format!("must have at most {MAX_SCALE} decimal places"));
    }
    if amount.abs() >= Decimal::from(10_i64.pow(MAX_WHOLE_DIGITS)) {
        return Some(format!("must have at most {MAX_WHOLE_DIGITS} whole digits"));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cents_fit_and_fractions_of_cents_do_not() {
        assert_eq!(out_of_range(Decimal::new(85050, 2)), None);
        assert_eq!(out_of_range(Decimal::new(12000, 3)), None);
        assert!(out_of_range(Decimal::new(1, 3)).is_some());
    }

    #[test]
    fn ten_whole_digits_is_the_ceiling() {
        assert_eq!(out_of_range(Decimal::new(999_999_999_999, 2)), None);
        assert!(out_of_range(Decimal::from(10_000_000_000_i64)).is_some());
    }
}

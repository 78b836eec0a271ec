//! Monetary value helpers.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a monetary amount to two decimal places.
///
/// Midpoints round away from zero, matching how invoice amounts are
/// presented to finance.
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_round_currency_to_two_decimals() {
        assert_eq!(round_currency(dec("199.999")), dec("200.00"));
        assert_eq!(round_currency(dec("10.004")), dec("10.00"));
    }

    #[test]
    fn test_round_currency_midpoint_away_from_zero() {
        assert_eq!(round_currency(dec("0.125")), dec("0.13"));
        assert_eq!(round_currency(dec("-0.125")), dec("-0.13"));
    }

    #[test]
    fn test_round_currency_no_op_for_exact_values() {
        assert_eq!(round_currency(dec("450.50")), dec("450.50"));
    }
}

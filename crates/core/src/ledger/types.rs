//! Ledger domain types and numeric policies.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Classification of a balance ledger entry.
///
/// Informational only: the replay arithmetic never looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// Customer deposited money onto their account.
    TopUp,
    /// Money spent on a service or insurance payment.
    Payment,
    /// Referral payout credited to a city partner.
    PartnerIncome,
    /// Manual adjustment or anything else.
    Other,
}

impl ChangeType {
    /// Returns the wire/database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TopUp => "top_up",
            Self::Payment => "payment",
            Self::PartnerIncome => "partner_income",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for ChangeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top_up" => Ok(Self::TopUp),
            "payment" => Ok(Self::Payment),
            "partner_income" => Ok(Self::PartnerIncome),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown change type: {s}")),
        }
    }
}

/// Numeric instance of a ledger: the value type together with its rounding
/// policy.
///
/// The balance ledger accumulates `Decimal` values re-rounded to 2 fraction
/// digits after every step; the credit ledger accumulates plain `i64`.
pub trait LedgerValue: Copy + PartialEq + std::fmt::Debug {
    /// Additive identity; also the customer total for an empty ledger.
    const ZERO: Self;

    /// Adds `delta` to `self`, applying the ledger's rounding policy.
    #[must_use]
    fn accumulate(self, delta: Self) -> Self;
}

impl LedgerValue for Decimal {
    const ZERO: Self = Self::ZERO;

    fn accumulate(self, delta: Self) -> Self {
        round_amount(self + delta)
    }
}

impl LedgerValue for i64 {
    const ZERO: Self = 0;

    fn accumulate(self, delta: Self) -> Self {
        self.saturating_add(delta)
    }
}

/// Rounds a monetary amount to 2 fraction digits using banker's rounding.
///
/// Applied after every arithmetic step, not only at display time, so a long
/// replay cannot accumulate sub-cent drift.
#[must_use]
pub fn round_amount(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Converts a possibly fractional source value to whole credit points.
///
/// Credits truncate toward zero; they never round.
#[must_use]
pub fn credits_from_decimal(value: Decimal) -> i64 {
    use rust_decimal::prelude::ToPrimitive;

    value.trunc().to_i64().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn test_change_type_round_trip() {
        for ct in [
            ChangeType::TopUp,
            ChangeType::Payment,
            ChangeType::PartnerIncome,
            ChangeType::Other,
        ] {
            assert_eq!(ChangeType::from_str(ct.as_str()).unwrap(), ct);
        }
        assert!(ChangeType::from_str("refund").is_err());
    }

    #[rstest]
    // Midpoints go to the even cent, everything else to the nearest.
    #[case(dec!(10.005), dec!(10.00))]
    #[case(dec!(10.015), dec!(10.02))]
    #[case(dec!(-3.004), dec!(-3.00))]
    #[case(dec!(7.01), dec!(7.01))]
    fn test_round_amount_two_places(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_amount(input), expected);
    }

    #[test]
    fn test_amount_accumulate_rounds_each_step() {
        let total = dec!(10.00).accumulate(dec!(0.004));
        assert_eq!(total, dec!(10.00));
    }

    #[test]
    fn test_credits_truncate_not_round() {
        assert_eq!(credits_from_decimal(dec!(7.99)), 7);
        assert_eq!(credits_from_decimal(dec!(-7.99)), -7);
        assert_eq!(credits_from_decimal(dec!(3)), 3);
    }

    #[test]
    fn test_credit_accumulate_plain_addition() {
        assert_eq!(7i64.accumulate(2), 9);
        assert_eq!(0i64.accumulate(-1), -1);
    }
}

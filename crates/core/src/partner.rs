//! City-partner payout rule.
//!
//! When a paid insurance or service order is attributed to a city partner,
//! the partner's balance ledger is credited with a fixed percentage of the
//! order total. The payout entry is keyed by a stable link back to the
//! source order so re-saving the order updates rather than duplicates it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::round_amount;

/// Which kind of order produced a payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutKind {
    /// Insurance order: partner earns 2% of the premium.
    Insurance,
    /// Service order: partner earns 5% of the invoice.
    Service,
}

impl PayoutKind {
    /// Payout rate as a decimal fraction of the order total.
    #[must_use]
    pub const fn rate(self) -> Decimal {
        match self {
            Self::Insurance => Decimal::from_parts(2, 0, 0, false, 2),
            Self::Service => Decimal::from_parts(5, 0, 0, false, 2),
        }
    }

    /// Returns the wire/database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insurance => "insurance",
            Self::Service => "service",
        }
    }
}

impl std::str::FromStr for PayoutKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "insurance" => Ok(Self::Insurance),
            "service" => Ok(Self::Service),
            _ => Err(format!("Unknown payout kind: {s}")),
        }
    }
}

/// Computes the partner payout for an order total, rounded to 2 decimals.
#[must_use]
pub fn payout_amount(kind: PayoutKind, order_total: Decimal) -> Decimal {
    round_amount(order_total * kind.rate())
}

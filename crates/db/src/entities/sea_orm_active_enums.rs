//! Database enum mappings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Classification of a balance ledger entry (informational only).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "change_type")]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// Customer deposited money onto their account.
    #[sea_orm(string_value = "top_up")]
    TopUp,
    /// Money spent on a service or insurance payment.
    #[sea_orm(string_value = "payment")]
    Payment,
    /// Referral payout credited to a city partner.
    #[sea_orm(string_value = "partner_income")]
    PartnerIncome,
    /// Manual adjustment or anything else.
    #[sea_orm(string_value = "other")]
    Other,
}

/// Kind of customer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "order_kind")]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// Vehicle insurance order.
    #[sea_orm(string_value = "insurance")]
    Insurance,
    /// Maintenance / repair service order.
    #[sea_orm(string_value = "service")]
    Service,
}

impl From<autocare_core::ledger::ChangeType> for ChangeType {
    fn from(value: autocare_core::ledger::ChangeType) -> Self {
        use autocare_core::ledger::ChangeType as Core;
        match value {
            Core::TopUp => Self::TopUp,
            Core::Payment => Self::Payment,
            Core::PartnerIncome => Self::PartnerIncome,
            Core::Other => Self::Other,
        }
    }
}

impl From<ChangeType> for autocare_core::ledger::ChangeType {
    fn from(value: ChangeType) -> Self {
        match value {
            ChangeType::TopUp => Self::TopUp,
            ChangeType::Payment => Self::Payment,
            ChangeType::PartnerIncome => Self::PartnerIncome,
            ChangeType::Other => Self::Other,
        }
    }
}

impl From<autocare_core::partner::PayoutKind> for OrderKind {
    fn from(value: autocare_core::partner::PayoutKind) -> Self {
        use autocare_core::partner::PayoutKind;
        match value {
            PayoutKind::Insurance => Self::Insurance,
            PayoutKind::Service => Self::Service,
        }
    }
}

impl From<OrderKind> for autocare_core::partner::PayoutKind {
    fn from(value: OrderKind) -> Self {
        match value {
            OrderKind::Insurance => Self::Insurance,
            OrderKind::Service => Self::Service,
        }
    }
}

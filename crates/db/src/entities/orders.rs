//! `SeaORM` Entity for insurance and service orders.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::OrderKind;

/// A customer order: an insurance policy sale or a maintenance service.
///
/// Marking a partner-attributed order paid triggers the partner payout side
/// effect in the ledger; unmarking it retracts the payout.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Primary key.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Insurance or service.
    pub kind: OrderKind,
    /// The customer the order was sold to.
    pub customer_id: i64,
    /// The referring city partner, if any. Must be a partner customer.
    pub partner_id: Option<i64>,
    /// Order total, tax included.
    pub total_price: Decimal,
    /// Business date of the order.
    pub record_date: Date,
    /// Whether the order has been paid.
    pub paid: bool,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTimeWithTimeZone,
    /// Last update timestamp.
    pub updated_at: DateTimeWithTimeZone,
}

/// Entity relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The ordering customer.
    #[sea_orm(
        belongs_to = "super::customers::Entity",
        from = "Column::CustomerId",
        to = "super::customers::Column::Id"
    )]
    Customers,
}

impl Related<super::customers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

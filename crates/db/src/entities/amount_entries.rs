//! `SeaORM` Entity for the balance ledger (amount_entries table).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{ChangeType, OrderKind};

/// One signed adjustment in a customer's balance history.
///
/// `running_total` is a derived cache: the sum of all of this customer's
/// deltas with `id <= self.id`, re-rounded to 2 decimals at every step.
/// Id order is the sole sequencing authority for replay.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "amount_entries")]
pub struct Model {
    /// Primary key; assigned by the database, monotonically increasing.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning customer.
    pub customer_id: i64,
    /// Signed change: positive = gain, negative = spend.
    pub delta: Decimal,
    /// Cached balance after this entry.
    pub running_total: Decimal,
    /// Informational classification; never affects recomputation.
    pub change_type: ChangeType,
    /// Kind of the source order, when this entry is a partner payout.
    pub source_kind: Option<OrderKind>,
    /// Id of the source order, when this entry is a partner payout.
    /// Unique together with `source_kind` so re-saving an order updates
    /// rather than duplicates its payout.
    pub source_id: Option<i64>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Creation timestamp (never used for sequencing).
    pub created_at: DateTimeWithTimeZone,
    /// Last update timestamp.
    pub updated_at: DateTimeWithTimeZone,
}

/// Entity relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Owning customer.
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

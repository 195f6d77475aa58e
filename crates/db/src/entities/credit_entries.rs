//! `SeaORM` Entity for the credit-point ledger (credit_entries table).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One signed adjustment in a customer's credit-point history.
///
/// The integer twin of `amount_entries`: same replay semantics, plain i64
/// addition instead of 2-decimal rounding.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "credit_entries")]
pub struct Model {
    /// Primary key; assigned by the database, monotonically increasing.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning customer.
    pub customer_id: i64,
    /// Signed change in credit points.
    pub delta: i64,
    /// Cached credit total after this entry.
    pub running_total: i64,
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

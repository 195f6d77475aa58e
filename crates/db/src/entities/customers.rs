//! `SeaORM` Entity for the customers table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A customer of the shop, optionally acting as a city partner.
///
/// `current_balance` and `current_credits` are denormalized mirrors of the
/// latest ledger entry's running total. Only the ledger repository may write
/// them.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    /// Primary key.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Customer name; unique together with `mobile`.
    pub name: String,
    /// Mobile phone number; unique together with `name`.
    pub mobile: String,
    /// Whether this customer participates in the city partner program.
    pub is_partner: bool,
    /// Running total of the latest balance ledger entry (0 if none).
    pub current_balance: Decimal,
    /// Running total of the latest credit ledger entry (0 if none).
    pub current_credits: i64,
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
    /// Balance ledger entries owned by this customer.
    #[sea_orm(has_many = "super::amount_entries::Entity")]
    AmountEntries,
    /// Credit ledger entries owned by this customer.
    #[sea_orm(has_many = "super::credit_entries::Entity")]
    CreditEntries,
}

impl Related<super::amount_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AmountEntries.def()
    }
}

impl Related<super::credit_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreditEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! `SeaORM` entity definitions.

pub mod amount_entries;
pub mod credit_entries;
pub mod customers;
pub mod orders;
pub mod sea_orm_active_enums;

//! Core business logic for Autocare.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, arithmetic rules, and calculations live here.
//!
//! # Modules
//!
//! - `ledger` - Running-total replay arithmetic for the balance and credit ledgers
//! - `partner` - City-partner payout percentage rule

pub mod ledger;
pub mod partner;

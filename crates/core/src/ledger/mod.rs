//! Running-total replay arithmetic for customer ledgers.
//!
//! A customer has two independent ledgers: a monetary balance ledger
//! (2-decimal fixed point) and an integer credit-point ledger. Each entry
//! stores the signed `delta` it applies and a cached `running_total`, the
//! cumulative sum of all entries up to and including itself in id order.
//! Insertion order via the primary key is authoritative for sequencing;
//! timestamps are never consulted.
//!
//! This module holds the pure arithmetic: the numeric instances with their
//! rounding policies and the forward replay that the persistence layer uses
//! to restore the running totals after any write.

pub mod error;
pub mod replay;
pub mod types;

pub use error::LedgerError;
pub use replay::{final_total, replay, running_totals};
pub use types::{ChangeType, LedgerValue, credits_from_decimal, round_amount};

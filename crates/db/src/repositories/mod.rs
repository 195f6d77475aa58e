//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application. All ledger mutation goes through `LedgerRepository`; no
//! other code may write `running_total` or the customer's denormalized
//! totals.

pub mod customer;
pub mod ledger;
pub mod order;

pub use customer::{CreateCustomerInput, CustomerError, CustomerRepository};
pub use ledger::{AmountChangeMeta, LedgerRepository};
pub use order::{CreateOrderInput, OrderError, OrderRepository};

//! Ledger error types.

use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Customer not found; the engine never creates customers.
    #[error("Customer not found: {0}")]
    CustomerNotFound(i64),

    /// Ledger entry not found.
    #[error("Ledger entry not found: {0}")]
    EntryNotFound(i64),

    /// Delta rejected before any persistence occurred.
    #[error("Invalid delta: {0}")]
    InvalidDelta(String),

    /// Two cascades for the same customer overlapped.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    /// Persistence failure; the whole cascade was aborted.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::CustomerNotFound(_) => "CUSTOMER_NOT_FOUND",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::InvalidDelta(_) => "INVALID_DELTA",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidDelta(_) => 400,
            Self::CustomerNotFound(_) | Self::EntryNotFound(_) => 404,
            Self::ConcurrentModification => 409,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns true if the caller may safely re-invoke the operation.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }
}

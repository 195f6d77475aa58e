//! Balance and credit ledger routes.
//!
//! These are thin wrappers over the ledger engine: append an entry, list a
//! customer's history in replay order, delete an entry. The engine performs
//! the recompute cascade; handlers only translate errors.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use tracing::error;

use crate::AppState;
use crate::routes::app_error;
use autocare_core::ledger::{ChangeType, LedgerError};
use autocare_shared::AppError;
use autocare_core::partner::PayoutKind;
use autocare_db::entities::{amount_entries, credit_entries};
use autocare_db::repositories::ledger::{AmountChangeMeta, LedgerRepository};
use autocare_shared::types::{AmountEntryId, CreditEntryId, CustomerId};

/// Creates the ledger routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/customers/{id}/balance-entries",
            get(list_balance_entries).post(create_balance_entry),
        )
        .route("/balance-entries/{id}", delete(delete_balance_entry))
        .route(
            "/customers/{id}/credit-entries",
            get(list_credit_entries).post(create_credit_entry),
        )
        .route("/credit-entries/{id}", delete(delete_credit_entry))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for appending a balance entry.
#[derive(Debug, Deserialize)]
pub struct CreateBalanceEntryRequest {
    /// Signed amount delta, e.g. `"-40.00"`.
    pub delta: String,
    /// Classification: `top_up`, `payment`, `partner_income` or `other`.
    pub change_type: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Request body for appending a credit entry.
#[derive(Debug, Deserialize)]
pub struct CreateCreditEntryRequest {
    /// Signed credit delta.
    pub delta: i64,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Response for a balance ledger entry.
#[derive(Debug, Serialize)]
pub struct BalanceEntryResponse {
    /// Entry ID.
    pub id: i64,
    /// Customer ID.
    pub customer_id: i64,
    /// Signed delta.
    pub delta: String,
    /// Balance after this entry.
    pub running_total: String,
    /// Entry classification.
    pub change_type: &'static str,
    /// Source order kind for partner payouts.
    pub source_kind: Option<&'static str>,
    /// Source order ID for partner payouts.
    pub source_id: Option<i64>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Created at timestamp.
    pub created_at: String,
}

impl From<amount_entries::Model> for BalanceEntryResponse {
    fn from(model: amount_entries::Model) -> Self {
        Self {
            id: model.id,
            customer_id: model.customer_id,
            delta: model.delta.to_string(),
            running_total: model.running_total.to_string(),
            change_type: ChangeType::from(model.change_type).as_str(),
            source_kind: model.source_kind.map(|k| PayoutKind::from(k).as_str()),
            source_id: model.source_id,
            notes: model.notes,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// Response for a credit ledger entry.
#[derive(Debug, Serialize)]
pub struct CreditEntryResponse {
    /// Entry ID.
    pub id: i64,
    /// Customer ID.
    pub customer_id: i64,
    /// Signed delta.
    pub delta: i64,
    /// Credit total after this entry.
    pub running_total: i64,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Created at timestamp.
    pub created_at: String,
}

impl From<credit_entries::Model> for CreditEntryResponse {
    fn from(model: credit_entries::Model) -> Self {
        Self {
            id: model.id,
            customer_id: model.customer_id,
            delta: model.delta,
            running_total: model.running_total,
            notes: model.notes,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/customers/{id}/balance-entries` - Balance history in replay order.
async fn list_balance_entries(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let repo = LedgerRepository::new((*state.db).clone());

    match repo.amount_history(CustomerId::from_raw(id)).await {
        Ok(entries) => {
            let items: Vec<BalanceEntryResponse> =
                entries.into_iter().map(BalanceEntryResponse::from).collect();
            (StatusCode::OK, Json(json!({ "data": items }))).into_response()
        }
        Err(e) => ledger_error(&e),
    }
}

/// POST `/customers/{id}/balance-entries` - Append a balance entry.
async fn create_balance_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateBalanceEntryRequest>,
) -> impl IntoResponse {
    let Ok(delta) = Decimal::from_str(&payload.delta) else {
        return app_error(&AppError::Validation(
            "Delta must be a decimal number".into(),
        ));
    };

    let change_type = match payload.change_type.as_deref() {
        None => None,
        Some(raw) => match ChangeType::from_str(raw) {
            Ok(ct) => Some(ct),
            Err(e) => return app_error(&AppError::Validation(e)),
        },
    };

    let repo = LedgerRepository::new((*state.db).clone());
    let meta = AmountChangeMeta {
        change_type,
        notes: payload.notes,
        source: None,
    };

    match repo
        .record_amount_change(CustomerId::from_raw(id), delta, meta)
        .await
    {
        Ok(entry) => {
            (StatusCode::CREATED, Json(BalanceEntryResponse::from(entry))).into_response()
        }
        Err(e) => ledger_error(&e),
    }
}

/// DELETE `/balance-entries/{id}` - Delete a balance entry and cascade.
async fn delete_balance_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let repo = LedgerRepository::new((*state.db).clone());

    match repo.delete_amount_entry(AmountEntryId::from_raw(id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => ledger_error(&e),
    }
}

/// GET `/customers/{id}/credit-entries` - Credit history in replay order.
async fn list_credit_entries(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let repo = LedgerRepository::new((*state.db).clone());

    match repo.credit_history(CustomerId::from_raw(id)).await {
        Ok(entries) => {
            let items: Vec<CreditEntryResponse> =
                entries.into_iter().map(CreditEntryResponse::from).collect();
            (StatusCode::OK, Json(json!({ "data": items }))).into_response()
        }
        Err(e) => ledger_error(&e),
    }
}

/// POST `/customers/{id}/credit-entries` - Append a credit entry.
async fn create_credit_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateCreditEntryRequest>,
) -> impl IntoResponse {
    let repo = LedgerRepository::new((*state.db).clone());

    match repo
        .record_credit_change(CustomerId::from_raw(id), payload.delta, payload.notes)
        .await
    {
        Ok(entry) => {
            (StatusCode::CREATED, Json(CreditEntryResponse::from(entry))).into_response()
        }
        Err(e) => ledger_error(&e),
    }
}

/// DELETE `/credit-entries/{id}` - Delete a credit entry and cascade.
async fn delete_credit_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let repo = LedgerRepository::new((*state.db).clone());

    match repo.delete_credit_entry(CreditEntryId::from_raw(id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => ledger_error(&e),
    }
}

/// Translates a ledger error into a JSON error response.
pub(crate) fn ledger_error(e: &LedgerError) -> Response {
    let status = StatusCode::from_u16(e.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status.is_server_error() {
        error!(error = %e, "Ledger operation failed");
        return (
            status,
            Json(json!({
                "error": e.error_code(),
                "message": "An error occurred"
            })),
        )
            .into_response();
    }

    (
        status,
        Json(json!({
            "error": e.error_code(),
            "message": e.to_string()
        })),
    )
        .into_response()
}

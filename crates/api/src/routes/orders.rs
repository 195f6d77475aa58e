//! Insurance and service order routes.
//!
//! Both resources share one table; the path segment fixes the order kind.
//! `PATCH` with a `paid` flag is the business event that triggers (or
//! retracts) the city-partner payout.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::error;

use crate::AppState;
use crate::routes::ledger::ledger_error;
use crate::routes::{app_error, internal_error};
use autocare_db::entities::orders;
use autocare_db::entities::sea_orm_active_enums::OrderKind;
use autocare_db::repositories::order::{CreateOrderInput, OrderError, OrderRepository};
use autocare_shared::AppError;
use autocare_shared::types::{CustomerId, OrderId, PageRequest, PageResponse};

/// Creates the order routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/insurance-orders",
            get(list_insurance_orders).post(create_insurance_order),
        )
        .route("/insurance-orders/{id}", patch(patch_insurance_order))
        .route(
            "/service-orders",
            get(list_service_orders).post(create_service_order),
        )
        .route("/service-orders/{id}", patch(patch_service_order))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating an order.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// The customer the order is sold to.
    pub customer_id: i64,
    /// The referring city partner, if any.
    pub partner_id: Option<i64>,
    /// Order total, e.g. `"4500.00"`.
    pub total_price: String,
    /// Business date of the order (YYYY-MM-DD).
    pub record_date: NaiveDate,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Request body for updating an order's paid flag.
#[derive(Debug, Deserialize)]
pub struct PatchOrderRequest {
    /// Target paid state.
    pub paid: bool,
}

/// Response for an order.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    /// Order ID.
    pub id: i64,
    /// Insurance or service.
    pub kind: &'static str,
    /// Customer ID.
    pub customer_id: i64,
    /// Referring partner ID.
    pub partner_id: Option<i64>,
    /// Order total.
    pub total_price: String,
    /// Business date.
    pub record_date: String,
    /// Whether the order has been paid.
    pub paid: bool,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Created at timestamp.
    pub created_at: String,
}

impl From<orders::Model> for OrderResponse {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            kind: autocare_core::partner::PayoutKind::from(model.kind).as_str(),
            customer_id: model.customer_id,
            partner_id: model.partner_id,
            total_price: model.total_price.to_string(),
            record_date: model.record_date.to_string(),
            paid: model.paid,
            notes: model.notes,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn list_insurance_orders(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> impl IntoResponse {
    list_orders(state, OrderKind::Insurance, page).await
}

async fn list_service_orders(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> impl IntoResponse {
    list_orders(state, OrderKind::Service, page).await
}

async fn create_insurance_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> impl IntoResponse {
    create_order(state, OrderKind::Insurance, payload).await
}

async fn create_service_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> impl IntoResponse {
    create_order(state, OrderKind::Service, payload).await
}

async fn patch_insurance_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<PatchOrderRequest>,
) -> impl IntoResponse {
    patch_order(state, OrderKind::Insurance, id, payload).await
}

async fn patch_service_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<PatchOrderRequest>,
) -> impl IntoResponse {
    patch_order(state, OrderKind::Service, id, payload).await
}

/// Shared implementation of `GET /{kind}-orders`.
async fn list_orders(state: AppState, kind: OrderKind, page: PageRequest) -> Response {
    let repo = OrderRepository::new((*state.db).clone());

    match repo.list(kind, &page).await {
        Ok((orders, total)) => {
            let items: Vec<OrderResponse> =
                orders.into_iter().map(OrderResponse::from).collect();
            let response = PageResponse::new(items, page.page, page.per_page, total);
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list orders");
            internal_error()
        }
    }
}

/// Shared implementation of `POST /{kind}-orders`.
async fn create_order(state: AppState, kind: OrderKind, payload: CreateOrderRequest) -> Response {
    let Ok(total_price) = Decimal::from_str(&payload.total_price) else {
        return app_error(&AppError::Validation(
            "Total price must be a decimal number".into(),
        ));
    };
    if total_price < Decimal::ZERO {
        return app_error(&AppError::Validation(
            "Total price must not be negative".into(),
        ));
    }

    let repo = OrderRepository::new((*state.db).clone());
    match repo
        .create(CreateOrderInput {
            kind,
            customer_id: CustomerId::from_raw(payload.customer_id),
            partner_id: payload.partner_id.map(CustomerId::from_raw),
            total_price,
            record_date: payload.record_date,
            notes: payload.notes,
        })
        .await
    {
        Ok(order) => (StatusCode::CREATED, Json(OrderResponse::from(order))).into_response(),
        Err(e) => order_error(&e),
    }
}

/// Shared implementation of `PATCH /{kind}-orders/{id}`.
///
/// Setting `paid` synchronizes the partner payout before the flag changes;
/// a failed ledger write leaves the order untouched.
async fn patch_order(
    state: AppState,
    kind: OrderKind,
    id: i64,
    payload: PatchOrderRequest,
) -> Response {
    let repo = OrderRepository::new((*state.db).clone());

    // The path segment must match the order's actual kind.
    match repo.find_by_id(OrderId::from_raw(id)).await {
        Ok(Some(order)) if order.kind == kind => {}
        Ok(_) => return order_error(&OrderError::NotFound(id)),
        Err(e) => return order_error(&e),
    }

    match repo.set_paid(OrderId::from_raw(id), payload.paid).await {
        Ok(order) => (StatusCode::OK, Json(OrderResponse::from(order))).into_response(),
        Err(e) => order_error(&e),
    }
}

/// Translates an order error into a JSON error response.
fn order_error(e: &OrderError) -> Response {
    match e {
        OrderError::NotFound(id) => app_error(&AppError::NotFound(format!("Order {id}"))),
        OrderError::CustomerNotFound(id) => {
            app_error(&AppError::NotFound(format!("Customer {id}")))
        }
        OrderError::NotAPartner(_) => app_error(&AppError::BusinessRule(e.to_string())),
        OrderError::Ledger(inner) => ledger_error(inner),
        OrderError::Database(inner) => {
            error!(error = %inner, "Order operation failed");
            internal_error()
        }
    }
}

//! Customer directory routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::AppState;
use crate::routes::{app_error, internal_error};
use autocare_db::entities::customers;
use autocare_db::repositories::customer::{
    CreateCustomerInput, CustomerError, CustomerRepository,
};
use autocare_shared::AppError;
use autocare_shared::types::{CustomerId, PageRequest, PageResponse};

/// Creates the customer routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route("/customers/{id}", get(get_customer))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a customer.
#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    /// Customer name.
    pub name: String,
    /// Mobile phone number.
    pub mobile: String,
    /// Whether the customer is a city partner.
    #[serde(default)]
    pub is_partner: bool,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Response for a customer.
#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    /// Customer ID.
    pub id: i64,
    /// Customer name.
    pub name: String,
    /// Mobile phone number.
    pub mobile: String,
    /// Whether the customer is a city partner.
    pub is_partner: bool,
    /// Current account balance.
    pub current_balance: String,
    /// Current credit points.
    pub current_credits: i64,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

impl From<customers::Model> for CustomerResponse {
    fn from(model: customers::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            mobile: model.mobile,
            is_partner: model.is_partner,
            current_balance: model.current_balance.to_string(),
            current_credits: model.current_credits,
            notes: model.notes,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/customers` - List customers.
async fn list_customers(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> impl IntoResponse {
    let repo = CustomerRepository::new((*state.db).clone());

    match repo.list(&page).await {
        Ok((customers, total)) => {
            let items: Vec<CustomerResponse> =
                customers.into_iter().map(CustomerResponse::from).collect();
            let response = PageResponse::new(items, page.page, page.per_page, total);
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list customers");
            internal_error()
        }
    }
}

/// POST `/customers` - Create a customer.
async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CreateCustomerRequest>,
) -> impl IntoResponse {
    if payload.name.trim().is_empty() || payload.mobile.trim().is_empty() {
        return app_error(&AppError::Validation(
            "Name and mobile are required".into(),
        ));
    }

    let repo = CustomerRepository::new((*state.db).clone());
    match repo
        .create(CreateCustomerInput {
            name: payload.name,
            mobile: payload.mobile,
            is_partner: payload.is_partner,
            notes: payload.notes,
        })
        .await
    {
        Ok(customer) => {
            (StatusCode::CREATED, Json(CustomerResponse::from(customer))).into_response()
        }
        Err(e @ CustomerError::AlreadyExists { .. }) => {
            app_error(&AppError::Conflict(e.to_string()))
        }
        Err(e) => {
            error!(error = %e, "Failed to create customer");
            internal_error()
        }
    }
}

/// GET `/customers/{id}` - Get a customer by id.
async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let repo = CustomerRepository::new((*state.db).clone());

    match repo.find_by_id(CustomerId::from_raw(id)).await {
        Ok(Some(customer)) => {
            (StatusCode::OK, Json(CustomerResponse::from(customer))).into_response()
        }
        Ok(None) => app_error(&AppError::NotFound(format!("Customer {id}"))),
        Err(e) => {
            error!(error = %e, "Failed to get customer");
            internal_error()
        }
    }
}

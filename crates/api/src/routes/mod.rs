//! API route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::AppState;
use autocare_shared::AppError;

pub mod customers;
pub mod health;
pub mod ledger;
pub mod orders;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(customers::routes())
        .merge(ledger::routes())
        .merge(orders::routes())
}

/// Translates an application error into a JSON error response.
pub(crate) fn app_error(e: &AppError) -> Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": e.error_code(),
            "message": e.to_string()
        })),
    )
        .into_response()
}

/// Generic 500 response; the cause goes to the log, not the client.
pub(crate) fn internal_error() -> Response {
    app_error(&AppError::Internal("An unexpected error occurred".into()))
}

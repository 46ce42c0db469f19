//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{
    AccountError, CartError, CatalogError, DomainError, InventoryError, OrderError,
};
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Caller is not signed in.
    Unauthorized(String),
    /// Domain logic error.
    Domain(DomainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    let status = match &err {
        DomainError::Cart(cart_err) => match cart_err {
            CartError::OutOfStock { .. } => StatusCode::BAD_REQUEST,
            CartError::InsufficientStock { .. } | CartError::ProductUnavailable { .. } => {
                StatusCode::CONFLICT
            }
        },
        DomainError::Inventory(inv_err) => match inv_err {
            InventoryError::ProductNotFound { .. } => StatusCode::NOT_FOUND,
            InventoryError::ProductUnpublished { .. }
            | InventoryError::InsufficientStock { .. } => StatusCode::CONFLICT,
        },
        DomainError::Order(order_err) => match order_err {
            OrderError::EmptyCart | OrderError::Validation(_) => StatusCode::BAD_REQUEST,
            OrderError::InvalidTransition { .. } => StatusCode::CONFLICT,
            OrderError::NotFound { .. } => StatusCode::NOT_FOUND,
            OrderError::SignInRequired => StatusCode::UNAUTHORIZED,
        },
        DomainError::Catalog(catalog_err) => match catalog_err {
            CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
            CatalogError::NotFound { .. } => StatusCode::NOT_FOUND,
        },
        DomainError::Account(account_err) => match account_err {
            AccountError::Validation(_) | AccountError::DuplicateIdentity { .. } => {
                StatusCode::BAD_REQUEST
            }
            AccountError::InvalidCredentials | AccountError::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            }
            AccountError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AccountError::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
        DomainError::Store(store_err) => match store_err {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::UniqueViolation { .. } => StatusCode::CONFLICT,
            e if e.is_transient() => {
                tracing::warn!(error = %e, "storage unavailable");
                return (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service temporarily unavailable".to_string(),
                );
            }
            e => {
                tracing::error!(error = %e, "storage failure");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                );
            }
        },
    };
    (status, err.to_string())
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        ApiError::Domain(err.into())
    }
}

//! Domain error types.

use common::{OrderStatus, ProductId, Role};
use store::StoreError;
use thiserror::Error;

use crate::accounts::Permission;

/// Errors from cart mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// Requested quantity was below one.
    #[error("Out of stock: requested quantity {requested} (must be at least 1)")]
    OutOfStock { requested: u32 },

    /// Requested quantity exceeds what is in stock.
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Product is missing or unpublished.
    #[error("Product unavailable: {product_id}")]
    ProductUnavailable { product_id: ProductId },
}

/// Errors from stock availability checks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: ProductId },

    #[error("Product not published: {product_id}")]
    ProductUnpublished { product_id: ProductId },

    #[error("Insufficient stock for {product_id}: available {available}")]
    InsufficientStock {
        product_id: ProductId,
        available: u32,
    },
}

/// Errors from placing and progressing orders.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// Checkout was attempted with no items.
    #[error("Cart is empty")]
    EmptyCart,

    /// Status change not allowed by the order state machine.
    #[error("Invalid transition: cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order not found: {order_id}")]
    NotFound { order_id: String },

    /// Checkout input failed validation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A guest cart tried to check out.
    #[error("Sign in required to place an order")]
    SignInRequired,
}

/// Errors from catalog management.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Product not found: {product_id}")]
    NotFound { product_id: ProductId },
}

/// Errors from registration, login and authorization.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Email or mobile already belongs to another account.
    #[error("An account with this {field} already exists")]
    DuplicateIdentity { field: String },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Role {role} is not allowed to {permission}")]
    Forbidden { role: Role, permission: Permission },

    /// Password hashing failed.
    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the storage layer.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Account error: {0}")]
    Account(#[from] AccountError),
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;

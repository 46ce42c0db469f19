//! Storage layer for the storefront.
//!
//! Repository traits for products, carts, wishlists, orders and users, with an
//! in-memory backend for tests and local runs, a PostgreSQL backend, and a
//! retrying decorator for transient failures.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod retry;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use retry::{RetryConfig, Retrying, with_retry};
pub use store::{
    CartRepository, CatalogStore, OrderRepository, StockDecrement, StorefrontStore,
    UserRepository, WishlistRepository,
};

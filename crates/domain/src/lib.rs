//! Domain layer for the storefront.
//!
//! This crate provides the storefront's business rules:
//! - Pricing of carts (subtotal, discount, shipping, grand total)
//! - Per-identity carts with stock ceilings
//! - The inventory guard and checkout-time stock decrement
//! - Order placement and the order status state machine
//! - Catalog management and browsing, wishlists, accounts with roles,
//!   notifications and reports

pub mod accounts;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod inventory;
pub mod notification;
pub mod order;
pub mod pricing;
pub mod reports;
pub mod wishlist;

#[cfg(test)]
mod testing;

pub use accounts::{AccountService, Permission, Registration, authorize, role_allows};
pub use cart::{CartLineView, CartService, CartSummary};
pub use catalog::{CatalogService, MAX_PRICE, MAX_STOCK, ProductInput, ProductQuery, ProductSort};
pub use error::{
    AccountError, CartError, CatalogError, DomainError, InventoryError, OrderError, Result,
};
pub use inventory::{DecrementReport, InventoryGuard, Shortfall};
pub use notification::{
    DeliveryError, InMemoryNotificationSink, LogNotificationSink, NotificationSink, Notifier,
};
pub use order::{OrderService, OrderSettings, PlacedOrder};
pub use pricing::{ShippingRates, Totals};
pub use reports::{
    CustomerSummary, InventorySummary, ReportService, StoreStats, customer_total_spent,
};
pub use wishlist::WishlistService;

//! Shared types for the storefront: identifiers, money, and the records that
//! flow between the store, domain and API layers.

pub mod cart;
pub mod money;
pub mod order;
pub mod product;
pub mod types;
pub mod user;
pub mod wishlist;

pub use cart::{Cart, CartLineItem};
pub use money::Money;
pub use order::{
    Address, Order, OrderLineItem, OrderStatus, PaymentMethod, ShippingMethod,
};
pub use product::{Product, ProductStatus, slugify};
pub use types::{IdentityKey, InvalidIdentityKey, OrderId, ProductId, UserId};
pub use user::{Role, User};
pub use wishlist::Wishlist;

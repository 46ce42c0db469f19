use async_trait::async_trait;
use common::{
    Cart, IdentityKey, Money, Order, OrderId, Product, ProductId, User, UserId, Wishlist,
};

use crate::Result;

/// Outcome of an atomic compare-and-decrement on a product's stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDecrement {
    /// Stock was at least the requested quantity and has been reduced.
    Applied { remaining: u32 },
    /// Stock was below the requested quantity; nothing changed.
    Insufficient { available: u32 },
    /// The product no longer exists.
    Missing,
}

/// Product catalog storage.
///
/// Reads back products exactly as stored; `list_published` is the only
/// filtered view.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Retrieves a product by ID.
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>>;

    /// Lists every product regardless of status, oldest first.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Lists published products, oldest first.
    async fn list_published(&self) -> Result<Vec<Product>>;

    /// Inserts a new product. Fails with `UniqueViolation` on a duplicate ID or SKU.
    async fn insert_product(&self, product: Product) -> Result<()>;

    /// Replaces an existing product. Fails with `NotFound` if it does not exist.
    async fn update_product(&self, product: Product) -> Result<()>;

    /// Deletes a product. Returns true if it existed.
    async fn delete_product(&self, id: &ProductId) -> Result<bool>;

    /// Decrements stock by `quantity` only if `stock >= quantity`.
    ///
    /// The check and the write happen as one step per product row, so two
    /// concurrent callers can never both take the last unit.
    async fn try_decrement_stock(&self, id: &ProductId, quantity: u32) -> Result<StockDecrement>;

    /// Counts all products.
    async fn count_products(&self) -> Result<u64>;
}

/// Durable cart storage keyed by identity.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Loads the cart for an identity, if one was ever saved.
    async fn load_cart(&self, identity: &IdentityKey) -> Result<Option<Cart>>;

    /// Saves the full cart, replacing whatever was stored for its identity.
    async fn save_cart(&self, cart: &Cart) -> Result<()>;

    /// Drops the stored cart for an identity. Returns true if one existed.
    async fn evict_cart(&self, identity: &IdentityKey) -> Result<bool>;
}

/// Wishlist storage keyed by user.
#[async_trait]
pub trait WishlistRepository: Send + Sync {
    /// Loads a user's wishlist, if one was ever saved.
    async fn load_wishlist(&self, user_id: &UserId) -> Result<Option<Wishlist>>;

    /// Saves the full wishlist, replacing whatever was stored for its user.
    async fn save_wishlist(&self, wishlist: &Wishlist) -> Result<()>;
}

/// Order storage.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts an order, or updates status, tracking code and `updated_at`
    /// of an existing one.
    async fn save_order(&self, order: &Order) -> Result<()>;

    /// Retrieves an order by ID.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists a user's orders, newest first.
    async fn list_orders_by_user(&self, user_id: &UserId) -> Result<Vec<Order>>;

    /// Lists all orders, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>>;

    /// Counts all orders.
    async fn count_orders(&self) -> Result<u64>;

    /// Sums the totals of all orders that were not cancelled.
    async fn total_revenue(&self) -> Result<Money>;
}

/// User account storage.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user. Fails with `UniqueViolation` on a duplicate email or mobile.
    async fn insert_user(&self, user: User) -> Result<()>;

    /// Retrieves a user by ID.
    async fn get_user(&self, id: &UserId) -> Result<Option<User>>;

    /// Finds a user by email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Finds a user by mobile number.
    async fn find_user_by_mobile(&self, mobile: &str) -> Result<Option<User>>;

    /// Counts all users.
    async fn count_users(&self) -> Result<u64>;
}

/// A backend that provides every storefront repository.
pub trait StorefrontStore:
    CatalogStore
    + CartRepository
    + WishlistRepository
    + OrderRepository
    + UserRepository
    + Clone
    + 'static
{
}

impl<T> StorefrontStore for T where
    T: CatalogStore
        + CartRepository
        + WishlistRepository
        + OrderRepository
        + UserRepository
        + Clone
        + 'static
{
}

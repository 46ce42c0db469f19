//! Retry with exponential backoff for transient storage failures.
//!
//! [`Retrying`] wraps any store and retries operations that fail with a
//! transient error. Business errors (not found, duplicates) and successes
//! are returned immediately.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use common::{
    Cart, IdentityKey, Money, Order, OrderId, Product, ProductId, User, UserId, Wishlist,
};

use crate::{
    Result,
    store::{
        CartRepository, CatalogStore, OrderRepository, StockDecrement, UserRepository,
        WishlistRepository,
    },
};

/// Retry behavior for storage calls.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt; total attempts are `max_retries + 1`.
    pub max_retries: u32,
    /// Delay before the first retry. Doubles on each subsequent retry.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryConfig {
    /// Returns the delay before retry number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Runs `op`, retrying transient failures according to `config`.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, op_name: &'static str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < config.max_retries => {
                let delay = config.delay_for(attempt);
                tracing::warn!(
                    operation = op_name,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient storage failure, retrying"
                );
                metrics::counter!("store_retries_total", "operation" => op_name).increment(1);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// A store decorator that retries transient failures.
///
/// `try_decrement_stock` is passed through without retry: a lost response
/// after a successful decrement must not take stock twice.
#[derive(Clone)]
pub struct Retrying<S> {
    inner: S,
    config: RetryConfig,
}

impl<S> Retrying<S> {
    /// Wraps a store with the given retry configuration.
    pub fn new(inner: S, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: CatalogStore> CatalogStore for Retrying<S> {
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>> {
        with_retry(&self.config, "get_product", || self.inner.get_product(id)).await
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        with_retry(&self.config, "list_products", || self.inner.list_products()).await
    }

    async fn list_published(&self) -> Result<Vec<Product>> {
        with_retry(&self.config, "list_published", || self.inner.list_published()).await
    }

    async fn insert_product(&self, product: Product) -> Result<()> {
        with_retry(&self.config, "insert_product", || {
            self.inner.insert_product(product.clone())
        })
        .await
    }

    async fn update_product(&self, product: Product) -> Result<()> {
        with_retry(&self.config, "update_product", || {
            self.inner.update_product(product.clone())
        })
        .await
    }

    async fn delete_product(&self, id: &ProductId) -> Result<bool> {
        with_retry(&self.config, "delete_product", || self.inner.delete_product(id)).await
    }

    async fn try_decrement_stock(&self, id: &ProductId, quantity: u32) -> Result<StockDecrement> {
        self.inner.try_decrement_stock(id, quantity).await
    }

    async fn count_products(&self) -> Result<u64> {
        with_retry(&self.config, "count_products", || self.inner.count_products()).await
    }
}

#[async_trait]
impl<S: CartRepository> CartRepository for Retrying<S> {
    async fn load_cart(&self, identity: &IdentityKey) -> Result<Option<Cart>> {
        with_retry(&self.config, "load_cart", || self.inner.load_cart(identity)).await
    }

    async fn save_cart(&self, cart: &Cart) -> Result<()> {
        with_retry(&self.config, "save_cart", || self.inner.save_cart(cart)).await
    }

    async fn evict_cart(&self, identity: &IdentityKey) -> Result<bool> {
        with_retry(&self.config, "evict_cart", || self.inner.evict_cart(identity)).await
    }
}

#[async_trait]
impl<S: WishlistRepository> WishlistRepository for Retrying<S> {
    async fn load_wishlist(&self, user_id: &UserId) -> Result<Option<Wishlist>> {
        with_retry(&self.config, "load_wishlist", || self.inner.load_wishlist(user_id)).await
    }

    async fn save_wishlist(&self, wishlist: &Wishlist) -> Result<()> {
        with_retry(&self.config, "save_wishlist", || self.inner.save_wishlist(wishlist)).await
    }
}

#[async_trait]
impl<S: OrderRepository> OrderRepository for Retrying<S> {
    async fn save_order(&self, order: &Order) -> Result<()> {
        with_retry(&self.config, "save_order", || self.inner.save_order(order)).await
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        with_retry(&self.config, "get_order", || self.inner.get_order(id)).await
    }

    async fn list_orders_by_user(&self, user_id: &UserId) -> Result<Vec<Order>> {
        with_retry(&self.config, "list_orders_by_user", || {
            self.inner.list_orders_by_user(user_id)
        })
        .await
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        with_retry(&self.config, "list_orders", || self.inner.list_orders()).await
    }

    async fn count_orders(&self) -> Result<u64> {
        with_retry(&self.config, "count_orders", || self.inner.count_orders()).await
    }

    async fn total_revenue(&self) -> Result<Money> {
        with_retry(&self.config, "total_revenue", || self.inner.total_revenue()).await
    }
}

#[async_trait]
impl<S: UserRepository> UserRepository for Retrying<S> {
    async fn insert_user(&self, user: User) -> Result<()> {
        with_retry(&self.config, "insert_user", || self.inner.insert_user(user.clone())).await
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        with_retry(&self.config, "get_user", || self.inner.get_user(id)).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        with_retry(&self.config, "find_user_by_email", || {
            self.inner.find_user_by_email(email)
        })
        .await
    }

    async fn find_user_by_mobile(&self, mobile: &str) -> Result<Option<User>> {
        with_retry(&self.config, "find_user_by_mobile", || {
            self.inner.find_user_by_mobile(mobile)
        })
        .await
    }

    async fn count_users(&self) -> Result<u64> {
        with_retry(&self.config, "count_users", || self.inner.count_users()).await
    }
}

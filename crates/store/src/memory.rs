use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use common::{
    Cart, IdentityKey, Money, Order, OrderId, OrderStatus, Product, ProductId, User, UserId,
    Wishlist,
};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    store::{
        CartRepository, CatalogStore, OrderRepository, StockDecrement, UserRepository,
        WishlistRepository,
    },
};

#[derive(Default)]
struct State {
    products: HashMap<ProductId, Product>,
    carts: HashMap<String, Cart>,
    wishlists: HashMap<UserId, Wishlist>,
    orders: HashMap<OrderId, Order>,
    users: HashMap<UserId, User>,
}

/// In-memory storefront store.
///
/// Provides the same interface as the PostgreSQL implementation. Every
/// operation takes the shared lock once, so compare-and-decrement on stock is
/// atomic across concurrent tasks.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
    pending_failures: Arc<AtomicU32>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` operations fail with `StoreError::Unavailable`.
    pub fn fail_next(&self, count: u32) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    /// Clears all stored data.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        *state = State::default();
    }

    fn check_available(&self) -> Result<()> {
        let consumed = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if consumed.is_ok() {
            return Err(StoreError::Unavailable(
                "simulated connection failure".to_string(),
            ));
        }
        Ok(())
    }
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}

fn oldest_first(mut products: Vec<Product>) -> Vec<Product> {
    products.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    products
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state.products.get(id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(oldest_first(state.products.values().cloned().collect()))
    }

    async fn list_published(&self) -> Result<Vec<Product>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(oldest_first(
            state
                .products
                .values()
                .filter(|p| p.is_published())
                .cloned()
                .collect(),
        ))
    }

    async fn insert_product(&self, product: Product) -> Result<()> {
        self.check_available()?;
        let mut state = self.state.write().await;
        if state.products.contains_key(&product.id) {
            return Err(StoreError::UniqueViolation {
                field: "id".to_string(),
            });
        }
        if state.products.values().any(|p| p.sku == product.sku) {
            return Err(StoreError::UniqueViolation {
                field: "sku".to_string(),
            });
        }
        state.products.insert(product.id.clone(), product);
        Ok(())
    }

    async fn update_product(&self, product: Product) -> Result<()> {
        self.check_available()?;
        let mut state = self.state.write().await;
        match state.products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product;
                Ok(())
            }
            None => Err(StoreError::NotFound {
                entity: "Product",
                id: product.id.to_string(),
            }),
        }
    }

    async fn delete_product(&self, id: &ProductId) -> Result<bool> {
        self.check_available()?;
        let mut state = self.state.write().await;
        Ok(state.products.remove(id).is_some())
    }

    async fn try_decrement_stock(&self, id: &ProductId, quantity: u32) -> Result<StockDecrement> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let Some(product) = state.products.get_mut(id) else {
            return Ok(StockDecrement::Missing);
        };
        if product.stock < quantity {
            return Ok(StockDecrement::Insufficient {
                available: product.stock,
            });
        }
        product.stock -= quantity;
        product.updated_at = chrono::Utc::now();
        Ok(StockDecrement::Applied {
            remaining: product.stock,
        })
    }

    async fn count_products(&self) -> Result<u64> {
        self.check_available()?;
        Ok(self.state.read().await.products.len() as u64)
    }
}

#[async_trait]
impl CartRepository for InMemoryStore {
    async fn load_cart(&self, identity: &IdentityKey) -> Result<Option<Cart>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state.carts.get(&identity.storage_key()).cloned())
    }

    async fn save_cart(&self, cart: &Cart) -> Result<()> {
        self.check_available()?;
        let mut state = self.state.write().await;
        state
            .carts
            .insert(cart.identity.storage_key(), cart.clone());
        Ok(())
    }

    async fn evict_cart(&self, identity: &IdentityKey) -> Result<bool> {
        self.check_available()?;
        let mut state = self.state.write().await;
        Ok(state.carts.remove(&identity.storage_key()).is_some())
    }
}

#[async_trait]
impl WishlistRepository for InMemoryStore {
    async fn load_wishlist(&self, user_id: &UserId) -> Result<Option<Wishlist>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state.wishlists.get(user_id).cloned())
    }

    async fn save_wishlist(&self, wishlist: &Wishlist) -> Result<()> {
        self.check_available()?;
        let mut state = self.state.write().await;
        state
            .wishlists
            .insert(wishlist.user_id.clone(), wishlist.clone());
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn save_order(&self, order: &Order) -> Result<()> {
        self.check_available()?;
        let mut state = self.state.write().await;
        if let Some(existing) = state.orders.get_mut(&order.id) {
            existing.status = order.status;
            existing.tracking_code = order.tracking_code.clone();
            existing.updated_at = order.updated_at;
            return Ok(());
        }
        if state
            .orders
            .values()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(StoreError::UniqueViolation {
                field: "order_number".to_string(),
            });
        }
        state.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state.orders.get(&id).cloned())
    }

    async fn list_orders_by_user(&self, user_id: &UserId) -> Result<Vec<Order>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(newest_first(
            state
                .orders
                .values()
                .filter(|o| &o.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(newest_first(state.orders.values().cloned().collect()))
    }

    async fn count_orders(&self) -> Result<u64> {
        self.check_available()?;
        Ok(self.state.read().await.orders.len() as u64)
    }

    async fn total_revenue(&self) -> Result<Money> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .filter(|o| o.status != OrderStatus::Cancelled)
            .map(|o| o.total)
            .sum())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert_user(&self, user: User) -> Result<()> {
        self.check_available()?;
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation {
                field: "email".to_string(),
            });
        }
        if state.users.values().any(|u| u.mobile == user.mobile) {
            return Err(StoreError::UniqueViolation {
                field: "mobile".to_string(),
            });
        }
        state.users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state.users.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_mobile(&self, mobile: &str) -> Result<Option<User>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.mobile == mobile).cloned())
    }

    async fn count_users(&self) -> Result<u64> {
        self.check_available()?;
        Ok(self.state.read().await.users.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::{
        Address, CartLineItem, OrderLineItem, PaymentMethod, ProductStatus, Role, ShippingMethod,
    };

    fn product(id: &str, stock: u32) -> Product {
        Product {
            id: ProductId::new(id),
            sku: format!("SKU-{id}"),
            name: format!("Product {id}"),
            slug: id.to_string(),
            description: String::new(),
            brand: String::new(),
            category: String::new(),
            price: Money::new(1_000),
            discount_price: None,
            stock,
            main_image: String::new(),
            images: vec![],
            status: ProductStatus::Published,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn order(user: &str, number: &str, status: OrderStatus, total: i64) -> Order {
        Order {
            id: OrderId::new(),
            order_number: number.to_string(),
            user_id: UserId::new(user),
            items: vec![OrderLineItem {
                product_id: ProductId::new("p-1"),
                product_name: "Product".to_string(),
                product_image: String::new(),
                quantity: 1,
                unit_price: Money::new(total),
                unit_discount_price: None,
            }],
            subtotal: Money::new(total),
            discount: Money::zero(),
            shipping: Money::zero(),
            tax: Money::zero(),
            total: Money::new(total),
            status,
            payment_method: PaymentMethod::CashOnDelivery,
            shipping_method: ShippingMethod::Standard,
            shipping_address: Address::default(),
            tracking_code: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn user(id: &str, email: &str, mobile: &str) -> User {
        User {
            id: UserId::new(id),
            email: email.to_string(),
            mobile: mobile.to_string(),
            name: "Test".to_string(),
            password_hash: String::new(),
            role: Role::Customer,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_decrement_never_goes_negative() {
        let store = InMemoryStore::new();
        store.insert_product(product("p-1", 3)).await.unwrap();
        let id = ProductId::new("p-1");

        assert_eq!(
            store.try_decrement_stock(&id, 2).await.unwrap(),
            StockDecrement::Applied { remaining: 1 }
        );
        assert_eq!(
            store.try_decrement_stock(&id, 2).await.unwrap(),
            StockDecrement::Insufficient { available: 1 }
        );
        assert_eq!(
            store
                .try_decrement_stock(&ProductId::new("gone"), 1)
                .await
                .unwrap(),
            StockDecrement::Missing
        );
        assert_eq!(store.get_product(&id).await.unwrap().unwrap().stock, 1);
    }

    #[tokio::test]
    async fn test_concurrent_decrements_on_last_unit() {
        let store = InMemoryStore::new();
        store.insert_product(product("p-1", 1)).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .try_decrement_stock(&ProductId::new("p-1"), 1)
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut applied = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), StockDecrement::Applied { .. }) {
                applied += 1;
            }
        }
        assert_eq!(applied, 1);
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let store = InMemoryStore::new();
        store.insert_product(product("p-1", 1)).await.unwrap();
        let mut dup = product("p-2", 1);
        dup.sku = "SKU-p-1".to_string();

        let err = store.insert_product(dup).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { field } if field == "sku"));
    }

    #[tokio::test]
    async fn test_update_missing_product_is_not_found() {
        let store = InMemoryStore::new();
        let err = store.update_product(product("p-9", 1)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_carts_are_keyed_by_identity() {
        let store = InMemoryStore::new();
        let guest = IdentityKey::guest("s-1");
        let member = IdentityKey::user("s-1");
        let mut cart = Cart::empty(guest.clone());
        cart.items
            .push(CartLineItem::new("p-1", 1, Money::new(10), None));
        store.save_cart(&cart).await.unwrap();

        assert_eq!(store.load_cart(&guest).await.unwrap(), Some(cart));
        assert_eq!(store.load_cart(&member).await.unwrap(), None);

        assert!(store.evict_cart(&guest).await.unwrap());
        assert!(!store.evict_cart(&guest).await.unwrap());
    }

    #[tokio::test]
    async fn test_wishlists_are_keyed_by_user() {
        let store = InMemoryStore::new();
        let mut wishlist = Wishlist::empty(UserId::new("u-1"));
        wishlist.add(ProductId::new("p-1"));
        store.save_wishlist(&wishlist).await.unwrap();

        wishlist.add(ProductId::new("p-2"));
        store.save_wishlist(&wishlist).await.unwrap();

        let loaded = store.load_wishlist(&UserId::new("u-1")).await.unwrap();
        assert_eq!(loaded.map(|w| w.count()), Some(2));
        assert!(store.load_wishlist(&UserId::new("u-2")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_order_updates_only_mutable_fields() {
        let store = InMemoryStore::new();
        let original = order("u-1", "ORD-1", OrderStatus::Pending, 100);
        store.save_order(&original).await.unwrap();

        let mut changed = original.clone();
        changed.status = OrderStatus::Paid;
        changed.tracking_code = Some("TRK".to_string());
        changed.total = Money::new(999);
        store.save_order(&changed).await.unwrap();

        let loaded = store.get_order(original.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, OrderStatus::Paid);
        assert_eq!(loaded.tracking_code.as_deref(), Some("TRK"));
        assert_eq!(loaded.total, Money::new(100));
    }

    #[tokio::test]
    async fn test_revenue_excludes_cancelled() {
        let store = InMemoryStore::new();
        store
            .save_order(&order("u-1", "ORD-1", OrderStatus::Paid, 100))
            .await
            .unwrap();
        store
            .save_order(&order("u-1", "ORD-2", OrderStatus::Cancelled, 50))
            .await
            .unwrap();
        store
            .save_order(&order("u-2", "ORD-3", OrderStatus::Pending, 25))
            .await
            .unwrap();

        assert_eq!(store.total_revenue().await.unwrap(), Money::new(125));
        assert_eq!(store.count_orders().await.unwrap(), 3);
        assert_eq!(
            store
                .list_orders_by_user(&UserId::new("u-1"))
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_duplicate_email_and_mobile() {
        let store = InMemoryStore::new();
        store.insert_user(user("u-1", "a@x.io", "0912")).await.unwrap();

        let err = store
            .insert_user(user("u-2", "a@x.io", "0913"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { field } if field == "email"));

        let err = store
            .insert_user(user("u-3", "b@x.io", "0912"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { field } if field == "mobile"));

        assert!(store.find_user_by_mobile("0912").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_fail_next_injects_transient_errors() {
        let store = InMemoryStore::new();
        store.fail_next(2);

        assert!(store.count_products().await.unwrap_err().is_transient());
        assert!(store.count_products().await.unwrap_err().is_transient());
        assert_eq!(store.count_products().await.unwrap(), 0);
    }
}

//! Order service: checkout and status transitions.

use std::time::Instant;

use chrono::Utc;
use common::{
    Address, Cart, IdentityKey, Order, OrderId, OrderLineItem, OrderStatus, PaymentMethod,
    ShippingMethod, UserId,
};
use serde::Serialize;
use store::{CartRepository, CatalogStore, OrderRepository, StoreError};

use super::{DELETED_PRODUCT_NAME, PLACEHOLDER_IMAGE, generate_order_number, normalize_address};
use crate::error::{DomainError, OrderError, Result};
use crate::inventory::{DecrementReport, InventoryGuard};
use crate::notification::Notifier;
use crate::pricing::{ShippingRates, Totals};

const ORDER_NUMBER_ATTEMPTS: usize = 3;

/// Checkout settings.
#[derive(Debug, Clone)]
pub struct OrderSettings {
    pub rates: ShippingRates,
    /// Province used when the shipping address leaves it empty.
    pub default_province: String,
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self {
            rates: ShippingRates::default(),
            default_province: "Tehran".to_string(),
        }
    }
}

/// A freshly placed order and what happened to its stock.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order: Order,
    pub inventory: DecrementReport,
}

impl PlacedOrder {
    /// Human-readable shortfall warnings; empty when stock was fully committed.
    pub fn warnings(&self) -> Vec<String> {
        self.inventory
            .shortfalls
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}

/// Service for placing and progressing orders.
#[derive(Clone)]
pub struct OrderService<S> {
    store: S,
    inventory: InventoryGuard<S>,
    notifier: Notifier,
    settings: OrderSettings,
}

impl<S> OrderService<S>
where
    S: CatalogStore + CartRepository + OrderRepository + Clone,
{
    /// Creates a new order service over the given store.
    pub fn new(store: S, notifier: Notifier, settings: OrderSettings) -> Self {
        Self {
            inventory: InventoryGuard::new(store.clone()),
            store,
            notifier,
            settings,
        }
    }

    pub fn settings(&self) -> &OrderSettings {
        &self.settings
    }

    /// Places an order from the identity's cart.
    ///
    /// The order is saved before stock is decremented; lines the decrement
    /// cannot cover are reported in the result rather than failing checkout.
    /// The cart is cleared and admins are notified afterwards.
    #[tracing::instrument(skip(self, identity, shipping_address), fields(identity = %identity))]
    pub async fn create_order(
        &self,
        identity: &IdentityKey,
        shipping_address: Address,
        payment_method: PaymentMethod,
        shipping_method: ShippingMethod,
    ) -> Result<PlacedOrder> {
        let started = Instant::now();

        let cart = self
            .store
            .load_cart(identity)
            .await?
            .filter(|cart| !cart.is_empty())
            .ok_or(OrderError::EmptyCart)?;
        let user_id = identity
            .user_id()
            .cloned()
            .ok_or(OrderError::SignInRequired)?;
        let shipping_address = normalize_address(shipping_address, &self.settings.default_province)?;

        let mut items = Vec::with_capacity(cart.items.len());
        for line in &cart.items {
            let product = self.store.get_product(&line.product_id).await?;
            let (product_name, product_image) = match product {
                Some(p) if !p.main_image.is_empty() => (p.name, p.main_image),
                Some(p) => (p.name, PLACEHOLDER_IMAGE.to_string()),
                None => (
                    DELETED_PRODUCT_NAME.to_string(),
                    PLACEHOLDER_IMAGE.to_string(),
                ),
            };
            items.push(OrderLineItem {
                product_id: line.product_id.clone(),
                product_name,
                product_image,
                quantity: line.quantity,
                unit_price: line.unit_price,
                unit_discount_price: line.unit_discount_price,
            });
        }

        let totals = Totals::compute(&cart.items, shipping_method, &self.settings.rates);
        let now = Utc::now();
        let mut order = Order {
            id: OrderId::new(),
            order_number: generate_order_number(now),
            user_id,
            items,
            subtotal: totals.subtotal,
            discount: totals.discount,
            shipping: totals.shipping,
            tax: totals.tax,
            total: totals.grand_total,
            status: payment_method.initial_status(),
            payment_method,
            shipping_method,
            shipping_address,
            tracking_code: None,
            created_at: now,
            updated_at: now,
        };
        self.insert_with_unique_number(&mut order).await?;

        let lines: Vec<_> = order
            .items
            .iter()
            .map(|item| (item.product_id.clone(), item.quantity))
            .collect();
        let inventory = self.inventory.commit_decrement(&lines).await?;

        self.store
            .save_cart(&Cart::empty(identity.clone()))
            .await?;

        metrics::counter!("orders_created_total", "payment_method" => payment_method.as_str())
            .increment(1);
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = order.total.amount(),
            status = %order.status,
            shortfalls = inventory.shortfalls.len(),
            "Order placed"
        );

        self.notifier.order_placed(&order).await;

        Ok(PlacedOrder { order, inventory })
    }

    async fn insert_with_unique_number(&self, order: &mut Order) -> Result<()> {
        let mut attempt = 1;
        loop {
            match self.store.save_order(order).await {
                Ok(()) => return Ok(()),
                Err(StoreError::UniqueViolation { ref field })
                    if field == "order_number" && attempt < ORDER_NUMBER_ATTEMPTS =>
                {
                    order.order_number = generate_order_number(Utc::now());
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Moves an order to a new status, optionally recording a tracking code.
    #[tracing::instrument(skip(self))]
    pub async fn transition(
        &self,
        order_id: OrderId,
        to: OrderStatus,
        tracking_code: Option<String>,
    ) -> Result<Order> {
        let mut order = self.get(order_id).await?;

        if !order.status.can_transition_to(to) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to,
            }
            .into());
        }

        let from = order.status;
        order.status = to;
        order.updated_at = Utc::now();
        if let Some(code) = tracking_code.filter(|c| !c.trim().is_empty()) {
            order.tracking_code = Some(code);
        }
        self.store.save_order(&order).await?;

        tracing::info!(order_id = %order.id, %from, %to, "Order status changed");
        Ok(order)
    }

    /// Retrieves an order.
    pub async fn get(&self, order_id: OrderId) -> Result<Order> {
        self.store.get_order(order_id).await?.ok_or_else(|| {
            DomainError::Order(OrderError::NotFound {
                order_id: order_id.to_string(),
            })
        })
    }

    /// Lists a user's orders, newest first.
    pub async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Order>> {
        Ok(self.store.list_orders_by_user(user_id).await?)
    }

    /// Lists every order, newest first.
    pub async fn list_all(&self) -> Result<Vec<Order>> {
        Ok(self.store.list_orders().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartService;
    use crate::notification::InMemoryNotificationSink;
    use crate::testing::product;
    use common::{Money, ProductId};
    use std::sync::Arc;
    use store::InMemoryStore;

    fn address() -> Address {
        Address {
            full_name: "Sara".to_string(),
            mobile: "09120000000".to_string(),
            province: String::new(),
            city: "Tehran".to_string(),
            address: "Street 1".to_string(),
            postal_code: "1234567890".to_string(),
        }
    }

    struct Fixture {
        store: InMemoryStore,
        carts: CartService<InMemoryStore>,
        orders: OrderService<InMemoryStore>,
        sink: InMemoryNotificationSink,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        store
            .insert_product(product("case", 100_000, 10))
            .await
            .unwrap();
        let sink = InMemoryNotificationSink::new();
        let notifier = Notifier::new(Arc::new(sink.clone()), vec!["admin".to_string()]);
        Fixture {
            carts: CartService::new(store.clone(), ShippingRates::default()),
            orders: OrderService::new(store.clone(), notifier, OrderSettings::default()),
            store,
            sink,
        }
    }

    fn member() -> IdentityKey {
        IdentityKey::user("u-1")
    }

    #[tokio::test]
    async fn test_empty_cart_cannot_check_out() {
        let f = fixture().await;
        let err = f
            .orders
            .create_order(&member(), address(), PaymentMethod::Online, ShippingMethod::Standard)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Order(OrderError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_guest_cart_cannot_check_out() {
        let f = fixture().await;
        let guest = IdentityKey::guest("s-1");
        f.carts
            .add_item(&guest, &ProductId::new("case"), 1)
            .await
            .unwrap();

        let err = f
            .orders
            .create_order(&guest, address(), PaymentMethod::Online, ShippingMethod::Standard)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Order(OrderError::SignInRequired)));
    }

    #[tokio::test]
    async fn test_create_then_get_matches() {
        let f = fixture().await;
        f.carts
            .add_item(&member(), &ProductId::new("case"), 2)
            .await
            .unwrap();

        let placed = f
            .orders
            .create_order(&member(), address(), PaymentMethod::Online, ShippingMethod::Fast)
            .await
            .unwrap();
        let loaded = f.orders.get(placed.order.id).await.unwrap();

        assert_eq!(loaded.items, placed.order.items);
        assert_eq!(loaded.total, Money::new(250_000));
        assert_eq!(loaded.status, OrderStatus::Paid);
        assert_eq!(loaded.shipping_address.province, "Tehran");
        assert!(placed.warnings().is_empty());
        assert!(f.carts.get(&member()).await.unwrap().is_empty());
        assert_eq!(f.sink.delivered().len(), 1);
    }

    #[tokio::test]
    async fn test_deleted_product_gets_placeholder() {
        let f = fixture().await;
        f.carts
            .add_item(&member(), &ProductId::new("case"), 1)
            .await
            .unwrap();
        f.store.delete_product(&ProductId::new("case")).await.unwrap();

        let placed = f
            .orders
            .create_order(
                &member(),
                address(),
                PaymentMethod::CashOnDelivery,
                ShippingMethod::Standard,
            )
            .await
            .unwrap();

        let line = &placed.order.items[0];
        assert_eq!(line.product_name, DELETED_PRODUCT_NAME);
        assert_eq!(line.product_image, PLACEHOLDER_IMAGE);
        assert_eq!(placed.order.status, OrderStatus::Pending);
        assert_eq!(placed.inventory.shortfalls.len(), 1);
        assert_eq!(placed.warnings().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_address_rejected_before_saving() {
        let f = fixture().await;
        f.carts
            .add_item(&member(), &ProductId::new("case"), 1)
            .await
            .unwrap();
        let mut bad = address();
        bad.mobile = String::new();

        let err = f
            .orders
            .create_order(&member(), bad, PaymentMethod::Online, ShippingMethod::Standard)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Order(OrderError::Validation(_))));
        assert_eq!(f.store.count_orders().await.unwrap(), 0);
        assert!(!f.carts.get(&member()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transitions() {
        let f = fixture().await;
        f.carts
            .add_item(&member(), &ProductId::new("case"), 1)
            .await
            .unwrap();
        let placed = f
            .orders
            .create_order(
                &member(),
                address(),
                PaymentMethod::CashOnDelivery,
                ShippingMethod::Standard,
            )
            .await
            .unwrap();
        let id = placed.order.id;

        let err = f
            .orders
            .transition(id, OrderStatus::Shipped, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Order(OrderError::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Shipped
            })
        ));

        for to in [
            OrderStatus::Paid,
            OrderStatus::Preparing,
            OrderStatus::Shipped,
            OrderStatus::InDelivery,
            OrderStatus::Delivered,
        ] {
            let tracking = (to == OrderStatus::Shipped).then(|| "TRK-42".to_string());
            f.orders.transition(id, to, tracking).await.unwrap();
        }

        let delivered = f.orders.get(id).await.unwrap();
        assert_eq!(delivered.tracking_code.as_deref(), Some("TRK-42"));
        assert!(f
            .orders
            .transition(id, OrderStatus::Cancelled, None)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let f = fixture().await;
        let err = f.orders.get(OrderId::new()).await.unwrap_err();
        assert!(matches!(err, DomainError::Order(OrderError::NotFound { .. })));
    }
}

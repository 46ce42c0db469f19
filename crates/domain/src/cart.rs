//! Per-identity carts.
//!
//! Every mutation loads the identity's cart, checks the live catalog, and
//! saves the whole cart back before returning. Prices are captured when a
//! product is first added and are not refreshed afterwards.

use common::{Cart, CartLineItem, IdentityKey, Money, ProductId, ShippingMethod};
use serde::Serialize;
use store::{CartRepository, CatalogStore};

use crate::error::{CartError, DomainError, InventoryError, Result};
use crate::inventory::InventoryGuard;
use crate::pricing::{ShippingRates, Totals};

/// A cart line joined with live catalog data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    #[serde(flatten)]
    pub line: CartLineItem,
    pub product_name: Option<String>,
    pub main_image: Option<String>,
    /// False when the product is gone, unpublished or out of stock.
    pub available: bool,
    /// Current catalog stock; `None` when the product is gone.
    pub stock: Option<u32>,
    pub line_total: Money,
}

/// A priced cart for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub identity: IdentityKey,
    pub items: Vec<CartLineView>,
    pub item_count: u32,
    pub shipping_method: ShippingMethod,
    pub totals: Totals,
}

/// Cart operations over an injected cart repository and catalog.
#[derive(Clone)]
pub struct CartService<S> {
    store: S,
    inventory: InventoryGuard<S>,
    rates: ShippingRates,
}

/// Restates an inventory refusal for a cart line of `requested` units.
fn cart_refusal(err: DomainError, requested: u32) -> DomainError {
    match err {
        DomainError::Inventory(
            InventoryError::ProductNotFound { product_id }
            | InventoryError::ProductUnpublished { product_id },
        ) => CartError::ProductUnavailable { product_id }.into(),
        DomainError::Inventory(InventoryError::InsufficientStock {
            product_id,
            available,
        }) => CartError::InsufficientStock {
            product_id,
            requested,
            available,
        }
        .into(),
        other => other,
    }
}

impl<S: CatalogStore + CartRepository + Clone> CartService<S> {
    pub fn new(store: S, rates: ShippingRates) -> Self {
        Self {
            inventory: InventoryGuard::new(store.clone()),
            store,
            rates,
        }
    }

    pub fn rates(&self) -> &ShippingRates {
        &self.rates
    }

    /// Returns the identity's cart, empty if none was saved yet.
    pub async fn get(&self, identity: &IdentityKey) -> Result<Cart> {
        Ok(self
            .store
            .load_cart(identity)
            .await?
            .unwrap_or_else(|| Cart::empty(identity.clone())))
    }

    async fn save(&self, cart: &Cart, op: &'static str) -> Result<()> {
        self.store.save_cart(cart).await?;
        metrics::counter!("cart_mutations_total", "op" => op).increment(1);
        Ok(())
    }

    /// Adds `quantity` units of a product, merging with an existing line.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        identity: &IdentityKey,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart> {
        if quantity < 1 {
            return Err(CartError::OutOfStock {
                requested: quantity,
            }
            .into());
        }

        let mut cart = self.get(identity).await?;
        let existing = cart.line(product_id).map(|l| l.quantity).unwrap_or(0);
        let wanted = existing.saturating_add(quantity);

        let product = self
            .inventory
            .check_availability(product_id, wanted)
            .await
            .map_err(|e| cart_refusal(e, wanted))?;

        match cart.line_mut(product_id) {
            Some(line) => line.quantity = wanted,
            None => cart.items.push(CartLineItem::new(
                product_id.clone(),
                quantity,
                product.price,
                product.discount_price,
            )),
        }

        self.save(&cart, "add").await?;
        Ok(cart)
    }

    /// Sets a line's quantity. Zero or below removes the line.
    ///
    /// Raising the quantity needs the product to still be published; lowering
    /// it works even for products that were unpublished or deleted. A product
    /// that is not in the cart is left alone.
    #[tracing::instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        identity: &IdentityKey,
        product_id: &ProductId,
        new_quantity: i64,
    ) -> Result<Cart> {
        if new_quantity <= 0 {
            return self.remove_item(identity, product_id).await;
        }
        let new_quantity = u32::try_from(new_quantity).unwrap_or(u32::MAX);

        let mut cart = self.get(identity).await?;
        let Some(current) = cart.line(product_id).map(|l| l.quantity) else {
            return Ok(cart);
        };
        let increasing = new_quantity > current;

        match self
            .inventory
            .check_availability(product_id, new_quantity)
            .await
        {
            Ok(_) => {}
            Err(DomainError::Inventory(
                InventoryError::ProductNotFound { .. } | InventoryError::ProductUnpublished { .. },
            )) if !increasing => {}
            Err(e) => return Err(cart_refusal(e, new_quantity)),
        }

        if let Some(line) = cart.line_mut(product_id) {
            line.quantity = new_quantity;
        }
        self.save(&cart, "update").await?;
        Ok(cart)
    }

    /// Removes a product's line. Removing an absent line is not an error.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, identity: &IdentityKey, product_id: &ProductId) -> Result<Cart> {
        let mut cart = self.get(identity).await?;
        cart.remove(product_id);
        self.save(&cart, "remove").await?;
        Ok(cart)
    }

    /// Empties the cart. The cart itself stays.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, identity: &IdentityKey) -> Result<Cart> {
        let cart = Cart::empty(identity.clone());
        self.save(&cart, "clear").await?;
        Ok(cart)
    }

    /// Drops the stored cart for an idle identity.
    #[tracing::instrument(skip(self))]
    pub async fn evict(&self, identity: &IdentityKey) -> Result<bool> {
        Ok(self.store.evict_cart(identity).await?)
    }

    /// Prices the cart and marks each line's availability against the catalog.
    #[tracing::instrument(skip(self))]
    pub async fn summary(
        &self,
        identity: &IdentityKey,
        shipping_method: ShippingMethod,
    ) -> Result<CartSummary> {
        let cart = self.get(identity).await?;
        let mut items = Vec::with_capacity(cart.items.len());

        for line in &cart.items {
            let product = self.store.get_product(&line.product_id).await?;
            items.push(CartLineView {
                product_name: product.as_ref().map(|p| p.name.clone()),
                main_image: product.as_ref().map(|p| p.main_image.clone()),
                available: product
                    .as_ref()
                    .is_some_and(|p| p.is_purchasable() && p.stock >= line.quantity),
                stock: product.as_ref().map(|p| p.stock),
                line_total: line.effective_unit_price().multiply(line.quantity),
                line: line.clone(),
            });
        }

        Ok(CartSummary {
            identity: cart.identity.clone(),
            item_count: cart.item_count(),
            totals: Totals::compute(&cart.items, shipping_method, &self.rates),
            shipping_method,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainError;
    use crate::testing::product;
    use common::ProductStatus;
    use store::InMemoryStore;

    async fn setup() -> (CartService<InMemoryStore>, InMemoryStore) {
        let store = InMemoryStore::new();
        let mut phone = product("phone", 2_000_000, 3);
        phone.discount_price = Some(Money::new(1_800_000));
        store.insert_product(phone).await.unwrap();
        store.insert_product(product("case", 100_000, 10)).await.unwrap();
        (
            CartService::new(store.clone(), ShippingRates::default()),
            store,
        )
    }

    fn guest() -> IdentityKey {
        IdentityKey::guest("session-1")
    }

    #[tokio::test]
    async fn test_add_up_to_stock_then_fail() {
        let (carts, _) = setup().await;
        let phone = ProductId::new("phone");

        carts.add_item(&guest(), &phone, 3).await.unwrap();
        let err = carts.add_item(&guest(), &phone, 1).await.unwrap_err();

        assert!(matches!(
            err,
            DomainError::Cart(CartError::InsufficientStock {
                requested: 4,
                available: 3,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_add_zero_is_out_of_stock_error() {
        let (carts, _) = setup().await;
        let err = carts
            .add_item(&guest(), &ProductId::new("phone"), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Cart(CartError::OutOfStock { requested: 0 })));
    }

    #[tokio::test]
    async fn test_add_unpublished_or_missing_is_unavailable() {
        let (carts, store) = setup().await;
        let mut draft = product("draft", 1_000, 5);
        draft.status = ProductStatus::Draft;
        store.insert_product(draft).await.unwrap();

        for id in ["draft", "missing"] {
            let err = carts
                .add_item(&guest(), &ProductId::new(id), 1)
                .await
                .unwrap_err();
            assert!(matches!(err, DomainError::Cart(CartError::ProductUnavailable { .. })));
        }
    }

    #[tokio::test]
    async fn test_merge_keeps_original_price_snapshot() {
        let (carts, store) = setup().await;
        let case = ProductId::new("case");
        carts.add_item(&guest(), &case, 1).await.unwrap();

        let mut repriced = store.get_product(&case).await.unwrap().unwrap();
        repriced.price = Money::new(999_999);
        store.update_product(repriced).await.unwrap();

        let cart = carts.add_item(&guest(), &case, 2).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.items[0].unit_price, Money::new(100_000));
    }

    #[tokio::test]
    async fn test_update_quantity_rules() {
        let (carts, store) = setup().await;
        let case = ProductId::new("case");
        carts.add_item(&guest(), &case, 2).await.unwrap();

        let cart = carts.update_quantity(&guest(), &case, 10).await.unwrap();
        assert_eq!(cart.items[0].quantity, 10);

        let err = carts.update_quantity(&guest(), &case, 11).await.unwrap_err();
        assert!(matches!(err, DomainError::Cart(CartError::InsufficientStock { .. })));

        // unpublished: lowering works, raising does not
        let mut hidden = store.get_product(&case).await.unwrap().unwrap();
        hidden.status = ProductStatus::Draft;
        store.update_product(hidden).await.unwrap();
        let cart = carts.update_quantity(&guest(), &case, 4).await.unwrap();
        assert_eq!(cart.items[0].quantity, 4);
        let err = carts.update_quantity(&guest(), &case, 5).await.unwrap_err();
        assert!(matches!(err, DomainError::Cart(CartError::ProductUnavailable { .. })));

        let cart = carts.update_quantity(&guest(), &case, 0).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_update_absent_product_is_noop() {
        let (carts, _) = setup().await;
        let cart = carts
            .update_quantity(&guest(), &ProductId::new("case"), 3)
            .await
            .unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_remove_twice_equals_once() {
        let (carts, _) = setup().await;
        let case = ProductId::new("case");
        carts.add_item(&guest(), &case, 1).await.unwrap();
        carts.add_item(&guest(), &ProductId::new("phone"), 1).await.unwrap();

        let once = carts.remove_item(&guest(), &case).await.unwrap();
        let twice = carts.remove_item(&guest(), &case).await.unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice.items.len(), 1);
    }

    #[tokio::test]
    async fn test_user_and_guest_carts_are_separate() {
        let (carts, _) = setup().await;
        let case = ProductId::new("case");
        carts.add_item(&guest(), &case, 1).await.unwrap();

        let member = IdentityKey::user("session-1");
        assert!(carts.get(&member).await.unwrap().is_empty());
        assert_eq!(carts.get(&guest()).await.unwrap().item_count(), 1);
    }

    #[tokio::test]
    async fn test_clear_and_evict() {
        let (carts, store) = setup().await;
        carts
            .add_item(&guest(), &ProductId::new("case"), 1)
            .await
            .unwrap();

        carts.clear(&guest()).await.unwrap();
        let stored = store.load_cart(&guest()).await.unwrap();
        assert_eq!(stored.map(|c| c.is_empty()), Some(true));

        assert!(carts.evict(&guest()).await.unwrap());
        assert!(store.load_cart(&guest()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_summary_of_huge_line_saturates() {
        let (carts, store) = setup().await;
        store
            .insert_product(product("big", i64::MAX / 2 + 1, 2))
            .await
            .unwrap();
        carts
            .add_item(&guest(), &ProductId::new("big"), 2)
            .await
            .unwrap();

        let summary = carts
            .summary(&guest(), ShippingMethod::Express)
            .await
            .unwrap();

        assert_eq!(summary.items[0].line_total, Money::new(i64::MAX));
        assert_eq!(summary.totals.subtotal, Money::new(i64::MAX));
        assert_eq!(summary.totals.grand_total, Money::new(i64::MAX));
    }

    #[tokio::test]
    async fn test_sold_out_product_cannot_be_added() {
        let (carts, store) = setup().await;
        store.insert_product(product("empty", 5_000, 0)).await.unwrap();

        let err = carts
            .add_item(&guest(), &ProductId::new("empty"), 1)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Cart(CartError::InsufficientStock {
                requested: 1,
                available: 0,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_lowering_deleted_product_is_allowed() {
        let (carts, store) = setup().await;
        let case = ProductId::new("case");
        carts.add_item(&guest(), &case, 3).await.unwrap();
        store.delete_product(&case).await.unwrap();

        let cart = carts.update_quantity(&guest(), &case, 1).await.unwrap();
        assert_eq!(cart.items[0].quantity, 1);

        let err = carts.update_quantity(&guest(), &case, 2).await.unwrap_err();
        assert!(matches!(err, DomainError::Cart(CartError::ProductUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_summary_marks_unavailable_lines() {
        let (carts, store) = setup().await;
        let phone = ProductId::new("phone");
        carts.add_item(&guest(), &phone, 2).await.unwrap();
        carts
            .add_item(&guest(), &ProductId::new("case"), 1)
            .await
            .unwrap();
        store.delete_product(&ProductId::new("case")).await.unwrap();

        let summary = carts
            .summary(&guest(), ShippingMethod::Standard)
            .await
            .unwrap();

        assert_eq!(summary.item_count, 3);
        assert!(summary.items[0].available);
        assert!(!summary.items[1].available);
        assert_eq!(summary.items[1].stock, None);
        assert_eq!(summary.totals.subtotal, Money::new(4_100_000));
        assert_eq!(summary.totals.discount, Money::new(400_000));
        assert_eq!(summary.totals.cart_total, Money::new(3_700_000));
        assert_eq!(summary.totals.shipping, Money::zero());
    }
}

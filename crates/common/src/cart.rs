//! Cart records.

use serde::{Deserialize, Serialize};

use crate::{IdentityKey, Money, ProductId};

/// One product line in a cart.
///
/// `unit_price` and `unit_discount_price` are captured when the product is
/// first added and are never refreshed from the catalog afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
    pub unit_discount_price: Option<Money>,
}

impl CartLineItem {
    /// Creates a line item with the given price snapshot.
    pub fn new(
        product_id: impl Into<ProductId>,
        quantity: u32,
        unit_price: Money,
        unit_discount_price: Option<Money>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            unit_price,
            unit_discount_price,
        }
    }

    /// Returns the per-unit price actually charged.
    pub fn effective_unit_price(&self) -> Money {
        self.unit_discount_price.unwrap_or(self.unit_price)
    }
}

/// The cart held by one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub identity: IdentityKey,
    pub items: Vec<CartLineItem>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn empty(identity: IdentityKey) -> Self {
        Self {
            identity,
            items: Vec::new(),
        }
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the line for a product, if any.
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    /// Returns a mutable line for a product, if any.
    pub fn line_mut(&mut self, product_id: &ProductId) -> Option<&mut CartLineItem> {
        self.items
            .iter_mut()
            .find(|item| &item.product_id == product_id)
    }

    /// Removes a product's line. Returns true if a line was removed.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.product_id != product_id);
        self.items.len() != before
    }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_reports_whether_a_line_existed() {
        let mut cart = Cart::empty(IdentityKey::guest("s-1"));
        cart.items
            .push(CartLineItem::new("p-1", 2, Money::new(100), None));

        assert!(cart.remove(&ProductId::new("p-1")));
        assert!(!cart.remove(&ProductId::new("p-1")));
        assert!(cart.is_empty());
    }

    #[test]
    fn item_count_sums_quantities() {
        let mut cart = Cart::empty(IdentityKey::user("u-1"));
        cart.items
            .push(CartLineItem::new("p-1", 2, Money::new(100), None));
        cart.items
            .push(CartLineItem::new("p-2", 3, Money::new(50), Some(Money::new(40))));

        assert_eq!(cart.item_count(), 5);
        assert_eq!(
            cart.line(&ProductId::new("p-2")).unwrap().effective_unit_price(),
            Money::new(40)
        );
    }
}

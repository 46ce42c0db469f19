//! Cart and order pricing.
//!
//! Pure functions over cart lines. Nothing here touches storage or fails:
//! an empty slice prices to zero everywhere.

use common::{CartLineItem, Money, ShippingMethod};
use serde::{Deserialize, Serialize};

/// Shipping cost table and free-shipping threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRates {
    /// Cart total at or above which standard shipping is free.
    pub free_shipping_threshold: Money,
    pub standard: Money,
    pub fast: Money,
    pub express: Money,
}

impl Default for ShippingRates {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Money::new(2_000_000),
            standard: Money::new(50_000),
            fast: Money::new(50_000),
            express: Money::new(100_000),
        }
    }
}

impl ShippingRates {
    /// Returns the listed cost for a method, before any free-shipping rule.
    pub fn cost_of(&self, method: ShippingMethod) -> Money {
        match method {
            ShippingMethod::Standard => self.standard,
            ShippingMethod::Fast => self.fast,
            ShippingMethod::Express => self.express,
        }
    }
}

/// Sum of full unit prices times quantity.
pub fn subtotal(items: &[CartLineItem]) -> Money {
    items
        .iter()
        .map(|item| item.unit_price.multiply(item.quantity))
        .sum()
}

/// Sum of per-unit savings times quantity over discounted lines.
///
/// A discount price at or above the full price contributes nothing.
pub fn discount(items: &[CartLineItem]) -> Money {
    items
        .iter()
        .filter_map(|item| {
            let sale = item.unit_discount_price?;
            (sale < item.unit_price).then(|| (item.unit_price - sale).multiply(item.quantity))
        })
        .sum()
}

/// What the customer pays for the goods, before shipping.
pub fn cart_total(items: &[CartLineItem]) -> Money {
    subtotal(items) - discount(items)
}

/// Shipping charge for a method given the cart total.
///
/// Only standard shipping is ever free; faster tiers always charge.
pub fn shipping_cost(method: ShippingMethod, cart_total: Money, rates: &ShippingRates) -> Money {
    if method == ShippingMethod::Standard && cart_total >= rates.free_shipping_threshold {
        return Money::zero();
    }
    rates.cost_of(method)
}

/// Tax owed on a cart. Always zero; kept so totals carry a tax slot.
pub fn tax(_items: &[CartLineItem]) -> Money {
    Money::zero()
}

/// Full breakdown of what a cart costs with a chosen shipping method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: Money,
    pub discount: Money,
    pub cart_total: Money,
    pub shipping: Money,
    pub tax: Money,
    pub grand_total: Money,
}

impl Totals {
    /// Prices a set of lines.
    pub fn compute(items: &[CartLineItem], method: ShippingMethod, rates: &ShippingRates) -> Self {
        let subtotal = subtotal(items);
        let discount = discount(items);
        let cart_total = subtotal - discount;
        let shipping = shipping_cost(method, cart_total, rates);
        let tax = tax(items);

        Self {
            subtotal,
            discount,
            cart_total,
            shipping,
            tax,
            grand_total: cart_total + shipping + tax,
        }
    }
}

/// `cart_total + shipping + tax` for a method.
pub fn grand_total(items: &[CartLineItem], method: ShippingMethod, rates: &ShippingRates) -> Money {
    Totals::compute(items, method, rates).grand_total
}

//! Order records and the order status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Money, OrderId, ProductId, UserId};

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──► Paid ──► Preparing ──► Shipped ──► InDelivery ──► Delivered
///    │         │           │            │             │
///    └─────────┴───────────┴────────────┴─────────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, awaiting payment (cash on delivery starts here).
    #[default]
    Pending,

    /// Payment received.
    Paid,

    /// Being picked and packed in the warehouse.
    Preparing,

    /// Handed to the carrier.
    Shipped,

    /// Out for delivery.
    InDelivery,

    /// Received by the customer (terminal state).
    Delivered,

    /// Cancelled (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Forward sequence, excluding `Cancelled`.
    pub const SEQUENCE: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Preparing,
        OrderStatus::Shipped,
        OrderStatus::InDelivery,
        OrderStatus::Delivered,
    ];

    /// Returns the next status along the forward sequence, if any.
    pub fn next(&self) -> Option<OrderStatus> {
        let position = Self::SEQUENCE.iter().position(|s| s == self)?;
        Self::SEQUENCE.get(position + 1).copied()
    }

    /// Returns true if the order can be cancelled in this status.
    pub fn can_cancel(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns true if moving to `to` is allowed.
    ///
    /// Only the immediate next step forward, or cancellation from a
    /// non-terminal status, is valid.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        if to == OrderStatus::Cancelled {
            return self.can_cancel();
        }
        self.next() == Some(to)
    }

    /// Returns true if the order counts as money received.
    pub fn counts_as_spent(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Delivered)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::InDelivery => "in_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "preparing" => Ok(OrderStatus::Preparing),
            "shipped" => Ok(OrderStatus::Shipped),
            "in_delivery" => Ok(OrderStatus::InDelivery),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Simulated online payment; the order starts paid.
    Online,
    CashOnDelivery,
    Wallet,
    Installment,
}

impl PaymentMethod {
    /// Returns the status a freshly placed order starts in.
    pub fn initial_status(&self) -> OrderStatus {
        match self {
            PaymentMethod::Online => OrderStatus::Paid,
            _ => OrderStatus::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Online => "online",
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::Installment => "installment",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(PaymentMethod::Online),
            "cash_on_delivery" => Ok(PaymentMethod::CashOnDelivery),
            "wallet" => Ok(PaymentMethod::Wallet),
            "installment" => Ok(PaymentMethod::Installment),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// Delivery tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    /// Default tier; the only one eligible for free shipping.
    #[default]
    Standard,
    Fast,
    Express,
}

impl ShippingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingMethod::Standard => "standard",
            ShippingMethod::Fast => "fast",
            ShippingMethod::Express => "express",
        }
    }
}

impl std::fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ShippingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(ShippingMethod::Standard),
            "fast" => Ok(ShippingMethod::Fast),
            "express" => Ok(ShippingMethod::Express),
            other => Err(format!("unknown shipping method: {other}")),
        }
    }
}

/// Delivery address embedded in an order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub full_name: String,
    pub mobile: String,
    #[serde(default)]
    pub province: String,
    pub city: String,
    pub address: String,
    pub postal_code: String,
}

/// A frozen copy of a cart line at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_image: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub unit_discount_price: Option<Money>,
}

impl OrderLineItem {
    /// Returns the amount charged for this line.
    pub fn line_total(&self) -> Money {
        self.unit_discount_price
            .unwrap_or(self.unit_price)
            .multiply(self.quantity)
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub items: Vec<OrderLineItem>,
    pub subtotal: Money,
    pub discount: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub shipping_method: ShippingMethod,
    pub shipping_address: Address,
    pub tracking_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Total number of units across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

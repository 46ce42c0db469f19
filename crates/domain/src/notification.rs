//! Admin notifications.
//!
//! A [`Notifier`] sends one formatted message to every configured recipient
//! through a [`NotificationSink`]. Delivery never fails the caller: each
//! recipient is tried independently and failures are logged and counted.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::{Order, Product};
use futures_util::future::join_all;
use thiserror::Error;

/// Error returned by a sink for a single delivery.
#[derive(Debug, Error)]
#[error("Delivery to {recipient} failed: {reason}")]
pub struct DeliveryError {
    pub recipient: String,
    pub reason: String,
}

/// Something that can deliver a text message to a recipient.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, recipient: &str, message: &str) -> Result<(), DeliveryError>;
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Default)]
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn deliver(&self, recipient: &str, message: &str) -> Result<(), DeliveryError> {
        tracing::info!(recipient, message, "Notification");
        Ok(())
    }
}

/// Records notifications in memory, for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationSink {
    delivered: Arc<Mutex<Vec<(String, String)>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl InMemoryNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every delivery to `recipient` fail.
    pub fn fail_for(&self, recipient: impl Into<String>) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(recipient.into());
        }
    }

    /// Returns `(recipient, message)` pairs delivered so far.
    pub fn delivered(&self) -> Vec<(String, String)> {
        self.delivered
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotificationSink {
    async fn deliver(&self, recipient: &str, message: &str) -> Result<(), DeliveryError> {
        let should_fail = self
            .failing
            .lock()
            .map(|f| f.contains(recipient))
            .unwrap_or(false);
        if should_fail {
            return Err(DeliveryError {
                recipient: recipient.to_string(),
                reason: "recipient unreachable".to_string(),
            });
        }
        if let Ok(mut delivered) = self.delivered.lock() {
            delivered.push((recipient.to_string(), message.to_string()));
        }
        Ok(())
    }
}

/// Fans messages out to a fixed recipient list.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
    recipients: Vec<String>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>, recipients: Vec<String>) -> Self {
        Self { sink, recipients }
    }

    /// A notifier with no recipients. Every send is a no-op.
    pub fn disabled() -> Self {
        Self::new(Arc::new(LogNotificationSink), Vec::new())
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// Sends `message` to every recipient. Returns how many deliveries succeeded.
    #[tracing::instrument(skip(self, message), fields(recipients = self.recipients.len()))]
    pub async fn broadcast(&self, message: &str) -> usize {
        let deliveries = self
            .recipients
            .iter()
            .map(|recipient| self.sink.deliver(recipient, message));
        let results = join_all(deliveries).await;

        let mut delivered = 0;
        for result in results {
            match result {
                Ok(()) => delivered += 1,
                Err(err) => {
                    tracing::warn!(recipient = %err.recipient, reason = %err.reason, "Notification failed");
                    metrics::counter!("notifications_failed_total").increment(1);
                }
            }
        }
        delivered
    }

    pub async fn order_placed(&self, order: &Order) -> usize {
        self.broadcast(&format_order(order)).await
    }

    pub async fn product_created(&self, product: &Product) -> usize {
        self.broadcast(&format_product(product)).await
    }
}

/// Formats a new-order summary.
pub fn format_order(order: &Order) -> String {
    let address = &order.shipping_address;
    let mut lines = vec![
        format!("New order {}", order.order_number),
        format!("Customer: {} ({})", address.full_name, address.mobile),
        format!(
            "Address: {}, {}, {} ({})",
            address.province, address.city, address.address, address.postal_code
        ),
        "Items:".to_string(),
    ];
    for item in &order.items {
        lines.push(format!(
            "- {} x{} @ {}",
            item.product_name,
            item.quantity,
            item.unit_discount_price.unwrap_or(item.unit_price)
        ));
    }
    lines.push(format!("Subtotal: {}", order.subtotal));
    if order.discount.is_positive() {
        lines.push(format!("Discount: {}", order.discount));
    }
    lines.push(format!("Shipping: {} ({})", order.shipping, order.shipping_method));
    lines.push(format!("Total: {}", order.total));
    lines.push(format!(
        "Payment: {} | Status: {}",
        order.payment_method, order.status
    ));
    lines.join("\n")
}

/// Formats a new-product summary.
pub fn format_product(product: &Product) -> String {
    let mut lines = vec![
        format!("New product {}", product.name),
        format!("SKU: {}", product.sku),
        format!("Price: {}", product.price),
    ];
    if let Some(sale) = product.discount_price {
        lines.push(format!("Sale price: {sale}"));
    }
    lines.push(format!("Stock: {}", product.stock));
    lines.push(format!("Status: {}", product.status));
    lines.join("\n")
}

//! Store-wide stats and the warehouse inventory view.

use common::{Money, Order, Product, ProductId, UserId};
use serde::Serialize;
use store::{CatalogStore, OrderRepository, UserRepository};

use crate::error::Result;

/// Products with fewer units than this are flagged as low stock.
pub const LOW_STOCK_THRESHOLD: u32 = 10;

/// Admin dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_orders: u64,
    /// Sum of totals over orders that were not cancelled.
    pub total_revenue: Money,
    pub total_products: u64,
    pub total_users: u64,
}

/// A customer's own order history at a glance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub order_count: u64,
    /// Totals of paid and delivered orders.
    pub total_spent: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLine {
    pub product_id: ProductId,
    pub name: String,
    pub sku: String,
    pub stock: u32,
}

impl From<&Product> for StockLine {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            sku: product.sku.clone(),
            stock: product.stock,
        }
    }
}

/// Warehouse view over every product, published or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    pub total_products: usize,
    pub total_units: u64,
    pub out_of_stock: usize,
    /// Products below [`LOW_STOCK_THRESHOLD`], lowest stock first.
    pub low_stock: Vec<StockLine>,
}

impl InventorySummary {
    pub fn from_products(products: &[Product]) -> Self {
        let mut low_stock: Vec<StockLine> = products
            .iter()
            .filter(|p| p.stock < LOW_STOCK_THRESHOLD)
            .map(StockLine::from)
            .collect();
        low_stock.sort_by(|a, b| a.stock.cmp(&b.stock).then(a.name.cmp(&b.name)));

        Self {
            total_products: products.len(),
            total_units: products.iter().map(|p| u64::from(p.stock)).sum(),
            out_of_stock: products.iter().filter(|p| p.stock == 0).count(),
            low_stock,
        }
    }
}

/// What a customer has actually paid: orders that are paid or delivered.
pub fn customer_total_spent(orders: &[Order], user_id: &UserId) -> Money {
    orders
        .iter()
        .filter(|o| &o.user_id == user_id && o.status.counts_as_spent())
        .map(|o| o.total)
        .sum()
}

/// Read-only reporting over the store.
#[derive(Clone)]
pub struct ReportService<S> {
    store: S,
}

impl<S> ReportService<S>
where
    S: CatalogStore + OrderRepository + UserRepository,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            total_orders: self.store.count_orders().await?,
            total_revenue: self.store.total_revenue().await?,
            total_products: self.store.count_products().await?,
            total_users: self.store.count_users().await?,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn inventory(&self) -> Result<InventorySummary> {
        let products = self.store.list_products().await?;
        Ok(InventorySummary::from_products(&products))
    }

    pub async fn customer_summary(&self, user_id: &UserId) -> Result<CustomerSummary> {
        let orders = self.store.list_orders_by_user(user_id).await?;
        Ok(CustomerSummary {
            order_count: orders.len() as u64,
            total_spent: customer_total_spent(&orders, user_id),
        })
    }
}

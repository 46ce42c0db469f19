//! Stock availability checks and the checkout-time decrement.

use common::{Product, ProductId};
use serde::Serialize;
use store::{CatalogStore, StockDecrement};

use crate::error::{InventoryError, Result};

/// A line the decrement could not cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shortfall {
    pub product_id: ProductId,
    pub requested: u32,
    /// Stock at the time of the attempt; `None` if the product is gone.
    pub available: Option<u32>,
}

impl std::fmt::Display for Shortfall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.available {
            Some(available) => write!(
                f,
                "insufficient stock for {}: requested {}, available {}",
                self.product_id, self.requested, available
            ),
            None => write!(f, "product {} no longer exists", self.product_id),
        }
    }
}

/// Outcome of decrementing stock for a set of lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecrementReport {
    pub committed: Vec<ProductId>,
    pub shortfalls: Vec<Shortfall>,
}

impl DecrementReport {
    /// Returns true if every line was decremented.
    pub fn is_complete(&self) -> bool {
        self.shortfalls.is_empty()
    }
}

/// Guards product stock.
#[derive(Clone)]
pub struct InventoryGuard<S> {
    store: S,
}

impl<S: CatalogStore> InventoryGuard<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Checks that `requested` units of a product could be sold right now and
    /// returns the product as read.
    #[tracing::instrument(skip(self))]
    pub async fn check_availability(
        &self,
        product_id: &ProductId,
        requested: u32,
    ) -> Result<Product> {
        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or_else(|| InventoryError::ProductNotFound {
                product_id: product_id.clone(),
            })?;

        if !product.is_published() {
            return Err(InventoryError::ProductUnpublished {
                product_id: product_id.clone(),
            }
            .into());
        }
        if product.stock == 0 || product.stock < requested {
            return Err(InventoryError::InsufficientStock {
                product_id: product_id.clone(),
                available: product.stock,
            }
            .into());
        }
        Ok(product)
    }

    /// Decrements stock for each `(product, quantity)` line.
    ///
    /// Each line is an independent compare-and-decrement. Lines that cannot
    /// be covered are reported and leave stock untouched; the rest commit.
    #[tracing::instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn commit_decrement(&self, lines: &[(ProductId, u32)]) -> Result<DecrementReport> {
        let mut report = DecrementReport::default();

        for (product_id, quantity) in lines {
            match self.store.try_decrement_stock(product_id, *quantity).await? {
                StockDecrement::Applied { remaining } => {
                    tracing::debug!(%product_id, quantity, remaining, "Stock decremented");
                    report.committed.push(product_id.clone());
                }
                StockDecrement::Insufficient { available } => {
                    report.shortfalls.push(Shortfall {
                        product_id: product_id.clone(),
                        requested: *quantity,
                        available: Some(available),
                    });
                }
                StockDecrement::Missing => {
                    report.shortfalls.push(Shortfall {
                        product_id: product_id.clone(),
                        requested: *quantity,
                        available: None,
                    });
                }
            }
        }

        if !report.shortfalls.is_empty() {
            metrics::counter!("inventory_shortfalls_total")
                .increment(report.shortfalls.len() as u64);
            tracing::warn!(shortfalls = report.shortfalls.len(), "Partial stock decrement");
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainError;
    use crate::testing::product;
    use common::ProductStatus;
    use store::InMemoryStore;

    #[tokio::test]
    async fn test_check_availability_outcomes() {
        let store = InMemoryStore::new();
        store.insert_product(product("p-1", 1_000, 3)).await.unwrap();
        let mut draft = product("p-2", 1_000, 3);
        draft.status = ProductStatus::Draft;
        store.insert_product(draft).await.unwrap();
        let guard = InventoryGuard::new(store);

        let product = guard
            .check_availability(&ProductId::new("p-1"), 3)
            .await
            .unwrap();
        assert_eq!(product.stock, 3);
        assert!(matches!(
            guard.check_availability(&ProductId::new("p-1"), 4).await,
            Err(DomainError::Inventory(InventoryError::InsufficientStock { available: 3, .. }))
        ));
        assert!(matches!(
            guard.check_availability(&ProductId::new("p-2"), 1).await,
            Err(DomainError::Inventory(InventoryError::ProductUnpublished { .. }))
        ));
        assert!(matches!(
            guard.check_availability(&ProductId::new("nope"), 1).await,
            Err(DomainError::Inventory(InventoryError::ProductNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_partial_commit_reports_shortfalls() {
        let store = InMemoryStore::new();
        store.insert_product(product("p-1", 1_000, 5)).await.unwrap();
        store.insert_product(product("p-2", 1_000, 1)).await.unwrap();
        let guard = InventoryGuard::new(store.clone());

        let report = guard
            .commit_decrement(&[
                (ProductId::new("p-1"), 2),
                (ProductId::new("p-2"), 2),
                (ProductId::new("gone"), 1),
            ])
            .await
            .unwrap();

        assert_eq!(report.committed, vec![ProductId::new("p-1")]);
        assert_eq!(report.shortfalls.len(), 2);
        assert_eq!(report.shortfalls[0].available, Some(1));
        assert_eq!(report.shortfalls[1].available, None);
        assert!(!report.is_complete());

        let p1 = store.get_product(&ProductId::new("p-1")).await.unwrap();
        let p2 = store.get_product(&ProductId::new("p-2")).await.unwrap();
        assert_eq!(p1.unwrap().stock, 3);
        assert_eq!(p2.unwrap().stock, 1);
    }
}

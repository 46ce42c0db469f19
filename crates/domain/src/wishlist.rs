//! Saved-for-later lists for signed-in users.

use common::{ProductId, UserId, Wishlist};
use store::{CatalogStore, WishlistRepository};

use crate::error::{CatalogError, Result};

/// Wishlist operations over an injected wishlist repository and catalog.
#[derive(Clone)]
pub struct WishlistService<S> {
    store: S,
}

impl<S: CatalogStore + WishlistRepository> WishlistService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the user's wishlist, empty if none was saved yet.
    pub async fn get(&self, user_id: &UserId) -> Result<Wishlist> {
        Ok(self
            .store
            .load_wishlist(user_id)
            .await?
            .unwrap_or_else(|| Wishlist::empty(user_id.clone())))
    }

    async fn save(&self, wishlist: &Wishlist, op: &'static str) -> Result<()> {
        self.store.save_wishlist(wishlist).await?;
        metrics::counter!("wishlist_mutations_total", "op" => op).increment(1);
        Ok(())
    }

    /// Saves a product. Adding one that is already saved changes nothing.
    #[tracing::instrument(skip(self))]
    pub async fn add(&self, user_id: &UserId, product_id: &ProductId) -> Result<Wishlist> {
        if self.store.get_product(product_id).await?.is_none() {
            return Err(CatalogError::NotFound {
                product_id: product_id.clone(),
            }
            .into());
        }

        let mut wishlist = self.get(user_id).await?;
        if wishlist.add(product_id.clone()) {
            self.save(&wishlist, "add").await?;
        }
        Ok(wishlist)
    }

    /// Drops a product. Removing one that is not saved is not an error.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, user_id: &UserId, product_id: &ProductId) -> Result<Wishlist> {
        let mut wishlist = self.get(user_id).await?;
        if wishlist.remove(product_id) {
            self.save(&wishlist, "remove").await?;
        }
        Ok(wishlist)
    }

    /// Removes a saved product or adds an unsaved one. Returns the list and
    /// whether the product is now saved.
    #[tracing::instrument(skip(self))]
    pub async fn toggle(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
    ) -> Result<(Wishlist, bool)> {
        let wishlist = self.get(user_id).await?;
        if wishlist.contains(product_id) {
            Ok((self.remove(user_id, product_id).await?, false))
        } else {
            Ok((self.add(user_id, product_id).await?, true))
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, user_id: &UserId) -> Result<Wishlist> {
        let wishlist = Wishlist::empty(user_id.clone());
        self.save(&wishlist, "clear").await?;
        Ok(wishlist)
    }
}

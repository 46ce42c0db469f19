//! Wishlist records.

use serde::{Deserialize, Serialize};

use crate::{ProductId, UserId};

/// Products a signed-in user saved for later, oldest first, without repeats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wishlist {
    pub user_id: UserId,
    pub items: Vec<ProductId>,
}

impl Wishlist {
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            items: Vec::new(),
        }
    }

    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.items.contains(product_id)
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Appends a product. Returns false if it was already saved.
    pub fn add(&mut self, product_id: ProductId) -> bool {
        if self.contains(&product_id) {
            return false;
        }
        self.items.push(product_id);
        true
    }

    /// Drops a product. Returns false if it was not saved.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|id| id != product_id);
        self.items.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_ignores_repeats_and_keeps_order() {
        let mut wishlist = Wishlist::empty(UserId::new("u-1"));
        assert!(wishlist.add(ProductId::new("b")));
        assert!(wishlist.add(ProductId::new("a")));
        assert!(!wishlist.add(ProductId::new("b")));

        assert_eq!(wishlist.items, vec![ProductId::new("b"), ProductId::new("a")]);
        assert_eq!(wishlist.count(), 2);
    }

    #[test]
    fn remove_reports_whether_anything_changed() {
        let mut wishlist = Wishlist::empty(UserId::new("u-1"));
        wishlist.add(ProductId::new("a"));
        assert!(wishlist.remove(&ProductId::new("a")));
        assert!(!wishlist.remove(&ProductId::new("a")));
        assert_eq!(wishlist.count(), 0);
    }
}

//! Catalog product records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Money, ProductId};

/// Publication status of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    /// Hidden from the storefront.
    Draft,
    /// Visible and purchasable.
    #[default]
    Published,
}

impl ProductStatus {
    /// Returns the status name as stored and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Draft => "draft",
            ProductStatus::Published => "published",
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ProductStatus::Draft),
            "published" => Ok(ProductStatus::Published),
            other => Err(format!("unknown product status: {other}")),
        }
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category: String,
    /// Full price, always positive.
    pub price: Money,
    /// Sale price, strictly below `price` when present.
    pub discount_price: Option<Money>,
    pub stock: u32,
    #[serde(default)]
    pub main_image: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns true if the product is visible on the storefront.
    pub fn is_published(&self) -> bool {
        self.status == ProductStatus::Published
    }

    /// Returns true if the product can be put into a cart right now.
    pub fn is_purchasable(&self) -> bool {
        self.is_published() && self.stock > 0
    }

    /// Returns the price a customer actually pays per unit.
    pub fn effective_price(&self) -> Money {
        self.discount_price.unwrap_or(self.price)
    }
}

/// Builds a URL slug from a product name.
///
/// Lowercases, turns whitespace runs into single dashes, drops anything that
/// is not alphanumeric, `-` or `_`, and caps the result at 100 characters.
/// Non-Latin letters are kept.
pub fn slugify(name: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for ch in name.trim().chars() {
        if ch.is_whitespace() {
            pending_dash = !slug.is_empty();
            continue;
        }
        if ch.is_alphanumeric() || ch == '-' || ch == '_' {
            if pending_dash {
                slug.push('-');
                pending_dash = false;
            }
            slug.extend(ch.to_lowercase());
        }
    }
    slug.chars().take(100).collect()
}

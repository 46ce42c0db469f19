//! Catalog management and the published read model.

use chrono::Utc;
use common::{Money, Product, ProductId, ProductStatus, slugify};
use rand::Rng;
use serde::Deserialize;
use store::CatalogStore;

use crate::error::{CatalogError, Result};
use crate::notification::Notifier;

/// Highest accepted unit price. One line of up to `u32::MAX` units stays
/// within `i64`.
pub const MAX_PRICE: i64 = i64::MAX / u32::MAX as i64;

/// Highest accepted stock level; stock is stored as a 32-bit signed column.
pub const MAX_STOCK: i64 = i32::MAX as i64;

/// Order of a product listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

/// Browsing filters for product listings. Empty strings filter nothing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    /// Case-insensitive text matched against name, description and brand.
    pub q: Option<String>,
    pub category: Option<String>,
    /// Inclusive bounds on the effective price.
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    #[serde(default)]
    pub sort: ProductSort,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ProductQuery {
    fn matches(&self, product: &Product) -> bool {
        if let Some(needle) = non_blank(&self.q) {
            let needle = needle.to_lowercase();
            let hit = [&product.name, &product.description, &product.brand]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if non_blank(&self.category).is_some_and(|c| product.category != c) {
            return false;
        }
        let price = product.effective_price().amount();
        self.min_price.is_none_or(|min| price >= min) && self.max_price.is_none_or(|max| price <= max)
    }

    /// Filters and orders a listing.
    pub fn apply(&self, mut products: Vec<Product>) -> Vec<Product> {
        products.retain(|p| self.matches(p));
        match self.sort {
            ProductSort::Newest => products.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            ProductSort::PriceAsc => products.sort_by_key(|p| p.effective_price()),
            ProductSort::PriceDesc => {
                products.sort_by(|a, b| b.effective_price().cmp(&a.effective_price()))
            }
        }
        products
    }
}

/// Editable product fields, as submitted by an admin.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category: String,
    pub price: i64,
    #[serde(default)]
    pub discount_price: Option<i64>,
    pub stock: i64,
    #[serde(default)]
    pub main_image: String,
    #[serde(default)]
    pub images: Vec<String>,
    /// Defaults to published on create; left unchanged on update when absent.
    #[serde(default)]
    pub status: Option<ProductStatus>,
}

struct Validated {
    price: Money,
    discount_price: Option<Money>,
    stock: u32,
}

impl ProductInput {
    fn validate(&self) -> std::result::Result<Validated, CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::Validation("name is required".to_string()));
        }
        if self.price <= 0 {
            return Err(CatalogError::Validation(
                "price must be positive".to_string(),
            ));
        }
        if self.price > MAX_PRICE {
            return Err(CatalogError::Validation(format!(
                "price must not exceed {MAX_PRICE}"
            )));
        }
        // zero is treated as "no discount"
        let discount_price = self.discount_price.filter(|&d| d > 0);
        if let Some(discount) = discount_price
            && discount >= self.price
        {
            return Err(CatalogError::Validation(
                "discount price must be below price".to_string(),
            ));
        }
        if self.stock > MAX_STOCK {
            return Err(CatalogError::Validation(format!(
                "stock must not exceed {MAX_STOCK}"
            )));
        }
        let stock = u32::try_from(self.stock)
            .map_err(|_| CatalogError::Validation("stock must be non-negative".to_string()))?;

        Ok(Validated {
            price: Money::new(self.price),
            discount_price: discount_price.map(Money::new),
            stock,
        })
    }
}

fn new_product_id() -> ProductId {
    let suffix: u16 = rand::thread_rng().gen_range(0..1000);
    ProductId::new(format!("{}{suffix:03}", Utc::now().timestamp_millis()))
}

/// Product catalog operations.
#[derive(Clone)]
pub struct CatalogService<S> {
    store: S,
    notifier: Notifier,
}

impl<S: CatalogStore> CatalogService<S> {
    pub fn new(store: S, notifier: Notifier) -> Self {
        Self { store, notifier }
    }

    /// Creates a product and notifies admins.
    #[tracing::instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: ProductInput) -> Result<Product> {
        let valid = input.validate()?;
        let id = new_product_id();
        let now = Utc::now();

        let product = Product {
            sku: format!("SKU-{id}"),
            slug: slugify(&input.name),
            id,
            name: input.name.trim().to_string(),
            description: input.description,
            brand: input.brand,
            category: input.category,
            price: valid.price,
            discount_price: valid.discount_price,
            stock: valid.stock,
            main_image: input.main_image,
            images: input.images,
            status: input.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        self.store.insert_product(product.clone()).await?;
        tracing::info!(product_id = %product.id, "Product created");

        self.notifier.product_created(&product).await;
        Ok(product)
    }

    /// Replaces a product's editable fields. SKU, slug and creation time stay.
    #[tracing::instrument(skip(self, input))]
    pub async fn update(&self, id: &ProductId, input: ProductInput) -> Result<Product> {
        let valid = input.validate()?;
        let mut product = self.get(id).await?;

        product.name = input.name.trim().to_string();
        product.description = input.description;
        product.brand = input.brand;
        product.category = input.category;
        product.price = valid.price;
        product.discount_price = valid.discount_price;
        product.stock = valid.stock;
        product.main_image = input.main_image;
        product.images = input.images;
        if let Some(status) = input.status {
            product.status = status;
        }
        product.updated_at = Utc::now();

        self.store.update_product(product.clone()).await?;
        Ok(product)
    }

    /// Deletes a product. Existing carts and orders keep their lines.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &ProductId) -> Result<()> {
        if !self.store.delete_product(id).await? {
            return Err(CatalogError::NotFound {
                product_id: id.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// Returns any product, published or not.
    pub async fn get(&self, id: &ProductId) -> Result<Product> {
        self.store.get_product(id).await?.ok_or_else(|| {
            CatalogError::NotFound {
                product_id: id.clone(),
            }
            .into()
        })
    }

    /// Returns a product only if it is published.
    pub async fn get_published(&self, id: &ProductId) -> Result<Product> {
        let product = self.get(id).await?;
        if !product.is_published() {
            return Err(CatalogError::NotFound {
                product_id: id.clone(),
            }
            .into());
        }
        Ok(product)
    }

    /// Published products matching a browsing query.
    pub async fn list_published(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        Ok(query.apply(self.store.list_published().await?))
    }

    pub async fn list_all(&self) -> Result<Vec<Product>> {
        Ok(self.store.list_products().await?)
    }
}

//! Shared fixtures for unit tests.

use chrono::Utc;
use common::{Money, Product, ProductId, ProductStatus};

/// A published product with no discount.
pub fn product(id: &str, price: i64, stock: u32) -> Product {
    Product {
        id: ProductId::new(id),
        sku: format!("SKU-{id}"),
        name: format!("Product {id}"),
        slug: id.to_string(),
        description: String::new(),
        brand: String::new(),
        category: String::new(),
        price: Money::new(price),
        discount_price: None,
        stock,
        main_image: format!("/img/{id}.png"),
        images: vec![],
        status: ProductStatus::Published,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

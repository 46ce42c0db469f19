use std::hint::black_box;

use common::{Address, CartLineItem, IdentityKey, Money, PaymentMethod, ShippingMethod};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    CartService, CatalogService, Notifier, OrderService, OrderSettings, ProductInput,
    ShippingRates, Totals,
};
use store::InMemoryStore;

fn product_input(name: &str, stock: i64) -> ProductInput {
    ProductInput {
        name: name.to_string(),
        description: String::new(),
        brand: String::new(),
        category: String::new(),
        price: 2_000_000,
        discount_price: Some(1_800_000),
        stock,
        main_image: String::new(),
        images: vec![],
        status: None,
    }
}

fn address() -> Address {
    Address {
        full_name: "Bench".to_string(),
        mobile: "09120000000".to_string(),
        province: String::new(),
        city: "Tehran".to_string(),
        address: "Street 1".to_string(),
        postal_code: "1234567890".to_string(),
    }
}

fn bench_pricing(c: &mut Criterion) {
    let rates = ShippingRates::default();
    let items: Vec<CartLineItem> = (0..50)
        .map(|i| {
            let sale = (i % 2 == 0).then(|| Money::new(900 + i));
            CartLineItem::new(format!("p-{i}"), 2, Money::new(1_000 + i), sale)
        })
        .collect();

    c.bench_function("pricing/totals_50_lines", |b| {
        b.iter(|| Totals::compute(black_box(&items), ShippingMethod::Standard, &rates));
    });
}

fn bench_add_item(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let catalog = CatalogService::new(store.clone(), Notifier::disabled());
    let carts = CartService::new(store, ShippingRates::default());
    let product = rt.block_on(async {
        catalog
            .create(product_input("Bench phone", 1_000_000))
            .await
            .unwrap()
    });
    let identity = IdentityKey::guest("bench");

    c.bench_function("cart/add_then_remove", |b| {
        b.iter(|| {
            rt.block_on(async {
                carts.add_item(&identity, &product.id, 1).await.unwrap();
                carts.remove_item(&identity, &product.id).await.unwrap();
            });
        });
    });
}

fn bench_checkout(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let catalog = CatalogService::new(store.clone(), Notifier::disabled());
    let carts = CartService::new(store.clone(), ShippingRates::default());
    let orders = OrderService::new(store, Notifier::disabled(), OrderSettings::default());
    let product = rt.block_on(async {
        catalog
            .create(product_input("Bench phone", i64::from(u32::MAX)))
            .await
            .unwrap()
    });
    let identity = IdentityKey::user("bench-user");

    c.bench_function("order/checkout_one_line", |b| {
        b.iter(|| {
            rt.block_on(async {
                carts.add_item(&identity, &product.id, 1).await.unwrap();
                orders
                    .create_order(
                        &identity,
                        address(),
                        PaymentMethod::Online,
                        ShippingMethod::Standard,
                    )
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_pricing, bench_add_item, bench_checkout);
criterion_main!(benches);

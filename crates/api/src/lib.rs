//! HTTP API server for the storefront.
//!
//! Exposes catalog, cart, wishlist, checkout, order and back-office endpoints
//! as JSON, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use domain::{
    AccountService, CartService, CatalogService, Notifier, OrderService, ReportService,
    WishlistService,
};
use metrics_exporter_prometheus::PrometheusHandle;
use store::StorefrontStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub store: S,
    pub catalog: CatalogService<S>,
    pub carts: CartService<S>,
    pub wishlists: WishlistService<S>,
    pub orders: OrderService<S>,
    pub accounts: AccountService<S>,
    pub reports: ReportService<S>,
}

/// Wires every service over one store.
pub fn create_state<S: StorefrontStore>(
    store: S,
    config: &Config,
    notifier: Notifier,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        catalog: CatalogService::new(store.clone(), notifier.clone()),
        carts: CartService::new(store.clone(), config.shipping),
        wishlists: WishlistService::new(store.clone()),
        orders: OrderService::new(store.clone(), notifier, config.order_settings()),
        accounts: AccountService::new(store.clone()),
        reports: ReportService::new(store.clone()),
        store,
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: StorefrontStore>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::system::health::<S>))
        .route("/login", post(routes::auth::login::<S>))
        .route("/register", post(routes::auth::register::<S>))
        .route(
            "/products",
            get(routes::products::list::<S>).post(routes::products::create::<S>),
        )
        .route(
            "/products/{id}",
            get(routes::products::get::<S>)
                .put(routes::products::update::<S>)
                .delete(routes::products::delete::<S>),
        )
        .route(
            "/cart",
            get(routes::cart::get::<S>).delete(routes::cart::clear::<S>),
        )
        .route("/cart/items", post(routes::cart::add_item::<S>))
        .route(
            "/cart/items/{product_id}",
            put(routes::cart::update_item::<S>).delete(routes::cart::remove_item::<S>),
        )
        .route(
            "/wishlist",
            get(routes::wishlist::get::<S>)
                .post(routes::wishlist::add::<S>)
                .delete(routes::wishlist::clear::<S>),
        )
        .route("/wishlist/toggle", post(routes::wishlist::toggle::<S>))
        .route(
            "/wishlist/{product_id}",
            delete(routes::wishlist::remove::<S>),
        )
        .route(
            "/orders",
            get(routes::orders::list_own::<S>).post(routes::orders::create::<S>),
        )
        .route("/orders/summary", get(routes::orders::summary::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/status", put(routes::orders::update_status::<S>))
        .route("/admin/orders", get(routes::orders::list_all::<S>))
        .route("/stats", get(routes::reports::stats::<S>))
        .route("/inventory", get(routes::reports::inventory::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

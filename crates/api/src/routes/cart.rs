//! Cart endpoints. The cart belongs to `x-user-id` when present, otherwise
//! to the `x-session-id` guest session.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use common::{ProductId, ShippingMethod};
use domain::CartSummary;
use serde::Deserialize;
use store::StorefrontStore;

use super::cart_identity;
use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CartQuery {
    pub shipping_method: Option<ShippingMethod>,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

/// GET /cart?shippingMethod=standard
pub async fn get<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Query(query): Query<CartQuery>,
) -> Result<Json<CartSummary>, ApiError> {
    let identity = cart_identity(&state, &headers).await?;
    let method = query.shipping_method.unwrap_or_default();
    Ok(Json(state.carts.summary(&identity, method).await?))
}

/// POST /cart/items
pub async fn add_item<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartSummary>, ApiError> {
    let identity = cart_identity(&state, &headers).await?;
    state
        .carts
        .add_item(&identity, &ProductId::new(req.product_id), req.quantity)
        .await?;
    Ok(Json(
        state
            .carts
            .summary(&identity, ShippingMethod::default())
            .await?,
    ))
}

/// PUT /cart/items/{product_id}: zero or below removes the line.
pub async fn update_item<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<CartSummary>, ApiError> {
    let identity = cart_identity(&state, &headers).await?;
    state
        .carts
        .update_quantity(&identity, &ProductId::new(product_id), req.quantity)
        .await?;
    Ok(Json(
        state
            .carts
            .summary(&identity, ShippingMethod::default())
            .await?,
    ))
}

/// DELETE /cart/items/{product_id}
pub async fn remove_item<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
) -> Result<Json<CartSummary>, ApiError> {
    let identity = cart_identity(&state, &headers).await?;
    state
        .carts
        .remove_item(&identity, &ProductId::new(product_id))
        .await?;
    Ok(Json(
        state
            .carts
            .summary(&identity, ShippingMethod::default())
            .await?,
    ))
}

/// DELETE /cart
pub async fn clear<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<CartSummary>, ApiError> {
    let identity = cart_identity(&state, &headers).await?;
    state.carts.clear(&identity).await?;
    Ok(Json(
        state
            .carts
            .summary(&identity, ShippingMethod::default())
            .await?,
    ))
}

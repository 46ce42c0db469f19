//! Wishlist endpoints for signed-in users.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use common::{ProductId, Wishlist};
use serde::{Deserialize, Serialize};
use store::StorefrontStore;

use super::current_user;
use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItemRequest {
    pub product_id: String,
}

#[derive(Serialize)]
pub struct WishlistResponse {
    pub items: Vec<ProductId>,
    pub count: usize,
    /// Set on toggle: whether the product is now saved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added: Option<bool>,
}

impl From<Wishlist> for WishlistResponse {
    fn from(wishlist: Wishlist) -> Self {
        Self {
            count: wishlist.count(),
            items: wishlist.items,
            added: None,
        }
    }
}

/// GET /wishlist
pub async fn get<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<WishlistResponse>, ApiError> {
    let user = current_user(&state, &headers).await?;
    Ok(Json(state.wishlists.get(&user.id).await?.into()))
}

/// POST /wishlist
pub async fn add<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<WishlistItemRequest>,
) -> Result<Json<WishlistResponse>, ApiError> {
    let user = current_user(&state, &headers).await?;
    let wishlist = state
        .wishlists
        .add(&user.id, &ProductId::new(req.product_id))
        .await?;
    Ok(Json(wishlist.into()))
}

/// POST /wishlist/toggle
pub async fn toggle<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<WishlistItemRequest>,
) -> Result<Json<WishlistResponse>, ApiError> {
    let user = current_user(&state, &headers).await?;
    let (wishlist, added) = state
        .wishlists
        .toggle(&user.id, &ProductId::new(req.product_id))
        .await?;
    Ok(Json(WishlistResponse {
        added: Some(added),
        ..WishlistResponse::from(wishlist)
    }))
}

/// DELETE /wishlist/{product_id}
pub async fn remove<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
) -> Result<Json<WishlistResponse>, ApiError> {
    let user = current_user(&state, &headers).await?;
    let wishlist = state
        .wishlists
        .remove(&user.id, &ProductId::new(product_id))
        .await?;
    Ok(Json(wishlist.into()))
}

/// DELETE /wishlist
pub async fn clear<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<WishlistResponse>, ApiError> {
    let user = current_user(&state, &headers).await?;
    Ok(Json(state.wishlists.clear(&user.id).await?.into()))
}

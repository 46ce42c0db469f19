//! Catalog endpoints. Reads are public; writes need `ManageProducts`.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use common::{Product, ProductId};
use domain::{Permission, ProductInput, ProductQuery, role_allows};
use serde::Serialize;
use store::StorefrontStore;

use super::{USER_HEADER, current_user, header_value, require};
use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreatedResponse {
    pub success: bool,
    pub product_id: ProductId,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub success: bool,
    pub product: Product,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Catalog managers also see drafts. Anonymous callers, including a blank
/// user header, see published products only.
async fn sees_unpublished<S: StorefrontStore>(
    state: &AppState<S>,
    headers: &HeaderMap,
) -> Result<bool, ApiError> {
    if header_value(headers, USER_HEADER).is_none() {
        return Ok(false);
    }
    let user = current_user(state, headers).await?;
    Ok(role_allows(user.role, Permission::ManageProducts))
}

/// GET /products?q=&category=&minPrice=&maxPrice=&sort=newest|price-asc|price-desc
pub async fn list<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = if sees_unpublished(&state, &headers).await? {
        query.apply(state.catalog.list_all().await?)
    } else {
        state.catalog.list_published(&query).await?
    };
    Ok(Json(products))
}

/// GET /products/{id}
pub async fn get<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id = ProductId::new(id);
    let product = if sees_unpublished(&state, &headers).await? {
        state.catalog.get(&id).await?
    } else {
        state.catalog.get_published(&id).await?
    };
    Ok(Json(product))
}

/// POST /products
pub async fn create<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<ProductCreatedResponse>), ApiError> {
    require(&state, &headers, Permission::ManageProducts).await?;
    let product = state.catalog.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProductCreatedResponse {
            success: true,
            product_id: product.id,
        }),
    ))
}

/// PUT /products/{id}
pub async fn update<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<ProductInput>,
) -> Result<Json<ProductResponse>, ApiError> {
    require(&state, &headers, Permission::ManageProducts).await?;
    let product = state.catalog.update(&ProductId::new(id), input).await?;
    Ok(Json(ProductResponse {
        success: true,
        product,
    }))
}

/// DELETE /products/{id}
pub async fn delete<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    require(&state, &headers, Permission::ManageProducts).await?;
    state.catalog.delete(&ProductId::new(id)).await?;
    Ok(Json(SuccessResponse { success: true }))
}

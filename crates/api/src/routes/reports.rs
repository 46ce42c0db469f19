//! Back-office reporting.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use domain::{InventorySummary, Permission, StoreStats};
use store::StorefrontStore;

use super::require;
use crate::AppState;
use crate::error::ApiError;

/// GET /stats
pub async fn stats<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<StoreStats>, ApiError> {
    require(&state, &headers, Permission::ViewStats).await?;
    Ok(Json(state.reports.stats().await?))
}

/// GET /inventory: warehouse stock overview.
pub async fn inventory<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<InventorySummary>, ApiError> {
    require(&state, &headers, Permission::ViewInventory).await?;
    Ok(Json(state.reports.inventory().await?))
}

//! Checkout and order management endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use common::{Address, IdentityKey, Money, Order, OrderId, OrderStatus, PaymentMethod, ShippingMethod};
use domain::{CustomerSummary, OrderError, Permission, role_allows};
use serde::{Deserialize, Serialize};
use store::StorefrontStore;

use super::{current_user, require};
use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub shipping_address: Address,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub shipping_method: ShippingMethod,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    pub tracking_code: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedResponse {
    pub success: bool,
    pub order_id: OrderId,
    pub order_number: String,
    pub status: OrderStatus,
    pub total: Money,
    pub warnings: Vec<String>,
}

fn parse_order_id(raw: &str) -> Result<OrderId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid order id: {raw}")))
}

/// POST /orders: places an order from the caller's cart.
pub async fn create<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>), ApiError> {
    let user = require(&state, &headers, Permission::PlaceOrder).await?;
    let placed = state
        .orders
        .create_order(
            &IdentityKey::User(user.id),
            req.shipping_address,
            req.payment_method,
            req.shipping_method,
        )
        .await?;

    let warnings = placed.warnings();
    let order = placed.order;
    Ok((
        StatusCode::CREATED,
        Json(OrderCreatedResponse {
            success: true,
            order_id: order.id,
            order_number: order.order_number,
            status: order.status,
            total: order.total,
            warnings,
        }),
    ))
}

/// GET /orders: the caller's own orders, newest first.
pub async fn list_own<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Order>>, ApiError> {
    let user = current_user(&state, &headers).await?;
    Ok(Json(state.orders.list_by_user(&user.id).await?))
}

/// GET /orders/summary: the caller's order count and total spent.
pub async fn summary<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<CustomerSummary>, ApiError> {
    let user = current_user(&state, &headers).await?;
    Ok(Json(state.reports.customer_summary(&user.id).await?))
}

/// GET /orders/{id}: visible to its owner and to staff.
pub async fn get<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let user = current_user(&state, &headers).await?;
    let order_id = parse_order_id(&id)?;
    let order = state.orders.get(order_id).await?;

    if order.user_id != user.id && !role_allows(user.role, Permission::ViewAllOrders) {
        // Other customers' orders are reported as absent.
        return Err(ApiError::Domain(
            OrderError::NotFound { order_id: id }.into(),
        ));
    }
    Ok(Json(order))
}

/// PUT /orders/{id}/status
pub async fn update_status<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let user = require(&state, &headers, Permission::UpdateOrderStatus).await?;
    let order_id = parse_order_id(&id)?;
    let order = state
        .orders
        .transition(order_id, req.status, req.tracking_code)
        .await?;
    tracing::info!(order_id = %order.id, by = %user.id, status = %order.status, "order status updated");
    Ok(Json(order))
}

/// GET /admin/orders
pub async fn list_all<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Order>>, ApiError> {
    require(&state, &headers, Permission::ViewAllOrders).await?;
    Ok(Json(state.orders.list_all().await?))
}

//! Sign-in and registration.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::User;
use domain::Registration;
use serde::{Deserialize, Serialize};
use store::StorefrontStore;

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: User,
}

/// POST /login
pub async fn login<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state.accounts.login(&req.email, &req.password).await?;
    Ok(Json(AuthResponse {
        success: true,
        user,
    }))
}

/// POST /register: creates a customer account.
pub async fn register<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(form): Json<Registration>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let user = state.accounts.register(form).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            user,
        }),
    ))
}

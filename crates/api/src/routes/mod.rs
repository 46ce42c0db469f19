//! Route handlers, grouped by resource.

pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;
pub mod reports;
pub mod system;
pub mod wishlist;

use axum::http::HeaderMap;
use common::{IdentityKey, User, UserId};
use domain::{Permission, authorize};
use store::StorefrontStore;

use crate::AppState;
use crate::error::ApiError;

/// Header carrying the signed-in user's ID.
pub const USER_HEADER: &str = "x-user-id";
/// Header carrying an anonymous browser session token.
pub const SESSION_HEADER: &str = "x-session-id";

pub(crate) fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Resolves the signed-in caller, or 401.
pub async fn current_user<S: StorefrontStore>(
    state: &AppState<S>,
    headers: &HeaderMap,
) -> Result<User, ApiError> {
    let id = header_value(headers, USER_HEADER)
        .ok_or_else(|| ApiError::Unauthorized("Sign in required".to_string()))?;
    Ok(state.accounts.get_user(&UserId::new(id)).await?)
}

/// Resolves the caller and checks the permission in one step.
pub async fn require<S: StorefrontStore>(
    state: &AppState<S>,
    headers: &HeaderMap,
    permission: Permission,
) -> Result<User, ApiError> {
    let user = current_user(state, headers).await?;
    authorize(&user, permission)?;
    Ok(user)
}

/// Picks the cart identity: a signed-in user wins over a session token.
pub async fn cart_identity<S: StorefrontStore>(
    state: &AppState<S>,
    headers: &HeaderMap,
) -> Result<IdentityKey, ApiError> {
    if header_value(headers, USER_HEADER).is_some() {
        let user = current_user(state, headers).await?;
        return Ok(IdentityKey::User(user.id));
    }
    header_value(headers, SESSION_HEADER)
        .map(IdentityKey::guest)
        .ok_or_else(|| {
            ApiError::BadRequest(format!(
                "Missing {USER_HEADER} or {SESSION_HEADER} header"
            ))
        })
}

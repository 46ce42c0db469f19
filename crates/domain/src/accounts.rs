//! Registration, login and role-based authorization.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::Utc;
use common::{Role, User, UserId};
use rand::RngCore;
use serde::Deserialize;
use store::{StoreError, UserRepository};

use crate::error::{AccountError, DomainError, Result};

/// Protected operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    PlaceOrder,
    ManageProducts,
    ViewAllOrders,
    UpdateOrderStatus,
    ViewInventory,
    ViewStats,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::PlaceOrder => "place orders",
            Permission::ManageProducts => "manage products",
            Permission::ViewAllOrders => "view all orders",
            Permission::UpdateOrderStatus => "update order status",
            Permission::ViewInventory => "view inventory",
            Permission::ViewStats => "view stats",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returns true if `role` grants `permission`.
pub fn role_allows(role: Role, permission: Permission) -> bool {
    match role {
        Role::Admin => true,
        Role::Warehouse => matches!(
            permission,
            Permission::ViewInventory | Permission::ViewAllOrders | Permission::UpdateOrderStatus
        ),
        Role::Customer => permission == Permission::PlaceOrder,
    }
}

/// The single authorization check for protected operations.
pub fn authorize(user: &User, permission: Permission) -> std::result::Result<(), AccountError> {
    if role_allows(user.role, permission) {
        Ok(())
    } else {
        Err(AccountError::Forbidden {
            role: user.role,
            permission,
        })
    }
}

/// Registration form.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub password: String,
}

fn hash_password(password: &str) -> std::result::Result<String, AccountError> {
    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| AccountError::Hashing(e.to_string()))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AccountError::Hashing(e.to_string()))
}

fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn new_user_id() -> UserId {
    UserId::new(uuid::Uuid::new_v4().simple().to_string())
}

/// User account operations.
#[derive(Clone)]
pub struct AccountService<S> {
    store: S,
}

impl<S: UserRepository> AccountService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers a customer account.
    #[tracing::instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: Registration) -> Result<User> {
        self.create_user(form, Role::Customer).await
    }

    async fn create_user(&self, form: Registration, role: Role) -> Result<User> {
        let name = form.name.trim();
        let email = form.email.trim();
        let mobile = form.mobile.trim();
        if name.is_empty() || email.is_empty() || mobile.is_empty() || form.password.is_empty() {
            return Err(AccountError::Validation("all fields are required".to_string()).into());
        }
        if !email.contains('@') {
            return Err(AccountError::Validation("email is invalid".to_string()).into());
        }

        if self.store.find_user_by_email(email).await?.is_some() {
            return Err(AccountError::DuplicateIdentity {
                field: "email".to_string(),
            }
            .into());
        }
        if self.store.find_user_by_mobile(mobile).await?.is_some() {
            return Err(AccountError::DuplicateIdentity {
                field: "mobile".to_string(),
            }
            .into());
        }

        let user = User {
            id: new_user_id(),
            email: email.to_string(),
            mobile: mobile.to_string(),
            name: name.to_string(),
            password_hash: hash_password(&form.password)?,
            role,
            created_at: Utc::now(),
        };

        // a concurrent registration can still win the unique index
        match self.store.insert_user(user.clone()).await {
            Ok(()) => {}
            Err(StoreError::UniqueViolation { field }) => {
                return Err(AccountError::DuplicateIdentity { field }.into());
            }
            Err(err) => return Err(err.into()),
        }

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user)
    }

    /// Checks credentials and returns the user.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AccountError::Validation(
                "email and password are required".to_string(),
            )
            .into());
        }

        let user = self
            .store
            .find_user_by_email(email.trim())
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash) {
            return Err(AccountError::InvalidCredentials.into());
        }
        Ok(user)
    }

    /// Resolves a user id to an account.
    pub async fn get_user(&self, id: &UserId) -> Result<User> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| DomainError::Account(AccountError::Unauthenticated))
    }

    /// Creates an admin account unless one with that email already exists.
    #[tracing::instrument(skip(self, password))]
    pub async fn seed_admin(&self, email: &str, password: &str) -> Result<Option<User>> {
        if self.store.find_user_by_email(email).await?.is_some() {
            return Ok(None);
        }
        let form = Registration {
            name: "Administrator".to_string(),
            email: email.to_string(),
            mobile: format!("admin-{email}"),
            password: password.to_string(),
        };
        self.create_user(form, Role::Admin).await.map(Some)
    }
}

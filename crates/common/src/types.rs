use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an order.
///
/// Wraps a UUID to provide type safety and prevent mixing up
/// order IDs with other UUID-based identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Creates a new random order ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an order ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for OrderId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<OrderId> for Uuid {
    fn from(id: OrderId) -> Self {
        id.0
    }
}

impl std::str::FromStr for OrderId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates the identifier from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Product identifier.
    ProductId
);

string_id!(
    /// Identifier of a registered user.
    UserId
);

/// Who a cart belongs to: a signed-in user or an anonymous browser session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum IdentityKey {
    /// A signed-in user.
    User(UserId),
    /// An anonymous session token.
    Guest(String),
}

impl IdentityKey {
    /// Returns the key for a signed-in user.
    pub fn user(id: impl Into<UserId>) -> Self {
        Self::User(id.into())
    }

    /// Returns the key for an anonymous session.
    pub fn guest(token: impl Into<String>) -> Self {
        Self::Guest(token.into())
    }

    /// Returns the user ID when the identity is signed in.
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            IdentityKey::User(id) => Some(id),
            IdentityKey::Guest(_) => None,
        }
    }

    /// Returns the flat key used by durable cart storage.
    ///
    /// User and guest keys live in separate namespaces so a session token can
    /// never collide with a user ID.
    pub fn storage_key(&self) -> String {
        match self {
            IdentityKey::User(id) => format!("user:{id}"),
            IdentityKey::Guest(token) => format!("guest:{token}"),
        }
    }
}

impl std::fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.storage_key())
    }
}

/// Error returned when a storage key has neither the `user:` nor `guest:` prefix.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid identity key: {0}")]
pub struct InvalidIdentityKey(pub String);

impl std::str::FromStr for IdentityKey {
    type Err = InvalidIdentityKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some(("user", id)) if !id.is_empty() => Ok(IdentityKey::user(id)),
            Some(("guest", token)) if !token.is_empty() => Ok(IdentityKey::guest(token)),
            _ => Err(InvalidIdentityKey(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_id_new_creates_unique_ids() {
        let id1 = OrderId::new();
        let id2 = OrderId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn order_id_parses_from_string() {
        let id = OrderId::new();
        let parsed: OrderId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<OrderId>().is_err());
    }

    #[test]
    fn product_id_string_conversion() {
        let id = ProductId::new("SKU-001");
        assert_eq!(id.as_str(), "SKU-001");

        let id2: ProductId = "SKU-002".into();
        assert_eq!(id2.to_string(), "SKU-002");
    }

    #[test]
    fn identity_keys_do_not_collide() {
        let user = IdentityKey::user("42");
        let guest = IdentityKey::guest("42");
        assert_ne!(user.storage_key(), guest.storage_key());
        assert_eq!(user.user_id(), Some(&UserId::new("42")));
        assert_eq!(guest.user_id(), None);
    }

    #[test]
    fn identity_key_parses_storage_key() {
        let key = IdentityKey::guest("abc:def");
        let parsed: IdentityKey = key.storage_key().parse().unwrap();
        assert_eq!(parsed, key);

        assert!("admin:1".parse::<IdentityKey>().is_err());
        assert!("user:".parse::<IdentityKey>().is_err());
    }
}

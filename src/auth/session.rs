//! Session types for Phantom Banking authentication.
//!
//! A [`Session`] pairs the authenticated [`AuthUser`] with the current
//! [`AuthTokens`]. The two halves are always created, persisted and cleared
//! together; a stored user without tokens (or the reverse) is treated as no
//! session at all.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// The role of an authenticated user.
///
/// Roles form a closed set. The role is fixed when the session is created;
/// changing it requires logging in again.
///
/// # Example
///
/// ```rust
/// use phantom_banking::UserRole;
///
/// let role: UserRole = "MERCHANT".parse().unwrap();
/// assert_eq!(role, UserRole::Merchant);
/// assert_eq!(role.as_str(), "merchant");
/// assert!("auditor".parse::<UserRole>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UserRole {
    /// Platform administrator.
    Admin,
    /// Merchant operating wallets and payments.
    Merchant,
    /// End customer.
    Customer,
}

impl UserRole {
    /// Returns the wire name of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Merchant => "merchant",
            Self::Customer => "customer",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    // The backend has been seen returning upper-case role names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "merchant" => Ok(Self::Merchant),
            "customer" => Ok(Self::Customer),
            other => Err(format!(
                "unknown role '{other}', expected one of admin, merchant, customer"
            )),
        }
    }
}

impl Serialize for UserRole {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// The authenticated user record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Backend user identifier. Numeric ids are normalized to strings.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    /// Username, when the backend sends it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Email address, when the backend sends it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// The user's role.
    pub role: UserRole,
}

impl AuthUser {
    /// Creates a user record without a username or email.
    #[must_use]
    pub fn new(id: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: id.into(),
            username: None,
            email: None,
            role,
        }
    }

    /// Returns the username, falling back to the email address.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.username.as_deref().or(self.email.as_deref())
    }
}

/// The access/refresh token pair.
///
/// # Security
///
/// The `Debug` implementation masks both tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    /// Short-lived bearer token attached to API requests.
    pub access: String,
    /// Longer-lived token used to mint new access tokens.
    pub refresh: String,
}

impl AuthTokens {
    /// Creates a token pair.
    #[must_use]
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }
}

impl fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthTokens { access: *****, refresh: ***** }")
    }
}

/// An authenticated session: user identity plus current token pair.
///
/// # Example
///
/// ```rust
/// use phantom_banking::{AuthTokens, AuthUser, Session, UserRole};
///
/// let session = Session::new(
///     AuthUser::new("u-1", UserRole::Merchant),
///     AuthTokens::new("a1", "r1"),
/// );
///
/// assert_eq!(session.role(), UserRole::Merchant);
/// let json = serde_json::to_string(&session).unwrap();
/// let restored: Session = serde_json::from_str(&json).unwrap();
/// assert_eq!(session, restored);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The authenticated user.
    pub user: AuthUser,
    /// The current token pair.
    pub tokens: AuthTokens,
}

impl Session {
    /// Creates a new session.
    #[must_use]
    pub const fn new(user: AuthUser, tokens: AuthTokens) -> Self {
        Self { user, tokens }
    }

    /// Returns the user's role.
    #[must_use]
    pub const fn role(&self) -> UserRole {
        self.user.role
    }

    /// Returns a copy of this session with the access token replaced.
    ///
    /// The refresh token and user are kept.
    #[must_use]
    pub fn with_access_token(&self, access: impl Into<String>) -> Self {
        Self {
            user: self.user.clone(),
            tokens: AuthTokens {
                access: access.into(),
                refresh: self.tokens.refresh.clone(),
            },
        }
    }
}

// Verify session types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Session>();
    assert_send_sync::<UserRole>();
};

/// Accepts identifiers sent either as JSON strings or integers.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Text(s) if !s.trim().is_empty() => Ok(s),
        RawId::Text(_) => Err(de::Error::custom("identifier must not be empty")),
        RawId::Number(n) => Ok(n.to_string()),
    }
}

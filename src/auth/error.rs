//! Authentication error types.
//!
//! # Error Types
//!
//! - [`AuthError::Http`]: transport failure or non-2xx response
//! - [`AuthError::InvalidResponse`]: the server answered with an unexpected shape
//! - [`AuthError::NoRefreshToken`]: a refresh was requested without a stored session
//! - [`AuthError::InvalidPayload`]: the request was rejected before sending
//! - [`AuthError::Storage`]: the session could not be persisted
//!
//! `InvalidResponse` is kept apart from `Http` so callers can tell protocol
//! drift from transient failure and show a generic "try again" instead of
//! echoing server internals.
//!
//! # Example
//!
//! ```rust
//! use phantom_banking::auth::AuthError;
//!
//! let error = AuthError::InvalidResponse {
//!     endpoint: "/auth/login/",
//!     reason: "missing field `user_id`".to_string(),
//! };
//! assert!(error.is_invalid_response());
//! assert!(error.to_string().contains("/auth/login/"));
//! ```

use thiserror::Error;

use crate::auth::store::StorageError;
use crate::clients::HttpError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Transport failure or non-2xx response.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The response body did not match the expected shape.
    #[error("Invalid server response from {endpoint}: {reason}")]
    InvalidResponse {
        /// The endpoint path that answered.
        endpoint: &'static str,
        /// What was wrong with the body.
        reason: String,
    },

    /// No refresh token is stored.
    #[error("No refresh token available")]
    NoRefreshToken,

    /// The request payload failed validation before sending.
    #[error("Invalid request: {reason}")]
    InvalidPayload {
        /// What was wrong with the payload.
        reason: String,
    },

    /// Persisting or clearing the session failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// Returns `true` for response-shape failures.
    #[must_use]
    pub const fn is_invalid_response(&self) -> bool {
        matches!(self, Self::InvalidResponse { .. })
    }

    /// Returns `true` if the server could not be reached.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_network())
    }

    /// Returns the HTTP status code if the server answered with an error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status(),
            _ => None,
        }
    }

    pub(crate) fn invalid_payload(reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            reason: reason.into(),
        }
    }
}

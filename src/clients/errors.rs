//! HTTP-specific error types for the Phantom Banking SDK.
//!
//! # Error Handling
//!
//! - [`HttpResponseError`]: Non-2xx HTTP responses from the API
//! - [`MaxHttpRetriesExceededError`]: When retry attempts are exhausted
//! - [`InvalidHttpRequestError`]: When a request fails validation before sending
//! - [`HttpError`]: Unified error type encompassing all HTTP-related errors
//!
//! A 401 response is handled inside [`HttpClient`](crate::clients::HttpClient)
//! by refreshing the session. Callers only see it, as
//! [`HttpError::Response`] with code 401, when that refresh fails.
//!
//! # Example
//!
//! ```rust,ignore
//! use phantom_banking::clients::HttpError;
//!
//! match client.request(request).await {
//!     Ok(response) => println!("Success: {}", response.body),
//!     Err(HttpError::Response(e)) if e.code == 401 => {
//!         println!("Session expired, please log in again");
//!     }
//!     Err(HttpError::Response(e)) => {
//!         println!("API error {}: {}", e.code, e.message);
//!     }
//!     Err(HttpError::Network(e)) => {
//!         println!("Cannot reach the server: {}", e);
//!     }
//!     Err(other) => println!("{other}"),
//! }
//! ```

use thiserror::Error;

/// Error returned when an HTTP request receives a non-successful response.
///
/// The message is the server-provided description when the body carries one
/// (`detail`, `error`, `message`, or `errors`), otherwise a generic status line.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HttpResponseError {
    /// The HTTP status code of the response.
    pub code: u16,
    /// Server-provided error message, or a generic description.
    pub message: String,
    /// The parsed response body, for field-level validation errors.
    pub body: serde_json::Value,
    /// Reference ID for error reporting (from X-Request-Id header).
    pub error_reference: Option<String>,
}

impl HttpResponseError {
    /// Returns `true` if the server rejected the request's credentials.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.code == 401
    }
}

/// Error returned when maximum retry attempts have been exhausted.
///
/// This error is raised when a request continues to fail with 429 or 5xx
/// responses after all configured retry attempts have been made.
///
/// # Example
///
/// ```rust
/// use phantom_banking::clients::MaxHttpRetriesExceededError;
///
/// let error = MaxHttpRetriesExceededError {
///     code: 503,
///     tries: 3,
///     message: "Service unavailable".to_string(),
///     error_reference: None,
/// };
///
/// assert!(error.to_string().starts_with("Exceeded maximum retry count of 3"));
/// ```
#[derive(Debug, Error)]
#[error("Exceeded maximum retry count of {tries}. Last message: {message}")]
pub struct MaxHttpRetriesExceededError {
    /// The HTTP status code of the last response.
    pub code: u16,
    /// The number of tries that were attempted.
    pub tries: u32,
    /// Error message from the last response.
    pub message: String,
    /// Reference ID for error reporting (from X-Request-Id header).
    pub error_reference: Option<String>,
}

/// Error returned when an HTTP request fails validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// A POST, PUT or PATCH request was made without a body.
    #[error("Cannot use {method} without specifying data.")]
    MissingBody {
        /// The HTTP method that requires a body.
        method: String,
    },

    /// `tries` was set to zero.
    #[error("A request must be attempted at least once.")]
    ZeroTries,
}

/// Unified error type for all HTTP-related errors.
#[derive(Debug, Error)]
pub enum HttpError {
    /// An HTTP response error (non-2xx status code).
    #[error(transparent)]
    Response(#[from] HttpResponseError),

    /// Maximum retry attempts exhausted.
    #[error(transparent)]
    MaxRetries(#[from] MaxHttpRetriesExceededError),

    /// Request validation failed.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// Network or connection error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl HttpError {
    /// Returns the HTTP status code if the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Response(e) => Some(e.code),
            Self::MaxRetries(e) => Some(e.code),
            Self::InvalidRequest(_) | Self::Network(_) => None,
        }
    }

    /// Returns `true` for a 401 response.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Response(e) if e.is_unauthorized())
    }

    /// Returns `true` if the server could not be reached at all.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

//! Merchant API error types.
//!
//! # Example
//!
//! ```rust
//! use phantom_banking::merchant::MerchantError;
//!
//! let error = MerchantError::InvalidResponse {
//!     endpoint: "/merchant/dashboard/",
//!     reason: "expected a JSON document".to_string(),
//! };
//! assert!(error.to_string().contains("/merchant/dashboard/"));
//! ```

use crate::clients::HttpError;
use thiserror::Error;

/// Error type for merchant API operations.
#[derive(Debug, Error)]
pub enum MerchantError {
    /// An HTTP-level error occurred, including an unrecoverable 401.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The server answered 2xx with something other than a JSON document.
    #[error("Invalid server response from {endpoint}: {reason}")]
    InvalidResponse {
        /// The endpoint path that answered.
        endpoint: &'static str,
        /// What was wrong with the body.
        reason: String,
    },
}

impl MerchantError {
    /// Returns the HTTP status code if the server answered with an error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status(),
            Self::InvalidResponse { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::HttpResponseError;

    #[test]
    fn test_http_error_wraps_response_error() {
        let error = MerchantError::from(HttpError::Response(HttpResponseError {
            code: 403,
            message: "Forbidden".to_string(),
            body: serde_json::json!({}),
            error_reference: None,
        }));

        assert_eq!(error.to_string(), "Forbidden");
        assert_eq!(error.status(), Some(403));
    }

    #[test]
    fn test_invalid_response_has_no_status() {
        let error = MerchantError::InvalidResponse {
            endpoint: "/merchant/transactions/",
            reason: "bare string".to_string(),
        };
        assert_eq!(error.status(), None);
    }
}

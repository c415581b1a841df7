//! HTTP request types for the Phantom Banking SDK.
//!
//! This module provides the [`HttpRequest`] type and its builder for
//! constructing requests to the Phantom Banking API.

use std::collections::HashMap;
use std::fmt;

use crate::clients::errors::InvalidHttpRequestError;

/// HTTP methods used by the Phantom Banking API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    /// HTTP GET method for retrieving resources.
    Get,
    /// HTTP POST method for creating resources and auth actions.
    Post,
    /// HTTP PUT method for replacing resources.
    Put,
    /// HTTP PATCH method for partial updates.
    Patch,
    /// HTTP DELETE method for removing resources.
    Delete,
}

impl HttpMethod {
    /// Returns `true` if requests with this method must carry a body.
    #[must_use]
    pub const fn requires_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "get"),
            Self::Post => write!(f, "post"),
            Self::Put => write!(f, "put"),
            Self::Patch => write!(f, "patch"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// An HTTP request to be sent to the Phantom Banking API.
///
/// Bodies are always sent as JSON. Use [`HttpRequest::builder`] to construct
/// requests with the builder pattern.
///
/// # Example
///
/// ```rust
/// use phantom_banking::clients::{HttpRequest, HttpMethod};
/// use serde_json::json;
///
/// let get_request = HttpRequest::builder(HttpMethod::Get, "/merchant/transactions/")
///     .query_param("page", "2")
///     .build()
///     .unwrap();
///
/// let post_request = HttpRequest::builder(HttpMethod::Post, "/auth/verify-email/")
///     .body(json!({"token": "abc"}))
///     .build()
///     .unwrap();
/// assert!(post_request.refresh_on_unauthorized);
/// ```
#[derive(Clone, Debug)]
pub struct HttpRequest {
    /// The HTTP method for this request.
    pub http_method: HttpMethod,
    /// The path (relative to the base URL) for this request.
    pub path: String,
    /// The JSON request body, if any.
    pub body: Option<serde_json::Value>,
    /// Query parameters to append to the URL.
    pub query: Option<HashMap<String, String>>,
    /// Additional headers to include in the request.
    pub extra_headers: Option<HashMap<String, String>>,
    /// Number of times to attempt the request on 429/5xx (default: 1).
    pub tries: u32,
    /// Whether a 401 response triggers a session refresh and one replay.
    pub refresh_on_unauthorized: bool,
}

impl HttpRequest {
    /// Creates a new builder for constructing an `HttpRequest`.
    #[must_use]
    pub fn builder(method: HttpMethod, path: impl Into<String>) -> HttpRequestBuilder {
        HttpRequestBuilder::new(method, path)
    }

    /// Validates the request, ensuring it meets all requirements.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError`] if:
    /// - `http_method` is `Post`, `Put` or `Patch` but `body` is `None`
    /// - `tries` is zero
    pub fn verify(&self) -> Result<(), InvalidHttpRequestError> {
        if self.http_method.requires_body() && self.body.is_none() {
            return Err(InvalidHttpRequestError::MissingBody {
                method: self.http_method.to_string(),
            });
        }
        if self.tries == 0 {
            return Err(InvalidHttpRequestError::ZeroTries);
        }
        Ok(())
    }

    /// Returns `true` if the caller supplied its own `Authorization` header.
    #[must_use]
    pub fn has_authorization_header(&self) -> bool {
        self.extra_headers.as_ref().is_some_and(|headers| {
            headers
                .keys()
                .any(|key| key.eq_ignore_ascii_case("authorization"))
        })
    }
}

/// Builder for constructing [`HttpRequest`] instances.
#[derive(Debug)]
pub struct HttpRequestBuilder {
    http_method: HttpMethod,
    path: String,
    body: Option<serde_json::Value>,
    query: Option<HashMap<String, String>>,
    extra_headers: Option<HashMap<String, String>>,
    tries: u32,
    refresh_on_unauthorized: bool,
}

impl HttpRequestBuilder {
    fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            http_method: method,
            path: path.into(),
            body: None,
            query: None,
            extra_headers: None,
            tries: 1,
            refresh_on_unauthorized: true,
        }
    }

    /// Sets the JSON request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<serde_json::Value>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets all query parameters at once.
    #[must_use]
    pub fn query(mut self, query: HashMap<String, String>) -> Self {
        self.query = Some(query);
        self
    }

    /// Adds a single query parameter.
    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Sets all extra headers at once.
    #[must_use]
    pub fn extra_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.extra_headers = Some(headers);
        self
    }

    /// Adds a single extra header.
    ///
    /// An explicit `Authorization` header takes precedence over the stored
    /// session's bearer token.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Sets the number of times to attempt the request.
    ///
    /// Default is 1 (no retries). Higher values enable automatic retries for
    /// 429 and 5xx responses.
    #[must_use]
    pub const fn tries(mut self, tries: u32) -> Self {
        self.tries = tries;
        self
    }

    /// Disables the refresh-and-replay path for 401 responses.
    ///
    /// Used for the authentication endpoints themselves, where a 401 means
    /// bad credentials rather than an expired access token.
    #[must_use]
    pub const fn without_session_refresh(mut self) -> Self {
        self.refresh_on_unauthorized = false;
        self
    }

    /// Builds the [`HttpRequest`], validating it in the process.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError`] if the request fails validation.
    pub fn build(self) -> Result<HttpRequest, InvalidHttpRequestError> {
        let request = HttpRequest {
            http_method: self.http_method,
            path: self.path,
            body: self.body,
            query: self.query,
            extra_headers: self.extra_headers,
            tries: self.tries,
            refresh_on_unauthorized: self.refresh_on_unauthorized,
        };
        request.verify()?;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_http_method_display() {
        assert_eq!(HttpMethod::Get.to_string(), "get");
        assert_eq!(HttpMethod::Post.to_string(), "post");
        assert_eq!(HttpMethod::Patch.to_string(), "patch");
        assert_eq!(HttpMethod::Delete.to_string(), "delete");
    }

    #[test]
    fn test_builder_creates_valid_get_request() {
        let request = HttpRequest::builder(HttpMethod::Get, "/merchant/dashboard/")
            .build()
            .unwrap();

        assert_eq!(request.http_method, HttpMethod::Get);
        assert_eq!(request.path, "/merchant/dashboard/");
        assert!(request.body.is_none());
        assert_eq!(request.tries, 1);
        assert!(request.refresh_on_unauthorized);
    }

    #[test]
    fn test_verify_requires_body_for_post_put_patch() {
        for method in [HttpMethod::Post, HttpMethod::Put, HttpMethod::Patch] {
            let result = HttpRequest::builder(method, "/auth/login/").build();
            assert!(matches!(
                result,
                Err(InvalidHttpRequestError::MissingBody { method: m }) if m == method.to_string()
            ));
        }
    }

    #[test]
    fn test_verify_rejects_zero_tries() {
        let result = HttpRequest::builder(HttpMethod::Get, "/merchant/dashboard/")
            .tries(0)
            .build();
        assert_eq!(result.unwrap_err(), InvalidHttpRequestError::ZeroTries);
    }

    #[test]
    fn test_without_session_refresh_clears_flag() {
        let request = HttpRequest::builder(HttpMethod::Post, "/auth/login/")
            .body(json!({"username": "alice", "password": "pw"}))
            .without_session_refresh()
            .build()
            .unwrap();
        assert!(!request.refresh_on_unauthorized);
    }

    #[test]
    fn test_has_authorization_header_is_case_insensitive() {
        let request = HttpRequest::builder(HttpMethod::Get, "/merchant/dashboard/")
            .header("authorization", "Bearer explicit")
            .build()
            .unwrap();
        assert!(request.has_authorization_header());

        let request = HttpRequest::builder(HttpMethod::Get, "/merchant/dashboard/")
            .header("X-Custom-Header", "value")
            .build()
            .unwrap();
        assert!(!request.has_authorization_header());
    }

    #[test]
    fn test_builder_with_query_params() {
        let request = HttpRequest::builder(HttpMethod::Get, "/merchant/transactions/")
            .query_param("page", "2")
            .query_param("status", "completed")
            .build()
            .unwrap();

        let query = request.query.unwrap();
        assert_eq!(query.get("page"), Some(&"2".to_string()));
        assert_eq!(query.get("status"), Some(&"completed".to_string()));
    }
}

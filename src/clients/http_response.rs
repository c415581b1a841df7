//! HTTP response types for the Phantom Banking SDK.

use std::collections::HashMap;

/// An HTTP response from the Phantom Banking API.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// Response headers, keyed by lower-case name (headers may repeat).
    pub headers: HashMap<String, Vec<String>>,
    /// The parsed response body. Empty bodies parse as `{}`.
    pub body: serde_json::Value,
    /// Seconds to wait before retrying (from `Retry-After` header).
    pub retry_request_after: Option<f64>,
}

impl HttpResponse {
    /// Creates a new `HttpResponse`, parsing the `Retry-After` header.
    #[must_use]
    pub fn new(code: u16, headers: HashMap<String, Vec<String>>, body: serde_json::Value) -> Self {
        let retry_request_after = headers
            .get("retry-after")
            .and_then(|values| values.first())
            .and_then(|value| value.trim().parse::<f64>().ok())
            .filter(|secs| secs.is_finite() && *secs >= 0.0);

        Self {
            code,
            headers,
            body,
            retry_request_after,
        }
    }

    /// Returns `true` if the response has a 2xx status code.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns the first value of a header, by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns the request ID from the `X-Request-Id` header, if present.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header("x-request-id")
    }

    /// Extracts a human-readable error message from the body.
    ///
    /// Checks `detail`, `error`, `message`, then `errors`, falling back to a
    /// compact JSON rendering of any non-empty object body.
    #[must_use]
    pub fn server_message(&self) -> Option<String> {
        for key in ["detail", "error", "message"] {
            if let Some(value) = self.body.get(key) {
                return Some(match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                });
            }
        }

        if let Some(errors) = self.body.get("errors") {
            return Some(errors.to_string());
        }
        if let Some(raw) = self.body.get("raw_body").and_then(|v| v.as_str()) {
            return Some(raw.to_string());
        }

        match &self.body {
            serde_json::Value::Object(map) if !map.is_empty() => Some(self.body.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (k, v) in pairs {
            map.entry((*k).to_string()).or_default().push((*v).to_string());
        }
        map
    }

    #[test]
    fn test_is_ok_returns_true_for_2xx() {
        assert!(HttpResponse::new(200, HashMap::new(), json!({})).is_ok());
        assert!(HttpResponse::new(204, HashMap::new(), json!({})).is_ok());
    }

    #[test]
    fn test_is_ok_returns_false_for_4xx_and_5xx() {
        assert!(!HttpResponse::new(400, HashMap::new(), json!({})).is_ok());
        assert!(!HttpResponse::new(401, HashMap::new(), json!({})).is_ok());
        assert!(!HttpResponse::new(503, HashMap::new(), json!({})).is_ok());
    }

    #[test]
    fn test_retry_after_parsing() {
        let response = HttpResponse::new(429, headers(&[("retry-after", "2.5")]), json!({}));
        assert_eq!(response.retry_request_after, Some(2.5));

        let response = HttpResponse::new(429, headers(&[("retry-after", "soon")]), json!({}));
        assert_eq!(response.retry_request_after, None);
    }

    #[test]
    fn test_request_id_extraction() {
        let response = HttpResponse::new(500, headers(&[("x-request-id", "req-42")]), json!({}));
        assert_eq!(response.request_id(), Some("req-42"));
        assert_eq!(response.header("X-Request-Id"), Some("req-42"));
    }

    #[test]
    fn test_server_message_prefers_detail() {
        let response = HttpResponse::new(
            401,
            HashMap::new(),
            json!({"detail": "Given token not valid for any token type", "code": "token_not_valid"}),
        );
        assert_eq!(
            response.server_message().as_deref(),
            Some("Given token not valid for any token type")
        );
    }

    #[test]
    fn test_server_message_renders_field_errors() {
        let response = HttpResponse::new(
            400,
            HashMap::new(),
            json!({"contact_email": ["Enter a valid email address."]}),
        );
        let message = response.server_message().unwrap();
        assert!(message.contains("contact_email"));
        assert!(message.contains("Enter a valid email address."));
    }

    #[test]
    fn test_server_message_none_for_empty_body() {
        let response = HttpResponse::new(502, HashMap::new(), json!({}));
        assert!(response.server_message().is_none());
    }
}

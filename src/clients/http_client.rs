//! HTTP client for Phantom Banking API communication.
//!
//! This module provides the [`HttpClient`] type: the one shared object that
//! issues requests, attaches the session's bearer token, and recovers from
//! expired access tokens.
//!
//! # Unauthorized responses
//!
//! When a request that carried the stored access token comes back 401, the
//! client refreshes the session and replays the request once. Refreshes are
//! single-flight: concurrent failures queue behind one gate (a fair async
//! mutex, so waiters are released in the order they failed). The first
//! waiter performs the refresh; each later waiter sees the rotated token and
//! replays without refreshing again. Each waiter keeps the gate until its
//! replay has completed, so replays are issued one at a time in FIFO order. If the refresh fails, the session is
//! cleared, a redirect to the login view is published on the
//! [`SessionContext`], and the original 401 is returned.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::auth::{token_refresh, AuthError, Route, SessionContext, TokenStore};
use crate::clients::errors::{HttpError, HttpResponseError, MaxHttpRetriesExceededError};
use crate::clients::http_request::{HttpMethod, HttpRequest};
use crate::clients::http_response::HttpResponse;
use crate::config::{BaseUrl, ClientConfig};

/// Fixed retry wait time in seconds for 5xx responses and 429 without `Retry-After`.
pub const RETRY_WAIT_TIME: u64 = 1;

/// SDK version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// HTTP client for making requests to the Phantom Banking API.
///
/// The client handles:
/// - URL construction from the configured base URL
/// - Default headers including User-Agent and Accept
/// - Bearer token injection from the [`TokenStore`]
/// - Single-flight session refresh and replay on 401
/// - Optional retry logic for 429 and 5xx responses
///
/// # Thread Safety
///
/// `HttpClient` is `Send + Sync`; share it behind an `Arc`.
///
/// # Example
///
/// ```rust,ignore
/// use phantom_banking::clients::{HttpClient, HttpMethod, HttpRequest};
/// use phantom_banking::auth::{SessionContext, TokenStore};
///
/// let store = TokenStore::in_memory();
/// let session = SessionContext::restore(&store);
/// let client = HttpClient::new(&config, store, session);
///
/// let request = HttpRequest::builder(HttpMethod::Get, "/merchant/dashboard/")
///     .build()
///     .unwrap();
/// let response = client.request(request).await?;
/// ```
#[derive(Debug)]
pub struct HttpClient {
    /// The internal reqwest HTTP client.
    client: reqwest::Client,
    /// Base URL all request paths are appended to.
    base_url: BaseUrl,
    /// Default headers to include in all requests.
    default_headers: HashMap<String, String>,
    /// Persisted session the bearer token is read from.
    store: TokenStore,
    /// Observable session state updated on forced logout.
    session: SessionContext,
    /// Serializes refreshes. Waiters are released in FIFO order.
    refresh_gate: Mutex<()>,
}

// Verify HttpClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpClient>();
};

impl HttpClient {
    /// Creates a new HTTP client.
    ///
    /// # Panics
    ///
    /// Panics if the underlying reqwest client cannot be created. This should
    /// only happen in extremely unusual circumstances (e.g., TLS initialization failure).
    #[must_use]
    pub fn new(config: &ClientConfig, store: TokenStore, session: SessionContext) -> Self {
        let user_agent_prefix = config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        let user_agent = format!(
            "{user_agent_prefix}Phantom Banking Client v{SDK_VERSION} | Rust {rust_version}"
        );

        let mut default_headers = HashMap::new();
        default_headers.insert("User-Agent".to_string(), user_agent);
        default_headers.insert("Accept".to_string(), "application/json".to_string());

        let mut builder = reqwest::Client::builder().use_rustls_tls();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.base_url().clone(),
            default_headers,
            store,
            session,
            refresh_gate: Mutex::new(()),
        }
    }

    /// Returns the base URL for this client.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the default headers for this client.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Returns the token store this client reads bearer tokens from.
    #[must_use]
    pub const fn token_store(&self) -> &TokenStore {
        &self.store
    }

    /// Returns the session context this client updates.
    #[must_use]
    pub const fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Sends an HTTP request to the Phantom Banking API.
    ///
    /// The stored access token is attached unless the request carries its own
    /// `Authorization` header. A 401 on such a request triggers the
    /// refresh-and-replay path described in the module docs.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if:
    /// - Request validation fails (`InvalidRequest`)
    /// - Network error occurs (`Network`)
    /// - Non-2xx response received (`Response`), including the original 401
    ///   when the session could not be refreshed
    /// - Max retries exceeded (`MaxRetries`)
    pub async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        request.verify()?;

        let caller_authorized = request.has_authorization_header();
        let sent_token = if caller_authorized {
            None
        } else {
            self.store.access_token()
        };

        match self.send(&request, sent_token.as_deref()).await {
            Err(HttpError::Response(error))
                if error.is_unauthorized()
                    && request.refresh_on_unauthorized
                    && !caller_authorized =>
            {
                // Held through the replay so replays reach the server in the
                // order their 401s arrived.
                let _gate = self.refresh_gate.lock().await;
                match self.refresh_after_unauthorized(sent_token.as_deref()).await {
                    Ok(access) => {
                        tracing::debug!(
                            "Replaying {} {} with refreshed token",
                            request.http_method,
                            request.path
                        );
                        self.send(&request, Some(&access)).await
                    }
                    Err(refresh_error) => {
                        tracing::warn!(
                            "Session refresh failed after 401 on {}: {}",
                            request.path,
                            refresh_error
                        );
                        Err(HttpError::Response(error))
                    }
                }
            }
            other => other,
        }
    }

    /// Refreshes the access token unconditionally, behind the refresh gate.
    ///
    /// On failure the session is cleared and a login redirect is published.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NoRefreshToken`] without any network call when no
    /// refresh token is stored, or the refresh request's error.
    pub async fn refresh_session(&self) -> Result<String, AuthError> {
        let _gate = self.refresh_gate.lock().await;
        self.refresh_locked().await
    }

    /// Refresh path for a request that was rejected while carrying `stale`.
    ///
    /// Must be called with the refresh gate held.
    async fn refresh_after_unauthorized(&self, stale: Option<&str>) -> Result<String, AuthError> {
        // Another waiter already rotated the token while we queued.
        if let Some(current) = self.store.access_token() {
            if stale != Some(current.as_str()) {
                tracing::debug!("Token already refreshed by a concurrent request");
                return Ok(current);
            }
        }

        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<String, AuthError> {
        match token_refresh::refresh_access_token(self).await {
            Ok(access) => Ok(access),
            Err(e) => {
                self.expire_session();
                Err(e)
            }
        }
    }

    /// Clears the persisted session and sends the user to the login view.
    fn expire_session(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!("Failed to clear stored session: {}", e);
        }
        self.session.force_redirect(Route::Login);
    }

    /// Sends a request once (with 429/5xx retries), without the 401 path.
    ///
    /// `bearer` is attached as `Authorization: Bearer <bearer>` unless the
    /// request carries its own `Authorization` header.
    pub(crate) async fn send(
        &self,
        request: &HttpRequest,
        bearer: Option<&str>,
    ) -> Result<HttpResponse, HttpError> {
        let url = self.base_url.join(&request.path);

        // Merge headers
        let mut headers = self.default_headers.clone();
        if request.body.is_some() {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }
        if let Some(token) = bearer.filter(|t| !t.is_empty()) {
            if !request.has_authorization_header() {
                headers.insert("Authorization".to_string(), format!("Bearer {token}"));
            }
        }
        if let Some(extra) = &request.extra_headers {
            for (key, value) in extra {
                headers.insert(key.clone(), value.clone());
            }
        }

        // Retry loop
        let mut tries: u32 = 0;
        loop {
            tries += 1;

            let mut req_builder = match request.http_method {
                HttpMethod::Get => self.client.get(&url),
                HttpMethod::Post => self.client.post(&url),
                HttpMethod::Put => self.client.put(&url),
                HttpMethod::Patch => self.client.patch(&url),
                HttpMethod::Delete => self.client.delete(&url),
            };

            for (key, value) in &headers {
                req_builder = req_builder.header(key, value);
            }
            if let Some(query) = &request.query {
                req_builder = req_builder.query(query);
            }
            if let Some(body) = &request.body {
                req_builder = req_builder.body(body.to_string());
            }

            tracing::debug!("Sending {} {}", request.http_method, request.path);
            let res = req_builder.send().await?;

            let code = res.status().as_u16();
            let res_headers = Self::parse_response_headers(res.headers());
            let body_text = res.text().await.unwrap_or_default();

            let body = if body_text.trim().is_empty() {
                serde_json::json!({})
            } else {
                serde_json::from_str(&body_text).unwrap_or_else(|_| {
                    // Keep non-JSON error pages around for the error message
                    if code >= 400 {
                        serde_json::json!({ "raw_body": body_text })
                    } else {
                        serde_json::Value::String(body_text)
                    }
                })
            };

            let response = HttpResponse::new(code, res_headers, body);

            if let Some(reason) = response.header("x-api-deprecated-reason") {
                tracing::warn!(
                    "Deprecated request to Phantom Banking API at {}, received reason: {}",
                    request.path,
                    reason
                );
            }

            if response.is_ok() {
                return Ok(response);
            }

            let message = Self::error_message(&response);
            let error_reference = response.request_id().map(String::from);

            let should_retry = code == 429 || code >= 500;
            if !should_retry {
                return Err(HttpError::Response(HttpResponseError {
                    code,
                    message,
                    body: response.body,
                    error_reference,
                }));
            }

            if tries >= request.tries {
                if request.tries == 1 {
                    return Err(HttpError::Response(HttpResponseError {
                        code,
                        message,
                        body: response.body,
                        error_reference,
                    }));
                }
                return Err(HttpError::MaxRetries(MaxHttpRetriesExceededError {
                    code,
                    tries: request.tries,
                    message,
                    error_reference,
                }));
            }

            let delay = Self::calculate_retry_delay(&response, code);
            tracing::debug!(
                "Retrying {} after {:?} (status {}, try {} of {})",
                request.path,
                delay,
                code,
                tries,
                request.tries
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Parses response headers into a `HashMap`.
    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }

    /// Calculates the retry delay based on response and status code.
    fn calculate_retry_delay(response: &HttpResponse, status: u16) -> std::time::Duration {
        // 429 honors Retry-After; 5xx always waits the fixed delay
        if status == 429 {
            if let Some(retry_after) = response.retry_request_after {
                return std::time::Duration::from_secs_f64(retry_after);
            }
        }
        std::time::Duration::from_secs(RETRY_WAIT_TIME)
    }

    fn error_message(response: &HttpResponse) -> String {
        response
            .server_message()
            .unwrap_or_else(|| format!("Request failed with status {}", response.code))
    }
}

//! Authenticated merchant endpoints.
//!
//! [`MerchantApi`] issues bearer-authenticated GET requests through the shared
//! [`HttpClient`], so expired access tokens are refreshed and the request
//! replayed transparently. Response bodies are returned as JSON documents.
//!
//! # Example
//!
//! ```rust,ignore
//! let dashboard = client.merchant().dashboard().await?;
//! println!("Balance: {}", dashboard["balance"]);
//! ```

mod errors;

use std::sync::Arc;

pub use errors::MerchantError;

use crate::clients::{HttpClient, HttpMethod, HttpRequest};

const DASHBOARD_ENDPOINT: &str = "/merchant/dashboard/";
const TRANSACTIONS_ENDPOINT: &str = "/merchant/transactions/";
const API_CREDENTIALS_ENDPOINT: &str = "/merchant/generate_api_credentials/";

/// Client for the merchant portal endpoints.
#[derive(Clone, Debug)]
pub struct MerchantApi {
    http: Arc<HttpClient>,
}

// Verify MerchantApi is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<MerchantApi>();
};

impl MerchantApi {
    /// Creates a merchant API bound to `http`.
    #[must_use]
    pub const fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Fetches the merchant dashboard summary.
    ///
    /// # Errors
    ///
    /// Returns [`MerchantError::Http`] for HTTP-level errors and
    /// [`MerchantError::InvalidResponse`] for a non-JSON body.
    pub async fn dashboard(&self) -> Result<serde_json::Value, MerchantError> {
        self.get(DASHBOARD_ENDPOINT).await
    }

    /// Lists the merchant's transactions.
    ///
    /// # Errors
    ///
    /// Returns [`MerchantError::Http`] for HTTP-level errors and
    /// [`MerchantError::InvalidResponse`] for a non-JSON body.
    pub async fn transactions(&self) -> Result<serde_json::Value, MerchantError> {
        self.get(TRANSACTIONS_ENDPOINT).await
    }

    /// Generates a fresh API key pair for the merchant.
    ///
    /// # Errors
    ///
    /// Returns [`MerchantError::Http`] for HTTP-level errors and
    /// [`MerchantError::InvalidResponse`] for a non-JSON body.
    pub async fn generate_api_credentials(&self) -> Result<serde_json::Value, MerchantError> {
        self.get(API_CREDENTIALS_ENDPOINT).await
    }

    async fn get(&self, endpoint: &'static str) -> Result<serde_json::Value, MerchantError> {
        let request = HttpRequest::builder(HttpMethod::Get, endpoint)
            .build()
            .map_err(|e| MerchantError::Http(e.into()))?;
        let response = self.http.request(request).await?;

        match response.body {
            body @ (serde_json::Value::Object(_) | serde_json::Value::Array(_)) => Ok(body),
            other => Err(MerchantError::InvalidResponse {
                endpoint,
                reason: format!("expected a JSON object or array, got {}", kind_of(&other)),
            }),
        }
    }
}

const fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

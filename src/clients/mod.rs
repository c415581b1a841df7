//! HTTP client types for Phantom Banking API communication.
//!
//! This module provides the transport layer: building requests, attaching the
//! session's bearer token, parsing responses, and recovering from expired
//! access tokens.
//!
//! # Overview
//!
//! - [`HttpClient`]: The async HTTP client shared by every service
//! - [`HttpRequest`]: A request to be sent to the API
//! - [`HttpResponse`]: A parsed response from the API
//! - [`HttpMethod`]: Supported HTTP methods
//! - [`HttpError`]: Transport, status and validation failures
//!
//! # Retry Behavior
//!
//! The client implements optional retry logic for transient failures:
//!
//! - **429 (Rate Limited)**: Retries using `Retry-After` header value, or 1 second if not present
//! - **5xx (Server Error)**: Retries with fixed 1-second delay
//! - **401 (Unauthorized)**: Never retried here; handled by the session refresh path
//! - **Other errors (4xx)**: Returns immediately without retry
//!
//! The default `tries` is 1, meaning no automatic retries. Configure via
//! [`HttpRequest::builder`] with `.tries(n)` to enable retries.

mod errors;
mod http_client;
mod http_request;
mod http_response;

pub use errors::{
    HttpError, HttpResponseError, InvalidHttpRequestError, MaxHttpRetriesExceededError,
};
pub use http_client::{HttpClient, RETRY_WAIT_TIME, SDK_VERSION};
pub use http_request::{HttpMethod, HttpRequest, HttpRequestBuilder};
pub use http_response::HttpResponse;

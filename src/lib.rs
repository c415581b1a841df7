//! # Phantom Banking Client SDK
//!
//! A Rust client for the Phantom Banking REST API, providing two-factor
//! login, persistent sessions, transparent access-token refresh, and
//! role-based route guarding for merchant, admin and customer portals.
//!
//! ## Overview
//!
//! This SDK provides:
//! - Type-safe configuration via [`ClientConfig`] and [`ClientConfigBuilder`]
//! - Two-step login (password, then OTP) via [`auth::AuthService`]
//! - Session persistence behind a pluggable [`auth::Storage`] backend
//! - An async HTTP client that attaches bearer tokens and refreshes expired
//!   ones exactly once per expiry window, however many requests fail at once
//! - Observable session state via [`auth::SessionContext`]
//! - Role-based access decisions via [`auth::RouteGuard`]
//! - Authenticated merchant endpoints via [`merchant::MerchantApi`]
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use phantom_banking::{BaseUrl, ClientConfig, PhantomClient};
//! use phantom_banking::auth::MemoryStorage;
//!
//! let config = ClientConfig::builder()
//!     .base_url(BaseUrl::new("https://api.phantombanking.example/api/v1").unwrap())
//!     .user_agent_prefix("MerchantPortal/2.1")
//!     .build()
//!     .unwrap();
//!
//! let client = PhantomClient::new(&config, Arc::new(MemoryStorage::new()));
//! assert!(!client.session().is_authenticated());
//! ```
//!
//! ## Signing In
//!
//! ```rust,ignore
//! use phantom_banking::auth::{Credentials, OtpCode};
//!
//! // Step 1: password. The server sends an OTP out of band.
//! let challenge = client.auth().login(&Credentials::new("alice", "pw")).await?;
//!
//! // Step 2: OTP. The session is persisted and published.
//! let otp = OtpCode::new("123456")?;
//! let session = client.auth().verify_2fa(&challenge.user_id, &otp).await?;
//! assert_eq!(session.role(), phantom_banking::UserRole::Merchant);
//! ```
//!
//! ## Guarding Views
//!
//! ```rust,ignore
//! use phantom_banking::auth::{GuardDecision, RouteGuard};
//! use phantom_banking::UserRole;
//!
//! let guard = RouteGuard::new([UserRole::Merchant]);
//! match guard.check(client.session()) {
//!     GuardDecision::Render => render_dashboard(client.merchant().dashboard().await?),
//!     GuardDecision::Redirect(route) => navigate(route.path()),
//! }
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: storage, session context and client are passed explicitly
//! - **Fail-fast validation**: newtypes and payloads validate before any I/O
//! - **Thread-safe**: all shared handles are `Send + Sync`
//! - **Async-first**: designed for use with the Tokio runtime

pub mod auth;
mod client;
pub mod clients;
pub mod config;
pub mod error;
pub mod merchant;

// Re-export public types at crate root for convenience
pub use auth::{AuthError, AuthTokens, AuthUser, Session, UserRole};
pub use client::PhantomClient;
pub use config::{BaseUrl, ClientConfig, ClientConfigBuilder};
pub use error::ConfigError;

// Re-export HTTP client types
pub use clients::{
    HttpClient, HttpError, HttpMethod, HttpRequest, HttpRequestBuilder, HttpResponse,
    HttpResponseError, InvalidHttpRequestError, MaxHttpRetriesExceededError,
};

pub use merchant::{MerchantApi, MerchantError};

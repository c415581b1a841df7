//! Authentication and session management for the Phantom Banking API.
//!
//! # Overview
//!
//! - [`AuthService`]: login with OTP, refresh, logout, sign-up and account recovery
//! - [`TokenStore`]: persists the session in a [`Storage`] backend
//! - [`SessionContext`]: observable "who is signed in" state
//! - [`RouteGuard`]: role-based access decisions for protected views
//! - [`Session`], [`AuthUser`], [`AuthTokens`], [`UserRole`]: session data
//!
//! # Login Flow
//!
//! Login takes two steps. The password step returns a user id and records it
//! as the pending 2FA user; no session exists yet. The OTP step returns the
//! token pair and user, which are persisted together and published to the
//! session context.
//!
//! ```rust,ignore
//! use phantom_banking::auth::{Credentials, OtpCode};
//!
//! let challenge = auth.login(&Credentials::new("alice", "pw")).await?;
//! let session = auth
//!     .verify_2fa(&challenge.user_id, &OtpCode::new("123456")?)
//!     .await?;
//! ```
//!
//! # Session Restore
//!
//! ```rust
//! use phantom_banking::auth::{AuthTokens, AuthUser, Session, SessionContext, TokenStore};
//! use phantom_banking::UserRole;
//!
//! let store = TokenStore::in_memory();
//! store
//!     .save(&Session::new(
//!         AuthUser::new("u-1", UserRole::Merchant),
//!         AuthTokens::new("a1", "r1"),
//!     ))
//!     .unwrap();
//!
//! let context = SessionContext::restore(&store);
//! assert_eq!(context.role(), Some(UserRole::Merchant));
//! ```

mod context;
mod error;
mod guard;
mod payloads;
mod service;
pub mod session;
mod store;
pub(crate) mod token_refresh;

pub use context::{Route, SessionContext, SessionState};
pub use error::AuthError;
pub use guard::{GuardDecision, RouteGuard};
pub use payloads::{
    Acknowledgement, Credentials, LoginChallenge, MerchantRegistration, OtpCode,
    RegisterMerchantPayload,
};
pub use service::AuthService;
pub use session::{AuthTokens, AuthUser, Session, UserRole};
pub use store::{
    FileStorage, MemoryStorage, Storage, StorageError, StoredAuth, TokenStore,
    PENDING_2FA_STORAGE_KEY, SESSION_STORAGE_KEY,
};

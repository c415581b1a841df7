//! Authentication operations against the Phantom Banking API.
//!
//! [`AuthService`] drives the two-step login (password, then OTP), token
//! refresh, logout, merchant sign-up and the account recovery endpoints. It
//! keeps the [`TokenStore`](crate::auth::TokenStore) and the
//! [`SessionContext`](crate::auth::SessionContext) owned by its
//! [`HttpClient`] in step with the server.
//!
//! Every request issued here opts out of the client's refresh-on-401 path, so
//! a rejected password is reported as-is and never triggers a refresh.
//!
//! # Example
//!
//! ```rust,ignore
//! use phantom_banking::auth::{Credentials, OtpCode};
//!
//! let challenge = client.auth().login(&Credentials::new("alice", "pw")).await?;
//! let otp = OtpCode::new("123456")?;
//! let session = client.auth().verify_2fa(&challenge.user_id, &otp).await?;
//!
//! assert!(client.session().is_authenticated());
//! ```

use std::sync::Arc;

use crate::auth::error::AuthError;
use crate::auth::payloads::{
    decode, encode, require_email, require_matching_passwords, require_non_empty,
    Acknowledgement, Credentials, LoginChallenge, LogoutRequest, MerchantRegistration, OtpCode,
    RegisterMerchantPayload, ResetPasswordRequest, VerifyOtpRequest, VerifyOtpResponse,
};
use crate::auth::session::Session;
use crate::clients::{HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse};

const LOGIN_ENDPOINT: &str = "/auth/login/";
const VERIFY_2FA_ENDPOINT: &str = "/auth/verify-2fa/";
const LOGOUT_ENDPOINT: &str = "/auth/logout/";
const MERCHANT_SIGNUP_ENDPOINT: &str = "/auth/merchant_signup/";
const VERIFY_EMAIL_ENDPOINT: &str = "/auth/verify-email/";
const REQUEST_PASSWORD_RESET_ENDPOINT: &str = "/auth/request_password_reset/";
const RESET_PASSWORD_ENDPOINT: &str = "/auth/reset_password/";

/// Authentication service bound to a shared [`HttpClient`].
///
/// Cheap to clone; clones share the client.
#[derive(Clone, Debug)]
pub struct AuthService {
    http: Arc<HttpClient>,
}

// Verify AuthService is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AuthService>();
};

impl AuthService {
    /// Creates a service that issues requests through `http`.
    #[must_use]
    pub const fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Submits username and password, starting two-factor login.
    ///
    /// On success the returned user id is recorded as the pending 2FA user.
    /// No session is created until [`verify_2fa`](Self::verify_2fa) succeeds.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidPayload`] for empty credentials
    /// - [`AuthError::Http`] for transport failures or rejected credentials
    /// - [`AuthError::InvalidResponse`] if the body has no `user_id`
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginChallenge, AuthError> {
        credentials.validate()?;

        let response = self.post(LOGIN_ENDPOINT, encode(credentials)?).await?;
        let challenge: LoginChallenge = decode(LOGIN_ENDPOINT, response.body)?;

        self.http.token_store().set_pending_user(&challenge.user_id)?;
        tracing::info!("Password accepted for user {}, awaiting OTP", challenge.user_id);

        Ok(challenge)
    }

    /// Verifies the one-time password and establishes the session.
    ///
    /// The session is persisted, the pending 2FA user id is forgotten and the
    /// session context becomes authenticated.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidPayload`] for an empty user id
    /// - [`AuthError::Http`] for transport failures or a rejected code
    /// - [`AuthError::InvalidResponse`] if tokens or user are missing
    /// - [`AuthError::Storage`] if the session cannot be persisted
    pub async fn verify_2fa(&self, user_id: &str, otp: &OtpCode) -> Result<Session, AuthError> {
        require_non_empty("user_id", user_id)?;

        let body = encode(&VerifyOtpRequest { user_id, otp })?;
        let response = self.post(VERIFY_2FA_ENDPOINT, body).await?;
        let session = decode::<VerifyOtpResponse>(VERIFY_2FA_ENDPOINT, response.body)?
            .into_session(VERIFY_2FA_ENDPOINT)?;

        let store = self.http.token_store();
        store.save(&session)?;
        if let Err(e) = store.clear_pending_user() {
            tracing::warn!("Failed to clear pending 2FA user: {}", e);
        }
        self.http.session().set_authenticated(session.user.clone());
        tracing::info!(
            "User {} signed in with role {}",
            session.user.id,
            session.role()
        );

        Ok(session)
    }

    /// Exchanges the stored refresh token for a new access token.
    ///
    /// Shares the single-flight gate with the client's automatic refresh. A
    /// failed refresh ends the session and publishes a login redirect.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NoRefreshToken`] without any network call if no session is stored
    /// - [`AuthError::Http`] or [`AuthError::InvalidResponse`] if the refresh fails
    pub async fn refresh_token(&self) -> Result<String, AuthError> {
        self.http.refresh_session().await
    }

    /// Ends the session.
    ///
    /// The server is told to revoke the refresh token on a best-effort basis:
    /// any failure there (including having no refresh token) is logged and
    /// ignored. Local state is always cleared.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] only if the local session cannot be removed.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let store = self.http.token_store();

        match store.refresh_token() {
            Some(refresh_token) => {
                if let Err(e) = self.revoke(&refresh_token).await {
                    tracing::warn!("Logout request failed, clearing local session anyway: {}", e);
                }
            }
            None => tracing::debug!("No refresh token stored, skipping logout request"),
        }

        let cleared = store.clear();
        self.http.session().set_unauthenticated();
        tracing::info!("Signed out");

        cleared.map_err(AuthError::from)
    }

    /// Registers a new merchant and its first admin user.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidPayload`] for missing fields, malformed emails or
    ///   mismatched passwords
    /// - [`AuthError::Http`] if the server rejects the registration
    /// - [`AuthError::InvalidResponse`] if the ids are missing
    pub async fn register_merchant(
        &self,
        payload: &RegisterMerchantPayload,
    ) -> Result<MerchantRegistration, AuthError> {
        payload.validate()?;

        let response = self.post(MERCHANT_SIGNUP_ENDPOINT, encode(payload)?).await?;
        let registration: MerchantRegistration = decode(MERCHANT_SIGNUP_ENDPOINT, response.body)?;
        tracing::info!("Registered merchant {}", registration.merchant_id);

        Ok(registration)
    }

    /// Confirms an email address with the token sent to it.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidPayload`] for an empty token, or the
    /// request's error.
    pub async fn verify_email(&self, token: &str) -> Result<Acknowledgement, AuthError> {
        require_non_empty("token", token)?;
        let body = serde_json::json!({ "token": token });
        self.acknowledged(VERIFY_EMAIL_ENDPOINT, body).await
    }

    /// Asks the server to send a password reset link.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidPayload`] for a malformed email, or the
    /// request's error.
    pub async fn request_password_reset(&self, email: &str) -> Result<Acknowledgement, AuthError> {
        require_email("email", email)?;
        let body = serde_json::json!({ "email": email.trim() });
        self.acknowledged(REQUEST_PASSWORD_RESET_ENDPOINT, body).await
    }

    /// Sets a new password using a reset token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidPayload`] for an empty token or mismatched
    /// passwords, or the request's error.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<Acknowledgement, AuthError> {
        require_non_empty("token", token)?;
        require_matching_passwords(new_password, confirm_password)?;

        let body = encode(&ResetPasswordRequest {
            token,
            new_password,
            confirm_password,
        })?;
        self.acknowledged(RESET_PASSWORD_ENDPOINT, body).await
    }

    async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        let body = encode(&LogoutRequest { refresh_token })?;
        self.post(LOGOUT_ENDPOINT, body).await?;
        Ok(())
    }

    async fn acknowledged(
        &self,
        endpoint: &'static str,
        body: serde_json::Value,
    ) -> Result<Acknowledgement, AuthError> {
        let response = self.post(endpoint, body).await?;
        decode(endpoint, response.body)
    }

    async fn post(
        &self,
        endpoint: &'static str,
        body: serde_json::Value,
    ) -> Result<HttpResponse, AuthError> {
        let request = HttpRequest::builder(HttpMethod::Post, endpoint)
            .body(body)
            .without_session_refresh()
            .build()
            .map_err(HttpError::from)?;
        Ok(self.http.request(request).await?)
    }
}

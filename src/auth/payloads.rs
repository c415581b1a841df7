//! Request and response shapes for the authentication endpoints.
//!
//! Request payloads are validated before anything is sent. Response bodies
//! are decoded into typed structs; a body that does not decode is reported
//! as [`AuthError::InvalidResponse`].

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::auth::error::AuthError;
use crate::auth::session::{deserialize_id, AuthTokens, AuthUser, Session};

/// Login credentials. Never persisted.
///
/// # Security
///
/// The `Debug` implementation masks the password.
#[derive(Clone, Serialize)]
pub struct Credentials {
    /// Username or email address.
    pub username: String,
    /// Plain-text password, sent once over the wire.
    pub password: String,
}

impl Credentials {
    /// Creates a credentials pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), AuthError> {
        require_non_empty("username", &self.username)?;
        if self.password.is_empty() {
            return Err(AuthError::invalid_payload("password is required"));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"*****")
            .finish()
    }
}

/// A validated one-time password for the second authentication factor.
///
/// OTP codes are exactly six ASCII digits. Surrounding whitespace is trimmed.
///
/// # Example
///
/// ```rust
/// use phantom_banking::auth::OtpCode;
///
/// let otp = OtpCode::new(" 123456 ").unwrap();
/// assert_eq!(otp.as_ref(), "123456");
/// assert_eq!(format!("{:?}", otp), "OtpCode(*****)");
///
/// assert!(OtpCode::new("12345").is_err());
/// assert!(OtpCode::new("12a456").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OtpCode(String);

impl OtpCode {
    /// Number of digits in a valid code.
    pub const LENGTH: usize = 6;

    /// Creates a new validated OTP code.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidPayload`] if the code is not exactly six digits.
    pub fn new(code: impl AsRef<str>) -> Result<Self, AuthError> {
        let code = code.as_ref().trim();
        if code.len() != Self::LENGTH || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AuthError::invalid_payload(format!(
                "OTP must be exactly {} digits",
                Self::LENGTH
            )));
        }
        Ok(Self(code.to_string()))
    }
}

impl AsRef<str> for OtpCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(*****)")
    }
}

/// Fields submitted when a merchant signs up.
#[derive(Clone, Serialize)]
pub struct RegisterMerchantPayload {
    /// Registered business name.
    pub business_name: String,
    /// Company registration number.
    pub registration_number: String,
    /// Business contact email.
    pub contact_email: String,
    /// Business contact phone number.
    pub contact_phone: String,
    /// Name of the merchant's first admin user.
    pub admin_name: String,
    /// Email of the merchant's first admin user.
    pub admin_email: String,
    /// Password for the admin user.
    pub password: String,
    /// Must equal `password`.
    pub confirm_password: String,
}

impl RegisterMerchantPayload {
    pub(crate) fn validate(&self) -> Result<(), AuthError> {
        require_non_empty("business_name", &self.business_name)?;
        require_non_empty("registration_number", &self.registration_number)?;
        require_email("contact_email", &self.contact_email)?;
        require_non_empty("contact_phone", &self.contact_phone)?;
        require_non_empty("admin_name", &self.admin_name)?;
        require_email("admin_email", &self.admin_email)?;
        require_matching_passwords(&self.password, &self.confirm_password)
    }
}

impl fmt::Debug for RegisterMerchantPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterMerchantPayload")
            .field("business_name", &self.business_name)
            .field("registration_number", &self.registration_number)
            .field("contact_email", &self.contact_email)
            .field("contact_phone", &self.contact_phone)
            .field("admin_name", &self.admin_name)
            .field("admin_email", &self.admin_email)
            .finish_non_exhaustive()
    }
}

/// Result of the password step of login.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LoginChallenge {
    /// User id to present with the OTP.
    #[serde(deserialize_with = "deserialize_id")]
    pub user_id: String,
    /// Server message, typically "OTP sent".
    #[serde(default)]
    pub message: Option<String>,
}

/// Identifiers returned by merchant sign-up.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct MerchantRegistration {
    /// The new admin user's id.
    #[serde(deserialize_with = "deserialize_id")]
    pub user_id: String,
    /// The new merchant's id.
    #[serde(deserialize_with = "deserialize_id")]
    pub merchant_id: String,
}

/// Acknowledgement returned by the email and password-reset endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Acknowledgement {
    /// Server message, if any.
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct VerifyOtpResponse {
    access: String,
    refresh: String,
    user: AuthUser,
}

impl VerifyOtpResponse {
    pub(crate) fn into_session(self, endpoint: &'static str) -> Result<Session, AuthError> {
        if self.access.is_empty() || self.refresh.is_empty() {
            return Err(AuthError::InvalidResponse {
                endpoint,
                reason: "empty token in response".to_string(),
            });
        }
        Ok(Session::new(
            self.user,
            AuthTokens::new(self.access, self.refresh),
        ))
    }
}

#[derive(Deserialize)]
pub(crate) struct RefreshResponse {
    pub(crate) access: String,
}

#[derive(Serialize)]
pub(crate) struct VerifyOtpRequest<'a> {
    pub(crate) user_id: &'a str,
    pub(crate) otp: &'a OtpCode,
}

#[derive(Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub(crate) refresh: &'a str,
}

#[derive(Serialize)]
pub(crate) struct LogoutRequest<'a> {
    pub(crate) refresh_token: &'a str,
}

#[derive(Serialize)]
pub(crate) struct ResetPasswordRequest<'a> {
    pub(crate) token: &'a str,
    pub(crate) new_password: &'a str,
    pub(crate) confirm_password: &'a str,
}

/// Encodes a request payload as a JSON body.
pub(crate) fn encode<T: Serialize>(payload: &T) -> Result<serde_json::Value, AuthError> {
    serde_json::to_value(payload).map_err(|e| AuthError::invalid_payload(e.to_string()))
}

/// Decodes a response body, mapping shape failures to `InvalidResponse`.
pub(crate) fn decode<T: DeserializeOwned>(
    endpoint: &'static str,
    body: serde_json::Value,
) -> Result<T, AuthError> {
    serde_json::from_value(body).map_err(|e| AuthError::InvalidResponse {
        endpoint,
        reason: e.to_string(),
    })
}

pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::invalid_payload(format!("{field} is required")));
    }
    Ok(())
}

pub(crate) fn require_email(field: &str, value: &str) -> Result<(), AuthError> {
    require_non_empty(field, value)?;
    let value = value.trim();
    let valid = value.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
    });
    if !valid || value.contains(char::is_whitespace) {
        return Err(AuthError::invalid_payload(format!(
            "{field} must be a valid email address"
        )));
    }
    Ok(())
}

pub(crate) fn require_matching_passwords(password: &str, confirm: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(AuthError::invalid_payload("password is required"));
    }
    if password != confirm {
        return Err(AuthError::invalid_payload("passwords do not match"));
    }
    Ok(())
}

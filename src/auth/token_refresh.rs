//! The token refresh call.
//!
//! Only the [`HttpClient`] invokes this, while holding its refresh gate.

use crate::auth::error::AuthError;
use crate::auth::payloads::{decode, encode, RefreshRequest, RefreshResponse};
use crate::clients::{HttpClient, HttpError, HttpMethod, HttpRequest};

pub(crate) const REFRESH_ENDPOINT: &str = "/auth/token/refresh/";

/// Exchanges the stored refresh token for a new access token and stores it.
///
/// The refresh token itself is kept. The request is sent without a bearer
/// token and never re-enters the 401 path.
pub(crate) async fn refresh_access_token(client: &HttpClient) -> Result<String, AuthError> {
    let store = client.token_store();
    let refresh = store.refresh_token().ok_or(AuthError::NoRefreshToken)?;

    let request = HttpRequest::builder(HttpMethod::Post, REFRESH_ENDPOINT)
        .body(encode(&RefreshRequest { refresh: &refresh })?)
        .without_session_refresh()
        .build()
        .map_err(HttpError::from)?;

    let response = client.send(&request, None).await?;
    let RefreshResponse { access } = decode(REFRESH_ENDPOINT, response.body)?;
    if access.is_empty() {
        return Err(AuthError::InvalidResponse {
            endpoint: REFRESH_ENDPOINT,
            reason: "empty access token".to_string(),
        });
    }

    if !store.replace_access(&access)? {
        tracing::debug!("Session was cleared while refreshing; new access token discarded");
        return Err(AuthError::NoRefreshToken);
    }

    tracing::debug!("Access token refreshed");
    Ok(access)
}

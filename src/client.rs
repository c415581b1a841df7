//! The top-level client that wires the SDK together.

use std::sync::Arc;

use crate::auth::{AuthService, SessionContext, Storage, TokenStore};
use crate::clients::HttpClient;
use crate::config::ClientConfig;
use crate::merchant::MerchantApi;

/// Entry point for the Phantom Banking SDK.
///
/// Owns one [`TokenStore`], one [`SessionContext`] restored from it, and one
/// [`HttpClient`] shared by the services. Clones share all of them.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use phantom_banking::{BaseUrl, ClientConfig, PhantomClient};
/// use phantom_banking::auth::MemoryStorage;
///
/// let config = ClientConfig::builder()
///     .base_url(BaseUrl::local_default())
///     .build()
///     .unwrap();
/// let client = PhantomClient::new(&config, Arc::new(MemoryStorage::new()));
///
/// assert!(!client.session().is_authenticated());
/// ```
#[derive(Clone, Debug)]
pub struct PhantomClient {
    http: Arc<HttpClient>,
    auth: AuthService,
    merchant: MerchantApi,
}

// Verify PhantomClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<PhantomClient>();
};

impl PhantomClient {
    /// Creates a client persisting its session in `storage`.
    ///
    /// A complete session already present in `storage` is restored, so the
    /// client starts authenticated.
    ///
    /// # Panics
    ///
    /// Panics if the underlying HTTP client cannot be created. See [`HttpClient::new`].
    #[must_use]
    pub fn new(config: &ClientConfig, storage: Arc<dyn Storage>) -> Self {
        let store = TokenStore::new(storage);
        let session = SessionContext::restore(&store);
        let http = Arc::new(HttpClient::new(config, store, session));

        Self {
            auth: AuthService::new(Arc::clone(&http)),
            merchant: MerchantApi::new(Arc::clone(&http)),
            http,
        }
    }

    /// Returns the authentication service.
    #[must_use]
    pub const fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// Returns the merchant API.
    #[must_use]
    pub const fn merchant(&self) -> &MerchantApi {
        &self.merchant
    }

    /// Returns the observable session state.
    #[must_use]
    pub fn session(&self) -> &SessionContext {
        self.http.session()
    }

    /// Returns the persisted session store.
    #[must_use]
    pub fn token_store(&self) -> &TokenStore {
        self.http.token_store()
    }

    /// Returns the shared HTTP client, for endpoints without a typed wrapper.
    #[must_use]
    pub const fn http(&self) -> &Arc<HttpClient> {
        &self.http
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthTokens, AuthUser, MemoryStorage, Session, UserRole};
    use crate::config::BaseUrl;

    fn config() -> ClientConfig {
        ClientConfig::builder()
            .base_url(BaseUrl::local_default())
            .build()
            .unwrap()
    }

    #[test]
    fn test_new_restores_persisted_session() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        TokenStore::new(Arc::clone(&storage))
            .save(&Session::new(
                AuthUser::new("u-1", UserRole::Merchant),
                AuthTokens::new("a1", "r1"),
            ))
            .unwrap();

        let client = PhantomClient::new(&config(), storage);

        assert!(client.session().is_authenticated());
        assert_eq!(client.token_store().access_token().as_deref(), Some("a1"));
    }

    #[test]
    fn test_clones_share_session() {
        let client = PhantomClient::new(&config(), Arc::new(MemoryStorage::new()));
        let other = client.clone();

        assert!(Arc::ptr_eq(client.http(), other.http()));
    }
}

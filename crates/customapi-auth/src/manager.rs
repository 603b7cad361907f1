//! Token cache and refresh coordination
//!
//! `TokenManager` owns the credentials and the cached `(value, expires_at)`
//! pair. The pair lives behind a single `RwLock`, so readers never see a
//! token matched with another token's expiry. Refreshes are serialized by a
//! tokio `Mutex`: the first caller to find the cache cold performs the
//! password grant, later callers wait on the mutex and then re-check the
//! cache instead of authenticating again.
//!
//! Each manager has its own cache; two managers never share token state.

use std::time::{Duration, Instant};

use common::{Secret, Settings};
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::constants::{DEFAULT_HTTP_TIMEOUT, MAX_TOKEN_LIFETIME};
use crate::credentials::{Credentials, PasswordGrant};
use crate::error::{Error, Result};
use crate::token::request_password_grant;

/// A token obtained from the password grant.
///
/// Usable iff the value is non-empty and `now < expires_at`.
#[derive(Debug, Clone)]
struct CachedToken {
    value: Secret<String>,
    expires_at: Instant,
}

impl CachedToken {
    /// `expires_in` is clamped to `MAX_TOKEN_LIFETIME`; a deadline that still
    /// does not fit in an `Instant` leaves the token already expired.
    fn new(value: String, expires_in: Duration, issued_at: Instant) -> Self {
        let lifetime = expires_in.min(MAX_TOKEN_LIFETIME);
        Self {
            value: Secret::new(value),
            expires_at: issued_at.checked_add(lifetime).unwrap_or(issued_at),
        }
    }

    fn is_usable_at(&self, now: Instant) -> bool {
        !self.value.expose().is_empty() && now < self.expires_at
    }
}

/// Produces a bearer token for every outbound call.
pub struct TokenManager {
    credentials: Credentials,
    http_client: reqwest::Client,
    cache: RwLock<Option<CachedToken>>,
    refresh_lock: Mutex<()>,
}

impl TokenManager {
    /// Create a manager with its own HTTP client (120s timeout).
    pub fn new(credentials: Credentials) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(credentials, http_client))
    }

    /// Create a manager sharing an existing HTTP client.
    pub fn with_client(credentials: Credentials, http_client: reqwest::Client) -> Self {
        Self {
            credentials,
            http_client,
            cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Create a manager from resolved settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(Credentials::from_settings(settings)?)
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Return a usable bearer token, authenticating only when the cache is cold.
    ///
    /// Static tokens are returned without touching the network.
    #[instrument(skip_all)]
    pub async fn get_token(&self) -> Result<String> {
        let grant = match &self.credentials {
            Credentials::Static(token) => return Ok(token.expose().clone()),
            Credentials::Password(grant) => grant,
        };

        if let Some(token) = self.cached_value() {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;
        // Another caller may have refreshed while we waited on the lock
        if let Some(token) = self.cached_value() {
            debug!("reusing token refreshed by a concurrent caller");
            return Ok(token);
        }

        self.exchange(grant).await
    }

    /// Perform the password grant unconditionally and cache the result.
    ///
    /// Fails with a configuration error for static credentials, which have
    /// nothing to exchange.
    #[instrument(skip_all)]
    pub async fn authenticate(&self) -> Result<String> {
        let Credentials::Password(grant) = &self.credentials else {
            return Err(Error::Configuration(
                "password grant requires username and password credentials".into(),
            ));
        };
        let _guard = self.refresh_lock.lock().await;
        self.exchange(grant).await
    }

    /// Whether a usable token is available without a network call.
    ///
    /// Static credentials are always valid.
    pub fn is_valid(&self) -> bool {
        match &self.credentials {
            Credentials::Static(_) => true,
            Credentials::Password(_) => self
                .cache
                .read()
                .as_ref()
                .is_some_and(|t| t.is_usable_at(Instant::now())),
        }
    }

    /// Drop the cached token so the next `get_token` re-authenticates.
    pub fn invalidate(&self) {
        let previous = self.cache.write().take();
        if previous.is_some() {
            debug!("cached token invalidated");
        }
    }

    /// Invalidate, then fetch a fresh token.
    pub async fn refresh(&self) -> Result<String> {
        self.invalidate();
        self.get_token().await
    }

    /// Time left on the cached token, if any. `None` for static credentials.
    pub fn expires_in(&self) -> Option<Duration> {
        let cache = self.cache.read();
        let token = cache.as_ref()?;
        Some(token.expires_at.saturating_duration_since(Instant::now()))
    }

    fn cached_value(&self) -> Option<String> {
        let cache = self.cache.read();
        cache
            .as_ref()
            .filter(|t| t.is_usable_at(Instant::now()))
            .map(|t| t.value.expose().clone())
    }

    async fn exchange(&self, grant: &PasswordGrant) -> Result<String> {
        match request_password_grant(&self.http_client, grant).await {
            Ok(response) => {
                let cached = CachedToken::new(
                    response.access_token.clone(),
                    Duration::from_secs(response.expires_in),
                    Instant::now(),
                );
                *self.cache.write() = Some(cached);
                metrics::counter!("customapi_auth_exchanges_total", "outcome" => "success")
                    .increment(1);
                info!(
                    token_type = %response.token_type,
                    expires_in = response.expires_in,
                    "authentication successful"
                );
                Ok(response.access_token)
            }
            Err(e) => {
                metrics::counter!("customapi_auth_exchanges_total", "outcome" => "failure")
                    .increment(1);
                warn!(error = %e, status = ?e.status(), "authentication failed");
                Err(e)
            }
        }
    }
}

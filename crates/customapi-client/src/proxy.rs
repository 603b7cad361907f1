//! Request execution
//!
//! `RequestProxy::execute` is the only code path that talks to the API:
//! resolve the base URL, obtain a token, build the URL and headers, send,
//! read the whole body, and wrap the result in a `ResponseEnvelope`.
//! Configuration and authentication failures return before anything is
//! sent. Nothing is retried, and a 401 from the API is an ordinary
//! unsuccessful envelope; token freshness belongs to the `TokenSource`.
//!
//! Dropping the future returned by `execute` aborts the in-flight call.
//! The HTTP client timeout bounds every call.

use std::collections::BTreeMap;
use std::sync::Arc;

use common::Settings;
use common::settings::BASE_URL_ENV;
use customapi_auth::{DEFAULT_HTTP_TIMEOUT, TokenManager};
use reqwest::header::ACCEPT;
use reqwest::{Method, Url};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::TokenSource;
use crate::envelope::ResponseEnvelope;
use crate::error::{Error, Result};
use crate::headers;
use crate::request::OutboundRequest;
use crate::types::UserProfile;

/// Endpoint returning the authenticated user's profile
pub const USER_PROFILE_PATH: &str = "/api/users/profile/me";

/// Proxies requests to the API with managed authentication.
pub struct RequestProxy {
    http_client: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
    base_url: Option<String>,
}

impl RequestProxy {
    /// Create a proxy with its own HTTP client (120s timeout).
    pub fn new(tokens: Arc<dyn TokenSource>, base_url: Option<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(tokens, base_url, http_client))
    }

    pub fn with_client(
        tokens: Arc<dyn TokenSource>,
        base_url: Option<String>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            http_client,
            tokens,
            base_url: base_url.filter(|u| !u.is_empty()),
        }
    }

    /// Build a `TokenManager` and proxy from resolved settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let tokens = Arc::new(TokenManager::from_settings(settings)?);
        Self::new(tokens, settings.base_url.clone())
    }

    /// Configured base URL, if any (the environment is consulted per call).
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_valid()
    }

    pub async fn get_token(&self) -> Result<String> {
        Ok(self.tokens.token().await?)
    }

    /// Drop the cached token and authenticate again.
    pub async fn refresh_auth(&self) -> Result<()> {
        self.tokens.invalidate();
        self.tokens.token().await?;
        Ok(())
    }

    /// Execute a request and return its envelope.
    #[instrument(skip_all, fields(method = %request.method, path = %request.path))]
    pub async fn execute(&self, request: OutboundRequest) -> Result<ResponseEnvelope> {
        let base_url = self.resolve_base_url()?;
        let token = self.tokens.token().await?;

        let url = build_url(&base_url, &request.path, &request.query)?;
        let mut request_headers = headers::default_headers(&token)?;
        headers::overlay(&mut request_headers, &request.headers);

        let mut builder = self
            .http_client
            .request(request.method, url.clone())
            .headers(request_headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        debug!(url = %url, "sending request");
        let response = builder
            .send()
            .await
            .map_err(|e| Error::transport("request failed", e))?;

        let status = response.status().as_u16();
        let response_headers = headers::first_values(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::transport("reading response body failed", e))?;

        let envelope = ResponseEnvelope::new(status, response_headers, body.to_vec());
        debug!(
            status,
            success = envelope.is_success(),
            bytes = envelope.body().len(),
            "response received"
        );
        Ok(envelope)
    }

    /// POST `data` as JSON.
    pub async fn create<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        data: &T,
        org_id: Option<&str>,
    ) -> Result<ResponseEnvelope> {
        let body = serde_json::to_vec(data)?;
        self.execute(crud_request(Method::POST, endpoint, Some(body), org_id))
            .await
    }

    pub async fn read(&self, endpoint: &str, org_id: Option<&str>) -> Result<ResponseEnvelope> {
        self.execute(crud_request(Method::GET, endpoint, None, org_id))
            .await
    }

    /// PUT `data` as JSON.
    pub async fn update<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        data: &T,
        org_id: Option<&str>,
    ) -> Result<ResponseEnvelope> {
        let body = serde_json::to_vec(data)?;
        self.execute(crud_request(Method::PUT, endpoint, Some(body), org_id))
            .await
    }

    pub async fn delete(&self, endpoint: &str, org_id: Option<&str>) -> Result<ResponseEnvelope> {
        self.execute(crud_request(Method::DELETE, endpoint, None, org_id))
            .await
    }

    /// Fetch and decode the authenticated user's profile.
    pub async fn get_user_profile(&self, org_id: Option<&str>) -> Result<UserProfile> {
        let envelope = self.read(USER_PROFILE_PATH, org_id).await?;
        if let Some(message) = envelope.error() {
            return Err(Error::Api {
                status: envelope.status_code(),
                message: format!("failed to get user profile: {message}"),
            });
        }
        envelope.json()
    }

    fn resolve_base_url(&self) -> Result<String> {
        if let Some(url) = &self.base_url {
            return Ok(url.clone());
        }
        std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "base URL is not configured; set base_url or {BASE_URL_ENV}"
                ))
            })
    }
}

fn crud_request(
    method: Method,
    endpoint: &str,
    body: Option<Vec<u8>>,
    org_id: Option<&str>,
) -> OutboundRequest {
    let mut request = OutboundRequest::new(method, endpoint)
        .header(ACCEPT.as_str(), "application/json")
        .org_id(org_id);
    request.body = body;
    request
}

/// `base + path`, then query parameters URL-encoded in key order.
fn build_url(base: &str, path: &str, query: &BTreeMap<String, String>) -> Result<Url> {
    let target = format!("{base}{path}");
    let mut url = Url::parse(&target)
        .map_err(|e| Error::InvalidRequest(format!("invalid target URL {target:?}: {e}")))?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query.iter());
    }
    Ok(url)
}

//! OAuth2 password-grant exchange
//!
//! One POST to the token endpoint with URL-encoded form fields. Anything but
//! a 200 is returned as `Error::Rejected` with the status and (truncated)
//! body; nothing here retries.

use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::constants::SCOPE;
use crate::credentials::PasswordGrant;
use crate::error::{Error, Result, truncate_body};

/// Response from the token endpoint.
///
/// `expires_in` is a delta in seconds from the response time; the manager
/// converts it to an absolute deadline when caching.
#[derive(Debug, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    pub expires_in: u64,
    #[serde(default)]
    pub scope: String,
}

/// Exchange username/password for an access token.
#[instrument(skip_all, fields(token_url = %grant.token_url, username = %grant.username))]
pub async fn request_password_grant(
    client: &reqwest::Client,
    grant: &PasswordGrant,
) -> Result<TokenResponse> {
    debug!("requesting password grant");

    let response = client
        .post(&grant.token_url)
        .header(ACCEPT, "application/json")
        .form(&[
            ("grant_type", "password"),
            ("username", grant.username.as_str()),
            ("password", grant.password.expose().as_str()),
            ("scope", SCOPE),
            ("audience", grant.audience.as_str()),
            ("client_id", grant.client_id.as_str()),
        ])
        .send()
        .await
        .map_err(|e| Error::Http(format!("token request failed: {e}")))?;

    let status = response.status();
    if status != StatusCode::OK {
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
        return Err(Error::Rejected {
            status: status.as_u16(),
            body: truncate_body(&body),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| Error::Http(format!("reading token response failed: {e}")))?;

    let token: TokenResponse =
        serde_json::from_slice(&body).map_err(|e| Error::InvalidResponse {
            status: status.as_u16(),
            message: format!("{e}; body: {}", truncate_body(&String::from_utf8_lossy(&body))),
        })?;

    if token.access_token.is_empty() {
        return Err(Error::InvalidResponse {
            status: status.as_u16(),
            message: "access_token is empty".into(),
        });
    }

    Ok(token)
}

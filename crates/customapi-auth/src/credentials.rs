//! Credential material for the token manager
//!
//! Built once at startup and never mutated. A static bearer token takes
//! priority over username/password; with neither available, construction
//! fails with a configuration error before any request is attempted.

use common::{Secret, Settings};

use crate::environment::token_url;
use crate::error::{Error, Result};

/// Username/password material for the OAuth2 password grant.
#[derive(Debug, Clone)]
pub struct PasswordGrant {
    pub username: String,
    pub password: Secret<String>,
    /// May be empty; sent as-is in the form body
    pub client_id: String,
    /// May be empty; sent as-is in the form body
    pub audience: String,
    /// Fully resolved token endpoint (`.../oauth/token`)
    pub token_url: String,
}

/// How the manager obtains its bearer token.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Pre-issued token, returned verbatim; never refreshed, never expires
    Static(Secret<String>),
    /// Token obtained from the password grant and cached until expiry
    Password(PasswordGrant),
}

impl Credentials {
    /// Select credentials from resolved settings.
    ///
    /// The token endpoint comes from `auth_url`, else the `environment` tag.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        if let Some(token) = &settings.auth_token {
            return Ok(Credentials::Static(token.clone()));
        }

        match (&settings.username, &settings.password) {
            (Some(username), Some(password)) => Ok(Credentials::Password(PasswordGrant {
                username: username.clone(),
                password: password.clone(),
                client_id: settings.client_id.clone().unwrap_or_default(),
                audience: settings.audience.clone().unwrap_or_default(),
                token_url: token_url(
                    settings.auth_url.as_deref(),
                    settings.environment.as_deref(),
                ),
            })),
            _ => Err(Error::Configuration(
                "either auth_token or both username and password must be provided".into(),
            )),
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Credentials::Static(_))
    }
}

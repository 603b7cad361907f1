//! Connection settings for the remote API
//!
//! The nine configuration inputs shared by the token manager and the request
//! proxy. Values come from an explicit source (a config file, a host's own
//! configuration) and from `CUSTOMAPI_*` environment variables; explicit
//! values win, and anything still unset falls back to built-in defaults
//! downstream (e.g. the `qa` auth endpoint). Empty strings count as unset.

use serde::Deserialize;

use crate::Secret;

pub const BASE_URL_ENV: &str = "CUSTOMAPI_BASE_URL";
pub const AUTH_URL_ENV: &str = "CUSTOMAPI_AUTH_URL";
pub const ENVIRONMENT_ENV: &str = "CUSTOMAPI_ENVIRONMENT";
pub const ORG_ID_ENV: &str = "CUSTOMAPI_ORG_ID";
pub const CLIENT_ID_ENV: &str = "CUSTOMAPI_CLIENT_ID";
pub const AUDIENCE_ENV: &str = "CUSTOMAPI_AUDIENCE";
pub const USERNAME_ENV: &str = "CUSTOMAPI_USERNAME";
pub const PASSWORD_ENV: &str = "CUSTOMAPI_PASSWORD";
pub const AUTH_TOKEN_ENV: &str = "CUSTOMAPI_AUTH_TOKEN";

/// Connection settings. Secrets are never deserialized from config files.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub auth_url: Option<String>,
    /// Environment tag selecting the auth endpoint: `qa`, `staging` or `prod`
    #[serde(default)]
    pub environment: Option<String>,
    /// Organization sent as `current-organization` when a call names none
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(skip)]
    pub password: Option<Secret<String>>,
    /// Static bearer token; takes priority over username/password
    #[serde(skip)]
    pub auth_token: Option<Secret<String>>,
}

impl Settings {
    /// Read all `CUSTOMAPI_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup (environment, test maps).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        Self {
            base_url: get(BASE_URL_ENV),
            auth_url: get(AUTH_URL_ENV),
            environment: get(ENVIRONMENT_ENV),
            org_id: get(ORG_ID_ENV),
            client_id: get(CLIENT_ID_ENV),
            audience: get(AUDIENCE_ENV),
            username: get(USERNAME_ENV),
            password: get(PASSWORD_ENV).map(Secret::new),
            auth_token: get(AUTH_TOKEN_ENV).map(Secret::new),
        }
    }

    /// Merge field by field: values set on `self` win over `fallback`.
    pub fn or(self, fallback: Settings) -> Settings {
        Settings {
            base_url: non_empty(self.base_url).or(fallback.base_url),
            auth_url: non_empty(self.auth_url).or(fallback.auth_url),
            environment: non_empty(self.environment).or(fallback.environment),
            org_id: non_empty(self.org_id).or(fallback.org_id),
            client_id: non_empty(self.client_id).or(fallback.client_id),
            audience: non_empty(self.audience).or(fallback.audience),
            username: non_empty(self.username).or(fallback.username),
            password: self
                .password
                .filter(|p| !p.expose().is_empty())
                .or(fallback.password),
            auth_token: self
                .auth_token
                .filter(|t| !t.expose().is_empty())
                .or(fallback.auth_token),
        }
    }

    /// Whether either a static token or a full username/password pair is set.
    pub fn has_credentials(&self) -> bool {
        self.auth_token.is_some() || (self.username.is_some() && self.password.is_some())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

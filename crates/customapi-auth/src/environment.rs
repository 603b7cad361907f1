//! Auth endpoint resolution
//!
//! An explicit auth URL always wins. Without one, the environment tag picks
//! one of three fixed endpoints; an absent or unrecognized tag falls back to
//! `qa`. The fallback is logged so a typo in the tag is visible.

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::constants::{PROD_AUTH_URL, QA_AUTH_URL, STAGING_AUTH_URL, TOKEN_PATH};
use crate::error::Error;

/// Deployment environment of the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Qa,
    Staging,
    Prod,
}

impl Environment {
    /// Lenient lookup: unknown or missing tags resolve to the default (`qa`).
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            None => Environment::default(),
            Some(tag) => tag.parse().unwrap_or_else(|_| {
                warn!(environment = tag, "unrecognized environment tag, using qa");
                Environment::default()
            }),
        }
    }

    /// Base URL of the auth server for this environment.
    pub fn auth_base_url(self) -> &'static str {
        match self {
            Environment::Qa => QA_AUTH_URL,
            Environment::Staging => STAGING_AUTH_URL,
            Environment::Prod => PROD_AUTH_URL,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Qa => "qa",
            Environment::Staging => "staging",
            Environment::Prod => "prod",
        }
    }
}

impl FromStr for Environment {
    type Err = Error;

    /// Strict parse for hosts that want unknown tags rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qa" => Ok(Environment::Qa),
            "staging" => Ok(Environment::Staging),
            "prod" => Ok(Environment::Prod),
            other => Err(Error::Configuration(format!(
                "unknown environment {other:?}, expected qa, staging or prod"
            ))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full token endpoint URL: explicit auth URL, else the environment's, plus `/oauth/token`.
pub fn token_url(auth_url: Option<&str>, environment: Option<&str>) -> String {
    let base = match auth_url.filter(|u| !u.is_empty()) {
        Some(url) => url.trim_end_matches('/'),
        None => Environment::from_tag(environment).auth_base_url(),
    };
    format!("{base}{TOKEN_PATH}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_auth_url_wins() {
        assert_eq!(
            token_url(Some("https://auth.internal/"), Some("prod")),
            "https://auth.internal/oauth/token"
        );
    }

    #[test]
    fn environment_tags_select_fixed_endpoints() {
        assert_eq!(
            token_url(None, Some("qa")),
            "https://pace-app-qa.us.auth0.com/oauth/token"
        );
        assert_eq!(
            token_url(None, Some("staging")),
            "https://pace-app-staging.us.auth0.com/oauth/token"
        );
        assert_eq!(
            token_url(None, Some("prod")),
            "https://pace-app.us.auth0.com/oauth/token"
        );
    }

    #[test]
    fn missing_or_unknown_tag_defaults_to_qa() {
        assert_eq!(token_url(None, None), format!("{QA_AUTH_URL}{TOKEN_PATH}"));
        assert_eq!(
            token_url(Some(""), Some("production")),
            format!("{QA_AUTH_URL}{TOKEN_PATH}")
        );
        assert_eq!(Environment::from_tag(Some("dev")), Environment::Qa);
    }

    #[test]
    fn strict_parse_rejects_unknown_tags() {
        assert_eq!("PROD".parse::<Environment>().unwrap(), Environment::Prod);
        let err = "dev".parse::<Environment>().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn display_matches_tag() {
        assert_eq!(Environment::Staging.to_string(), "staging");
    }
}

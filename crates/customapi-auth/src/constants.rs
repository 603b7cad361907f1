//! CustomAPI OAuth constants
//!
//! Fixed values of the password-grant exchange. None of these are secrets;
//! the credentials themselves live in `Credentials`.

use std::time::Duration;

/// Path appended to the auth base URL to reach the token endpoint
pub const TOKEN_PATH: &str = "/oauth/token";

/// Scope requested on every password grant
pub const SCOPE: &str = "openid profile email";

/// Auth base URL for the `qa` environment (also the default)
pub const QA_AUTH_URL: &str = "https://pace-app-qa.us.auth0.com";

/// Auth base URL for the `staging` environment
pub const STAGING_AUTH_URL: &str = "https://pace-app-staging.us.auth0.com";

/// Auth base URL for the `prod` environment
pub const PROD_AUTH_URL: &str = "https://pace-app.us.auth0.com";

/// Timeout applied to HTTP clients built by this crate
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// Longest response body kept in an authentication error, in bytes
pub const MAX_ERROR_BODY_LEN: usize = 512;

/// Upper bound on a cached token's lifetime, whatever `expires_in` says
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);

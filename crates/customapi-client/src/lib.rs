//! Authenticated request proxy for the CustomAPI REST API
//!
//! Turns a declarative `OutboundRequest` into a `ResponseEnvelope`:
//! attaches a bearer token from a `TokenSource`, applies default and
//! caller headers, executes the call and classifies the response. API-level
//! failures (any non-2xx status) come back as envelopes with
//! `success == false`; only configuration, authentication, serialization and
//! transport problems are returned as `Err`.

pub mod envelope;
pub mod error;
pub mod headers;
pub mod proxy;
pub mod request;
pub mod types;

pub use envelope::{BodyShape, ResponseEnvelope, classify_body};
pub use error::{Error, Result};
pub use proxy::RequestProxy;
pub use request::OutboundRequest;
pub use types::{ApiError, ApiResponse, Organization, PasswordSecurity, UserProfile};

pub use reqwest::Method;

use std::future::Future;
use std::pin::Pin;

use customapi_auth::TokenManager;

/// Source of bearer tokens for the proxy.
///
/// `TokenManager` is the production implementation. Uses `Pin<Box<dyn Future>>`
/// return types for dyn-compatibility (`Arc<dyn TokenSource>`).
pub trait TokenSource: Send + Sync {
    /// A token that is usable right now, authenticating if needed.
    fn token(&self) -> Pin<Box<dyn Future<Output = customapi_auth::Result<String>> + Send + '_>>;

    /// Whether a usable token is available without a network call.
    fn is_valid(&self) -> bool;

    /// Forget any cached token.
    fn invalidate(&self);
}

impl TokenSource for TokenManager {
    fn token(&self) -> Pin<Box<dyn Future<Output = customapi_auth::Result<String>> + Send + '_>> {
        Box::pin(self.get_token())
    }

    fn is_valid(&self) -> bool {
        TokenManager::is_valid(self)
    }

    fn invalidate(&self) {
        TokenManager::invalidate(self)
    }
}

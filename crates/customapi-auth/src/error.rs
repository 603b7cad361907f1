//! Error types for token acquisition

use crate::constants::MAX_ERROR_BODY_LEN;

/// Errors from credential setup and token exchange.
///
/// Everything except `Configuration` is an authentication failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("authentication failed with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid token response (status {status}): {message}")]
    InvalidResponse { status: u16, message: String },
}

impl Error {
    /// HTTP status returned by the token endpoint, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Rejected { status, .. } | Error::InvalidResponse { status, .. } => Some(*status),
            Error::Configuration(_) | Error::Http(_) => None,
        }
    }

    /// Whether this is an authentication failure rather than a setup problem.
    pub fn is_authentication(&self) -> bool {
        !matches!(self, Error::Configuration(_))
    }
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Cut a response body down to `MAX_ERROR_BODY_LEN` bytes on a char boundary.
pub(crate) fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LEN {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

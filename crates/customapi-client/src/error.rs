//! Error types for proxied requests
//!
//! A non-2xx response is not an error: it is returned as an envelope with
//! `success == false`. These variants cover the cases where no envelope
//! exists at all.

/// Errors from proxy operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing base URL or credentials
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Token could not be obtained; no request was sent
    #[error("authentication error: {0}")]
    Authentication(customapi_auth::Error),

    /// Request data could not be encoded, or a response could not be decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Network failure, timeout, or unreadable response body
    #[error("transport error: {message}")]
    Transport { message: String, timed_out: bool },

    /// Target URL or header values could not be built
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Typed helpers only: the API answered with a non-2xx status
    #[error("API request failed: {message}")]
    Api { status: u16, message: String },
}

impl Error {
    pub(crate) fn transport(context: &str, err: reqwest::Error) -> Self {
        Error::Transport {
            message: format!("{context}: {err}"),
            timed_out: err.is_timeout(),
        }
    }
}

impl From<customapi_auth::Error> for Error {
    fn from(err: customapi_auth::Error) -> Self {
        match err {
            customapi_auth::Error::Configuration(msg) => Error::Configuration(msg),
            other => Error::Authentication(other),
        }
    }
}

/// Result alias for proxy operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_configuration_errors_stay_configuration_errors() {
        let err: Error = customapi_auth::Error::Configuration("no credentials".into()).into();
        assert!(matches!(err, Error::Configuration(_)), "got: {err:?}");
    }

    #[test]
    fn auth_rejections_become_authentication_errors() {
        let err: Error = customapi_auth::Error::Rejected {
            status: 401,
            body: "denied".into(),
        }
        .into();
        assert!(matches!(err, Error::Authentication(_)));
        assert_eq!(
            err.to_string(),
            "authentication error: authentication failed with status 401: denied"
        );
    }

    #[test]
    fn transport_display_includes_message() {
        let err = Error::Transport {
            message: "connection refused".into(),
            timed_out: false,
        };
        assert_eq!(err.to_string(), "transport error: connection refused");
    }
}

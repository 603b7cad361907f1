//! Gateway errors and their HTTP mapping
//!
//! Unsuccessful API responses are not errors here: they travel back inside
//! the envelope with a 200 from the gateway. Only failures where no
//! envelope exists are turned into `{"error":{...}}` responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Per-request failures surfaced to gateway clients.
#[derive(Error, Debug)]
pub enum Error {
    /// The inbound request itself is unusable
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Client(#[from] customapi_client::Error),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        use customapi_client::Error as C;
        match self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Client(err) => match err {
                C::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
                C::Authentication(_) | C::Api { .. } => StatusCode::BAD_GATEWAY,
                C::Transport {
                    timed_out: true, ..
                } => StatusCode::GATEWAY_TIMEOUT,
                C::Transport { .. } => StatusCode::BAD_GATEWAY,
                C::Serialization(_) | C::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            },
        }
    }

    /// Value of the `type` field in the JSON error body.
    pub fn error_type(&self) -> &'static str {
        use customapi_client::Error as C;
        match self {
            Error::BadRequest(_) => "invalid_request_error",
            Error::Client(err) => match err {
                C::Configuration(_) => "configuration_error",
                C::Authentication(_) => "authentication_error",
                C::Transport {
                    timed_out: true, ..
                } => "timeout_error",
                C::Transport { .. } => "transport_error",
                C::Serialization(_) | C::InvalidRequest(_) => "invalid_request_error",
                C::Api { .. } => "api_error",
            },
        }
    }

    /// Label for `gateway_upstream_errors_total`, for failures involving a remote.
    pub fn upstream_label(&self) -> Option<&'static str> {
        use customapi_client::Error as C;
        match self {
            Error::Client(C::Authentication(_)) => Some("authentication"),
            Error::Client(C::Transport {
                timed_out: true, ..
            }) => Some("timeout"),
            Error::Client(C::Transport { .. }) => Some("transport"),
            Error::Client(C::Api { .. }) => Some("api"),
            _ => None,
        }
    }

    pub fn into_http(self, request_id: &str) -> Response {
        error_response(self.status(), self.error_type(), &self.to_string(), request_id)
    }
}

/// JSON error body: `{"error":{"type":"...","message":"...","request_id":"req_..."}}`
pub fn error_response(
    status: StatusCode,
    error_type: &str,
    message: &str,
    request_id: &str,
) -> Response {
    let body = serde_json::json!({
        "error": {
            "type": error_type,
            "message": message,
            "request_id": request_id,
        }
    });
    (
        status,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
        .into_response()
}

//! HTTP surface of the gateway
//!
//! `POST /v1/requests` takes a declarative request, runs it through the
//! `RequestProxy` and answers 200 with the envelope, whatever status the API
//! returned. Gateway-level failures (bad input, configuration, token or
//! transport problems) use the JSON error body from `error.rs`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use customapi_client::{Method, OutboundRequest, RequestProxy};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use crate::error::Error;
use crate::metrics;
use crate::service::ServiceMetrics;

/// Methods accepted in `POST /v1/requests`
const ALLOWED_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];

/// Shared application state accessible from all handlers
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<RequestProxy>,
    /// Organization used when a request names none
    pub default_org_id: Option<String>,
    pub metrics: ServiceMetrics,
    pub prometheus: PrometheusHandle,
}

/// Build the router. `max_connections` caps concurrently handled requests.
pub fn build_router(state: AppState, max_connections: usize) -> Router {
    Router::new()
        .route("/v1/requests", post(proxy_handler))
        .route("/v1/profile", get(profile_handler))
        .route("/v1/auth/refresh", post(refresh_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

/// Body of `POST /v1/requests`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProxyRequest {
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    /// Sent verbatim; not re-encoded
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub org_id: Option<String>,
}

impl ProxyRequest {
    fn into_outbound(self, default_org_id: Option<&str>) -> Result<OutboundRequest, Error> {
        let method = parse_method(&self.method)?;
        if !self.path.starts_with('/') {
            return Err(Error::BadRequest(format!(
                "path must start with '/', got: {:?}",
                self.path
            )));
        }
        let org_id = self
            .org_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or(default_org_id);

        let mut request = OutboundRequest::new(method, self.path);
        request.headers = self.headers;
        request.query = self.query;
        request.body = self.body.map(String::into_bytes);
        Ok(request.org_id(org_id))
    }
}

fn parse_method(raw: &str) -> Result<Method, Error> {
    let upper = raw.trim().to_ascii_uppercase();
    if !ALLOWED_METHODS.contains(&upper.as_str()) {
        return Err(Error::BadRequest(format!("unsupported HTTP method {raw:?}")));
    }
    Method::from_bytes(upper.as_bytes())
        .map_err(|e| Error::BadRequest(format!("invalid HTTP method {raw:?}: {e}")))
}

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub org_id: Option<String>,
}

fn new_request_id() -> String {
    format!("req_{}", uuid::Uuid::new_v4().as_simple())
}

/// Record metrics and turn a handler outcome into a response.
///
/// `Ok` carries the status label to record and the JSON payload to return with 200.
fn finish<T: Serialize>(
    state: &AppState,
    request_id: &str,
    method: &str,
    started: Instant,
    outcome: Result<(u16, T), Error>,
) -> Response {
    let elapsed = started.elapsed().as_secs_f64();
    match outcome {
        Ok((status, payload)) => {
            metrics::record_request(status, method, elapsed);
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => {
            let status = err.status();
            metrics::record_request(status.as_u16(), method, elapsed);
            state.metrics.record_error();
            if let Some(label) = err.upstream_label() {
                metrics::record_upstream_error(label);
            }
            if status.is_server_error() {
                error!(request_id, error = %err, "request failed");
            } else {
                warn!(request_id, error = %err, "request rejected");
            }
            err.into_http(request_id)
        }
    }
}

async fn proxy_handler(
    State(state): State<AppState>,
    payload: Result<Json<ProxyRequest>, JsonRejection>,
) -> Response {
    let request_id = new_request_id();
    let _in_flight = state.metrics.begin_request();
    let started = Instant::now();

    let payload = match payload {
        Ok(Json(p)) => p,
        Err(rejection) => {
            let err = Error::BadRequest(format!("invalid request body: {}", rejection.body_text()));
            return finish::<()>(&state, &request_id, "UNKNOWN", started, Err(err));
        }
    };
    let method = payload.method.trim().to_ascii_uppercase();
    let outcome = execute(&state, &request_id, payload).await;
    finish(&state, &request_id, &method, started, outcome)
}

#[instrument(skip_all, fields(request_id = %request_id))]
async fn execute(
    state: &AppState,
    request_id: &str,
    payload: ProxyRequest,
) -> Result<(u16, customapi_client::ResponseEnvelope), Error> {
    let request = payload.into_outbound(state.default_org_id.as_deref())?;
    let envelope = state.proxy.execute(request).await?;
    debug!(
        status = envelope.status_code(),
        success = envelope.is_success(),
        "proxied request completed"
    );
    Ok((envelope.status_code(), envelope))
}

async fn profile_handler(
    State(state): State<AppState>,
    Query(query): Query<ProfileQuery>,
) -> Response {
    let request_id = new_request_id();
    let _in_flight = state.metrics.begin_request();
    let started = Instant::now();

    let org_id = query
        .org_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .or(state.default_org_id.as_deref());
    let outcome = state
        .proxy
        .get_user_profile(org_id)
        .await
        .map(|profile| (200, profile))
        .map_err(Error::from);
    finish(&state, &request_id, "GET", started, outcome)
}

async fn refresh_handler(State(state): State<AppState>) -> Response {
    let request_id = new_request_id();
    let _in_flight = state.metrics.begin_request();
    let started = Instant::now();

    let outcome = state
        .proxy
        .refresh_auth()
        .await
        .map(|()| {
            (
                200,
                serde_json::json!({
                    "status": "refreshed",
                    "authenticated": state.proxy.is_authenticated(),
                }),
            )
        })
        .map_err(Error::from);
    finish(&state, &request_id, "POST", started, outcome)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "authenticated": state.proxy.is_authenticated(),
        "uptime_seconds": state.metrics.started_at.elapsed().as_secs(),
        "requests_served": state.metrics.requests_total.load(Ordering::Relaxed),
        "errors_total": state.metrics.errors_total.load(Ordering::Relaxed),
    }))
}

/// Prometheus text exposition format.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}

//! Default and caller-supplied request headers
//!
//! Defaults are set first, then caller headers are applied over them, so a
//! caller header with the same name replaces the default. This includes
//! `Authorization`: a caller that supplies its own value wins over the
//! token from the `TokenSource`. Invalid caller header names or values are
//! skipped with a warning.

use std::collections::BTreeMap;
use std::str::FromStr;

use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT,
};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Org scoping header understood by the API
pub const ORG_HEADER: &str = "current-organization";

/// User-Agent sent with every proxied request
pub const USER_AGENT_VALUE: &str = "CustomAPI-Gateway/1.0";

/// Default Accept header
pub const DEFAULT_ACCEPT: &str = "application/json, text/plain, */*";

/// Headers every proxied request starts from.
pub fn default_headers(token: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| Error::InvalidRequest(format!("token is not a valid header value: {e}")))?;
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    Ok(headers)
}

/// Apply caller headers over `headers`, replacing any existing value.
pub fn overlay(headers: &mut HeaderMap, caller: &BTreeMap<String, String>) {
    for (name, value) in caller {
        let header_name = match HeaderName::from_str(name) {
            Ok(n) => n,
            Err(e) => {
                warn!(header = %name, error = %e, "skipping invalid header name");
                continue;
            }
        };
        let header_value = match HeaderValue::from_str(value) {
            Ok(v) => v,
            Err(e) => {
                warn!(header = %name, error = %e, "skipping invalid header value");
                continue;
            }
        };
        if header_name == AUTHORIZATION {
            debug!("caller-supplied authorization header replaces the managed token");
        }
        headers.insert(header_name, header_value);
    }
}

/// Flatten response headers, keeping the first value of each name.
pub fn first_values(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .keys()
        .filter_map(|name| {
            headers.get(name).map(|value| {
                let text = match value.to_str() {
                    Ok(s) => s.to_string(),
                    Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
                };
                (name.as_str().to_string(), text)
            })
        })
        .collect()
}

//! Outbound request description

use std::collections::BTreeMap;

use reqwest::Method;

use crate::headers::ORG_HEADER;

/// A declarative request against the API, built per call.
///
/// `path` is appended verbatim to the base URL. Query parameters are
/// URL-encoded in key order. The body is sent as-is; it is never re-encoded.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub path: String,
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl OutboundRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: BTreeMap::new(),
            query: BTreeMap::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Scope the request to an organization; empty or missing ids add nothing.
    pub fn org_id(self, org_id: Option<&str>) -> Self {
        match org_id.filter(|id| !id.is_empty()) {
            Some(id) => self.header(ORG_HEADER, id),
            None => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_parts() {
        let request = OutboundRequest::new(Method::POST, "/api/items")
            .header("x-trace", "1")
            .query("page", "2")
            .body(r#"{"a":1}"#);

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/api/items");
        assert_eq!(request.headers["x-trace"], "1");
        assert_eq!(request.query["page"], "2");
        assert_eq!(request.body.as_deref(), Some(br#"{"a":1}"#.as_slice()));
    }

    #[test]
    fn org_id_adds_header_only_when_non_empty() {
        let scoped = OutboundRequest::new(Method::GET, "/x").org_id(Some("org-9"));
        assert_eq!(scoped.headers[ORG_HEADER], "org-9");

        let empty = OutboundRequest::new(Method::GET, "/x").org_id(Some(""));
        assert!(empty.headers.is_empty());

        let none = OutboundRequest::new(Method::GET, "/x").org_id(None);
        assert!(none.headers.is_empty());
    }
}

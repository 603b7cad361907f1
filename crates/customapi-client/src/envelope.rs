//! Uniform response envelope and body classification
//!
//! Every completed HTTP exchange becomes a `ResponseEnvelope`, whatever the
//! status. `success` is derived from the status code alone and `error` is
//! present exactly when `success` is false. The body is kept byte-for-byte
//! so callers can inspect API error payloads.
//!
//! `classify_body` is the single place that decides whether a body is JSON;
//! success and failure paths both go through it.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::error::Result;

/// Shape of a response body.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyShape {
    /// Any valid JSON document
    Json(serde_json::Value),
    /// Non-empty body that is not JSON
    NonJson,
    /// Zero bytes or whitespace only
    Empty,
}

/// Classify a body as JSON, non-JSON or empty.
pub fn classify_body(body: &[u8]) -> BodyShape {
    if body.iter().all(u8::is_ascii_whitespace) {
        return BodyShape::Empty;
    }
    match serde_json::from_slice(body) {
        Ok(value) => BodyShape::Json(value),
        Err(_) => BodyShape::NonJson,
    }
}

/// Whether a status code counts as success (`200..=299`).
pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Error message for an unsuccessful status, `None` for 2xx.
pub fn failure_message(status: u16) -> Option<String> {
    if is_success_status(status) {
        None
    } else {
        Some(format!("Request failed with status {status}"))
    }
}

/// Normalized result of a proxied call.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    status_code: u16,
    headers: BTreeMap<String, String>,
    body: Vec<u8>,
    error: Option<String>,
}

impl ResponseEnvelope {
    pub fn new(status_code: u16, headers: BTreeMap<String, String>, body: Vec<u8>) -> Self {
        Self {
            status_code,
            headers,
            body,
            error: failure_message(status_code),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn is_success(&self) -> bool {
        is_success_status(self.status_code)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Response headers, names lowercased, first value per name.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    pub fn shape(&self) -> BodyShape {
        classify_body(&self.body)
    }

    /// Decode the body as `T`, regardless of status.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// JSON form for hosts: JSON bodies are embedded, other bodies become a
/// string, empty bodies are omitted.
impl Serialize for ResponseEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let shape = self.shape();
        let mut fields = 4;
        if self.error.is_some() {
            fields += 1;
        }
        if shape != BodyShape::Empty {
            fields += 1;
        }

        let mut state = serializer.serialize_struct("ResponseEnvelope", fields)?;
        state.serialize_field("status_code", &self.status_code)?;
        state.serialize_field("success", &self.is_success())?;
        state.serialize_field("headers", &self.headers)?;
        state.serialize_field("body_format", body_format(&shape))?;
        if let Some(error) = &self.error {
            state.serialize_field("error", error)?;
        }
        match shape {
            BodyShape::Json(value) => state.serialize_field("body", &value)?,
            BodyShape::NonJson => {
                state.serialize_field("body", &String::from_utf8_lossy(&self.body))?
            }
            BodyShape::Empty => {}
        }
        state.end()
    }
}

fn body_format(shape: &BodyShape) -> &'static str {
    match shape {
        BodyShape::Json(_) => "json",
        BodyShape::NonJson => "text",
        BodyShape::Empty => "empty",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_total_over_status_codes() {
        for code in 0..=u16::MAX {
            let envelope = ResponseEnvelope::new(code, BTreeMap::new(), Vec::new());
            let expected = (200..300).contains(&code);
            assert_eq!(envelope.is_success(), expected, "status {code}");
            assert_eq!(envelope.error().is_some(), !expected, "status {code}");
            if let Some(error) = envelope.error() {
                assert!(!error.is_empty());
            }
        }
    }

    #[test]
    fn failure_message_format() {
        let envelope = ResponseEnvelope::new(500, BTreeMap::new(), b"boom".to_vec());
        assert_eq!(envelope.error(), Some("Request failed with status 500"));
        assert_eq!(envelope.body(), b"boom");
    }

    #[test]
    fn classify_body_shapes() {
        assert_eq!(classify_body(b""), BodyShape::Empty);
        assert_eq!(classify_body(b" \n\t"), BodyShape::Empty);
        assert_eq!(classify_body(b"<html>"), BodyShape::NonJson);
        assert_eq!(
            classify_body(br#"{"ok":true}"#),
            BodyShape::Json(serde_json::json!({"ok": true}))
        );
        assert_eq!(
            classify_body(b"[1,2]"),
            BodyShape::Json(serde_json::json!([1, 2]))
        );
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        let envelope = ResponseEnvelope::new(200, headers, Vec::new());
        assert_eq!(envelope.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn json_decodes_body() {
        let envelope = ResponseEnvelope::new(200, BTreeMap::new(), br#"{"id":7}"#.to_vec());
        let value: serde_json::Value = envelope.json().unwrap();
        assert_eq!(value["id"], 7);

        let text = ResponseEnvelope::new(200, BTreeMap::new(), b"nope".to_vec());
        assert!(text.json::<serde_json::Value>().is_err());
    }

    #[test]
    fn serializes_json_body_inline() {
        let envelope = ResponseEnvelope::new(200, BTreeMap::new(), br#"{"id":7}"#.to_vec());
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["status_code"], 200);
        assert_eq!(json["success"], true);
        assert_eq!(json["body_format"], "json");
        assert_eq!(json["body"]["id"], 7);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn serializes_text_and_empty_bodies() {
        let text = ResponseEnvelope::new(502, BTreeMap::new(), b"bad gateway".to_vec());
        let json = serde_json::to_value(&text).unwrap();
        assert_eq!(json["body"], "bad gateway");
        assert_eq!(json["body_format"], "text");
        assert_eq!(json["error"], "Request failed with status 502");

        let empty = ResponseEnvelope::new(204, BTreeMap::new(), Vec::new());
        let json = serde_json::to_value(&empty).unwrap();
        assert!(json.get("body").is_none());
        assert_eq!(json["body_format"], "empty");
    }
}

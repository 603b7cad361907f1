//! Payload types of the CustomAPI REST API

use serde::{Deserialize, Serialize};

/// Profile of the authenticated user (`GET /api/users/profile/me`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub token: Option<String>,
    pub role: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
    pub user_id: Option<i64>,
    #[serde(rename = "role_id")]
    pub role_id: Option<i64>,
    pub last_login_at: String,
    pub password_changed_at: Option<String>,
    pub must_change_password: bool,
    pub failed_login_attempts: i64,
    pub locked_until: Option<String>,
    pub password_security: PasswordSecurity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PasswordSecurity {
    pub must_change_password: bool,
    pub password_change_required: bool,
    pub days_since_password_change: i64,
    pub password_changed_at: String,
    pub is_password_expired: bool,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub role: String,
    pub status: String,
}

/// Error payload some endpoints return alongside a non-2xx status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub details: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "API Error {}: {}", self.code, self.message)
    }
}

/// Standard wrapper most API endpoints put around their payload.
///
/// `message` arrives either as a string or as an object carrying an `id`;
/// both are normalized to a string (empty when neither applies).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawApiResponse")]
pub struct ApiResponse {
    pub data: serde_json::Value,
    pub status: String,
    pub status_messages: Vec<String>,
    pub message: String,
    #[serde(rename = "requestId")]
    pub request_id: String,
    pub requester: String,
    #[serde(rename = "operationId")]
    pub operation_id: String,
    pub api: String,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawApiResponse {
    data: serde_json::Value,
    status: String,
    status_messages: Vec<String>,
    message: serde_json::Value,
    #[serde(rename = "requestId")]
    request_id: String,
    requester: String,
    #[serde(rename = "operationId")]
    operation_id: String,
    api: String,
}

impl From<RawApiResponse> for ApiResponse {
    fn from(raw: RawApiResponse) -> Self {
        let message = match raw.message {
            serde_json::Value::String(s) => s,
            serde_json::Value::Object(map) => map
                .get("id")
                .and_then(|id| id.as_str())
                .map(str::to_string)
                .unwrap_or_default(),
            _ => String::new(),
        };
        Self {
            data: raw.data,
            status: raw.status,
            status_messages: raw.status_messages,
            message,
            request_id: raw.request_id,
            requester: raw.requester,
            operation_id: raw.operation_id,
            api: raw.api,
        }
    }
}

//! Session payloads: login, registration, heartbeat, online users, errors.

use serde::{Deserialize, Serialize};

/// Credentials for `LOGIN_REQUEST`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account name
    pub username: String,
    /// Plaintext password (the transport is not encrypted)
    pub password: String,
}

/// Server answer to a login attempt.
///
/// Also used locally to surface send failures and server errors to whoever
/// is waiting on a login result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Whether the login succeeded
    pub success: bool,
    /// Human-readable result
    #[serde(default)]
    pub message: String,
    /// Authenticated user id, present on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Authenticated username, present on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl LoginResponse {
    /// A failed result carrying only a message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into(), user_id: None, username: None }
    }
}

/// Account creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Desired account name
    pub username: String,
    /// Password
    pub password: String,
    /// Display name
    pub nickname: String,
}

/// Server answer to a registration attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// Whether the account was created
    pub success: bool,
    /// Human-readable result
    #[serde(default)]
    pub message: String,
    /// New user id, present on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl RegisterResponse {
    /// A failed result carrying only a message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into(), user_id: None }
    }
}

/// Keepalive body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat {
    /// Unix time in seconds when the heartbeat was produced
    pub timestamp: i64,
}

/// Online user list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserListResponse {
    /// Users known to the server
    #[serde(default)]
    pub users: Vec<UserInfoItem>,
}

/// One entry of [`UserListResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfoItem {
    /// User id
    pub user_id: String,
    /// Account name
    pub username: String,
    /// Display name
    #[serde(default)]
    pub nickname: Option<String>,
    /// Presence flag
    #[serde(default)]
    pub online: bool,
}

/// Server error report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Application error code
    pub error_code: i32,
    /// Human-readable description
    #[serde(default)]
    pub error_message: String,
}

impl ErrorPayload {
    /// The request requires an authenticated session.
    pub const AUTH_REQUIRED: i32 = 1001;

    /// Whether this error means the session is no longer authenticated.
    pub fn is_auth_required(&self) -> bool {
        self.error_code == Self::AUTH_REQUIRED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_response_optional_fields() {
        let resp: LoginResponse =
            serde_json::from_str(r#"{"success":false,"message":"bad password"}"#).unwrap();
        assert_eq!(resp, LoginResponse::failure("bad password"));

        let resp: LoginResponse = serde_json::from_str(
            r#"{"success":true,"message":"ok","user_id":"42","username":"alice"}"#,
        )
        .unwrap();
        assert_eq!(resp.user_id.as_deref(), Some("42"));
        assert_eq!(resp.username.as_deref(), Some("alice"));
    }

    #[test]
    fn error_payload_wire_names() {
        let err: ErrorPayload =
            serde_json::from_str(r#"{"error_code":1001,"error_message":"please log in"}"#).unwrap();
        assert!(err.is_auth_required());
        assert_eq!(err.error_message, "please log in");
    }

    #[test]
    fn user_list_tolerates_missing_optionals() {
        let list: UserListResponse =
            serde_json::from_str(r#"{"users":[{"user_id":"1","username":"bob"}]}"#).unwrap();
        assert_eq!(list.users.len(), 1);
        assert_eq!(list.users[0].nickname, None);
        assert!(!list.users[0].online);
    }
}

//! Relay message types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Greeting type sent by servers that expect an auth message
pub const TYPE_AUTH_REQUIRED: &str = "auth_required";

/// Reply type for an accepted auth message
pub const TYPE_AUTH_OK: &str = "auth_ok";

/// An opaque JSON message passed through the relay
///
/// Object key order is preserved, so a message is re-serialized exactly as
/// it was received (modulo insignificant whitespace).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message(Value);

impl Message {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Parse a message from JSON text
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text).map(Self)
    }

    /// Parse a message from raw JSON bytes
    pub fn from_slice(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data).map(Self)
    }

    /// The `type` field, if the message is an object carrying a string `type`
    pub fn message_type(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    pub fn is_type(&self, message_type: &str) -> bool {
        self.message_type() == Some(message_type)
    }

    /// Compact JSON encoding
    pub fn to_json(&self) -> String {
        self.0.to_string()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Message {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authentication reply sent in response to an `auth_required` greeting
///
/// Serializes as `{"type":"auth","access_token":"..."}`.
#[derive(Clone, Serialize)]
#[serde(tag = "type", rename = "auth")]
pub struct AuthMessage {
    access_token: String,
}

impl AuthMessage {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for AuthMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthMessage")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Local diagnostic record, serialized as `{"type":"error","message":"..."}`
///
/// Never sent to the remote; written to the output or error sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "error")]
pub struct ErrorEvent {
    pub message: String,
}

impl ErrorEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Bad invocation
    pub fn usage(program: &str) -> Self {
        Self::new(format!("Usage: {} <websocket_url> <access_token>", program))
    }

    /// A local input line that is not valid JSON
    pub fn invalid_json(err: &serde_json::Error) -> Self {
        Self::new(format!("Invalid JSON: {}", err))
    }

    /// The local input stream reached end of file
    pub fn input_closed() -> Self {
        Self::new("stdin closed")
    }

    /// Reading the local input, or relaying what was read, failed
    pub fn read_failed(err: &dyn fmt::Display) -> Self {
        Self::new(format!("read_stdin error: {}", err))
    }
}

impl fmt::Display for ErrorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_type() {
        let msg = Message::parse(r#"{"type":"auth_required","ha_version":"2024.1"}"#).unwrap();
        assert_eq!(msg.message_type(), Some("auth_required"));
        assert!(msg.is_type(TYPE_AUTH_REQUIRED));

        let untyped = Message::new(json!([1, 2, 3]));
        assert_eq!(untyped.message_type(), None);

        let numeric = Message::new(json!({"type": 7}));
        assert_eq!(numeric.message_type(), None);
    }

    #[test]
    fn test_message_preserves_key_order() {
        let text = r#"{"type":"result","id":4,"success":true,"result":{"z":1,"a":2}}"#;
        let msg = Message::parse(text).unwrap();
        assert_eq!(msg.to_json(), text);
    }

    #[test]
    fn test_message_compacts_whitespace() {
        let msg = Message::parse("{ \"id\" : 1,\n \"type\" : \"ping\" }").unwrap();
        assert_eq!(msg.to_string(), r#"{"id":1,"type":"ping"}"#);
    }

    #[test]
    fn test_message_parse_error() {
        assert!(Message::parse("{not json").is_err());
        assert!(Message::from_slice(b"\xff\xfe").is_err());
    }

    #[test]
    fn test_auth_message_shape() {
        let auth = serde_json::to_value(AuthMessage::new("secret-token")).unwrap();
        assert_eq!(auth, json!({"type": "auth", "access_token": "secret-token"}));
    }

    #[test]
    fn test_auth_message_debug_redacts_token() {
        let debug = format!("{:?}", AuthMessage::new("secret-token"));
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn test_error_event_shape() {
        let event = serde_json::to_string(&ErrorEvent::input_closed()).unwrap();
        assert_eq!(event, r#"{"type":"error","message":"stdin closed"}"#);
    }

    #[test]
    fn test_error_event_messages() {
        assert_eq!(
            ErrorEvent::usage("wsrelay").message,
            "Usage: wsrelay <websocket_url> <access_token>"
        );

        let err = Message::parse("nope").unwrap_err();
        assert!(ErrorEvent::invalid_json(&err)
            .message
            .starts_with("Invalid JSON: "));

        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        assert_eq!(
            ErrorEvent::read_failed(&io_err).message,
            "read_stdin error: pipe closed"
        );
    }
}

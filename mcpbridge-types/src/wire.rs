//! Request/response envelopes for the framed JSON protocol.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One client request: a handler `type` plus its named parameters.
///
/// A request is always exactly one JSON object; the framing layer
/// guarantees no trailing data shares its frame (see `mcpbridge-net`).
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(rename = "type")]
    pub request_type: String,
    #[serde(default)]
    pub params: HashMap<String, Value>,
}

/// One server response: exactly one per request.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Response {
    pub fn success(result: Value) -> Self {
        Self {
            status: "success",
            result: Some(result),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            result: None,
            message: Some(message.into()),
        }
    }

    /// The one-line greeting sent immediately after accept (§6).
    pub fn connected() -> Self {
        Self {
            status: "connected",
            result: None,
            message: Some("AbletonMCP Ready".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_empty_params() {
        let req: Request = serde_json::from_str(r#"{"type":"stop_playback"}"#).unwrap();
        assert_eq!(req.request_type, "stop_playback");
        assert!(req.params.is_empty());
    }

    #[test]
    fn success_response_omits_message() {
        let resp = Response::success(serde_json::json!({"playing": true}));
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["status"], "success");
        assert!(v.get("message").is_none());
    }

    #[test]
    fn error_response_omits_result() {
        let resp = Response::error("Unknown command: foo");
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["status"], "error");
        assert!(v.get("result").is_none());
        assert_eq!(v["message"], "Unknown command: foo");
    }

    #[test]
    fn connected_greeting_matches_wire_contract() {
        let v = serde_json::to_value(Response::connected()).unwrap();
        assert_eq!(v, serde_json::json!({"status":"connected","message":"AbletonMCP Ready"}));
    }
}

//! Wire protocol types for client-host communication.
//!
//! One message shape in each direction:
//! - **Request**: `{"type": <command name>, "params": {...}}`
//! - **Reply**: a JSON object. Either a bare result carrying `success`, or a
//!   status envelope (`{"status": "success", "result": {...}}` /
//!   `{"status": "error", "error": "..."}`) which is flattened here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A command on the wire: name plus parameter mapping.
///
/// Carries no identity beyond its content. Exchanges are strictly one at a
/// time on the session, so no request ID is needed to correlate replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    #[serde(rename = "type")]
    pub name: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl CommandEnvelope {
    pub fn new(name: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Build from any `{"type": ..., "params": ...}` shaped value.
    pub fn from_tagged(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// Status field some host builds wrap results in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Success,
    Error,
}

/// Flatten a decoded reply into a result mapping.
///
/// Returns `None` when the frame held something other than a JSON object; the
/// contract layer reports that as "no usable response". A mapping without a
/// `success` field is taken as success, matching how the host omits it on
/// plain query results.
pub fn decode_reply(value: Value) -> Option<Map<String, Value>> {
    let Value::Object(mut reply) = value else {
        return None;
    };

    let status = reply
        .get("status")
        .cloned()
        .and_then(|s| serde_json::from_value::<ReplyStatus>(s).ok());

    match status {
        Some(ReplyStatus::Error) => {
            reply.remove("status");
            let error = reply
                .remove("error")
                .or_else(|| reply.get("message").cloned())
                .unwrap_or_else(|| Value::String("Host reported an error".to_string()));
            reply.insert("success".to_string(), Value::Bool(false));
            reply.insert("error".to_string(), error);
            Some(reply)
        }
        Some(ReplyStatus::Success) => match reply.remove("result") {
            Some(Value::Object(mut inner)) => {
                inner
                    .entry("success".to_string())
                    .or_insert(Value::Bool(true));
                Some(inner)
            }
            Some(other) => {
                let mut inner = Map::new();
                inner.insert("success".to_string(), Value::Bool(true));
                inner.insert("result".to_string(), other);
                Some(inner)
            }
            None => {
                reply.remove("status");
                reply
                    .entry("success".to_string())
                    .or_insert(Value::Bool(true));
                Some(reply)
            }
        },
        None => {
            reply
                .entry("success".to_string())
                .or_insert(Value::Bool(true));
            Some(reply)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_serializes() {
        let mut params = Map::new();
        params.insert("blackboard_name".into(), json!("BB_Test"));
        params.insert("key_name".into(), json!("IsAlerted"));
        params.insert("key_type".into(), json!("Bool"));
        let envelope = CommandEnvelope::new("add_blackboard_key", params);

        insta::assert_json_snapshot!(envelope, @r#"
        {
          "type": "add_blackboard_key",
          "params": {
            "blackboard_name": "BB_Test",
            "key_name": "IsAlerted",
            "key_type": "Bool"
          }
        }
        "#);
    }

    #[test]
    fn envelope_without_params_deserializes() {
        let envelope = CommandEnvelope::from_tagged(json!({"type": "list_eqs_assets"})).unwrap();
        assert_eq!(envelope.name, "list_eqs_assets");
        assert!(envelope.params.is_empty());
    }

    #[test]
    fn bare_result_passes_through() {
        let reply = decode_reply(json!({
            "success": false,
            "error": "Blackboard not found: /Game/AI/Blackboards/BB_Missing",
            "error_code": 1001
        }))
        .unwrap();

        assert_eq!(reply["success"], json!(false));
        assert_eq!(reply["error_code"], json!(1001));
        assert_eq!(reply.len(), 3);
    }

    #[test]
    fn missing_success_is_treated_as_success() {
        let reply = decode_reply(json!({"value": "/Game/Modes/BP_GameMode"})).unwrap();
        assert_eq!(reply["success"], json!(true));
        assert_eq!(reply["value"], json!("/Game/Modes/BP_GameMode"));
    }

    #[test]
    fn non_boolean_success_is_kept_verbatim() {
        let reply = decode_reply(json!({"success": "false", "error": "Compile failed"})).unwrap();
        assert_eq!(reply["success"], json!("false"));

        let reply = decode_reply(json!({"success": null})).unwrap();
        assert_eq!(reply["success"], Value::Null);
    }

    #[test]
    fn status_success_envelope_is_unwrapped() {
        let reply = decode_reply(json!({
            "status": "success",
            "result": {"generator_index": 0, "query_name": "EQS_FindCover"}
        }))
        .unwrap();

        assert_eq!(reply["success"], json!(true));
        assert_eq!(reply["generator_index"], json!(0));
        assert!(!reply.contains_key("status"));
    }

    #[test]
    fn status_error_envelope_becomes_failure() {
        let reply = decode_reply(json!({
            "status": "error",
            "error": "Unknown command: frobnicate"
        }))
        .unwrap();

        assert_eq!(reply["success"], json!(false));
        assert_eq!(reply["error"], json!("Unknown command: frobnicate"));
        assert!(!reply.contains_key("status"));
    }

    #[test]
    fn non_object_reply_is_unusable() {
        assert!(decode_reply(json!([1, 2, 3])).is_none());
        assert!(decode_reply(json!("ok")).is_none());
        assert!(decode_reply(Value::Null).is_none());
    }
}

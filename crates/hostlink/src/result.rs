//! The one result shape every command and tool returns.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::subresource::{GeneratorIndex, NodeId, TestIndex};

/// Reported when no connection to the host could be made.
pub const FAILED_TO_CONNECT: &str = "Failed to connect to host";
/// Reported when the exchange produced no usable reply.
pub const NO_RESPONSE: &str = "No response from host";

/// Mapping with a boolean `success` plus command-specific fields.
///
/// Always carries `success`. Failures carry `error`, optionally `error_code`
/// and `hint`. Host-authored results are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandResult(Map<String, Value>);

impl CommandResult {
    pub fn success() -> Self {
        let mut map = Map::new();
        map.insert("success".to_string(), Value::Bool(true));
        Self(map)
    }

    pub fn failure(error: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("success".to_string(), Value::Bool(false));
        map.insert("error".to_string(), Value::String(error.into()));
        Self(map)
    }

    /// Failure reported under `message`, the key the HTTP-backed tools use.
    pub fn failure_message(message: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("success".to_string(), Value::Bool(false));
        map.insert("message".to_string(), Value::String(message.into()));
        Self(map)
    }

    /// Local pre-flight rejection; never reached the host.
    pub fn invalid_parameter(error: impl Into<String>) -> Self {
        Self::failure(error).with_field("error_code", "InvalidParameter")
    }

    pub fn failed_to_connect() -> Self {
        Self::failure(FAILED_TO_CONNECT)
    }

    pub fn no_response() -> Self {
        Self::failure(NO_RESPONSE)
    }

    /// Wrap a reply already flattened by `decode_reply`. Kept verbatim.
    pub fn from_reply(reply: Map<String, Value>) -> Self {
        Self(reply)
    }

    pub fn with_hint(self, hint: impl Into<String>) -> Self {
        self.with_field("hint", hint.into())
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn is_success(&self) -> bool {
        matches!(self.0.get("success"), Some(Value::Bool(true)))
    }

    /// Failure message, from `error` or else `message`.
    pub fn error(&self) -> Option<&str> {
        self.0
            .get("error")
            .or_else(|| self.0.get("message"))
            .and_then(Value::as_str)
    }

    pub fn error_code(&self) -> Option<&Value> {
        self.0.get("error_code")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Index the host assigned to a newly added generator.
    pub fn generator_index(&self) -> Option<GeneratorIndex> {
        self.u32_field("generator_index").map(GeneratorIndex::new)
    }

    /// Index the host assigned to a newly added test.
    pub fn test_index(&self) -> Option<TestIndex> {
        self.u32_field("test_index").map(TestIndex::new)
    }

    /// Handle of a newly created graph node.
    pub fn node_id(&self) -> Option<NodeId> {
        self.0
            .get("node_id")
            .and_then(Value::as_str)
            .map(NodeId::from)
    }

    fn u32_field(&self, key: &str) -> Option<u32> {
        self.0
            .get(key)
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
    }
}

impl From<CommandResult> for Value {
    fn from(result: CommandResult) -> Self {
        result.into_value()
    }
}

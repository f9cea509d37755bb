//! Blueprint graph commands.
//!
//! Nodes are addressed by the opaque `node_id` the host returns when it
//! creates them. Three of these commands accept a local-only `rationale` that
//! is recorded after a successful call and never sent to the host.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::perception::blueprint_path;
use crate::subresource::NodeId;

/// `[x, y]` in graph space.
pub type NodePosition = [f64; 2];

fn origin() -> NodePosition {
    [0.0, 0.0]
}

/// Accept any scalar and send it the way the host's pin parser expects.
fn pin_value_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(if b { "true" } else { "false" }.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "pin_value must be a string, number or boolean, got {other}"
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddBlueprintEventNode {
    pub blueprint_name: String,
    /// e.g. `ReceiveBeginPlay`, `ReceiveTick`
    pub event_name: String,
    #[serde(default = "origin")]
    pub node_position: NodePosition,
    #[serde(default = "blueprint_path")]
    pub path: String,
    #[serde(default, skip_serializing)]
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddBlueprintInputActionNode {
    pub blueprint_name: String,
    pub action_name: String,
    #[serde(default = "origin")]
    pub node_position: NodePosition,
    #[serde(default = "blueprint_path")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddBlueprintFunctionNode {
    pub blueprint_name: String,
    /// Component name or `self`.
    pub target: String,
    pub function_name: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default = "origin")]
    pub node_position: NodePosition,
    #[serde(default = "blueprint_path")]
    pub path: String,
    #[serde(default, skip_serializing)]
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectBlueprintNodes {
    pub blueprint_name: String,
    pub source_node_id: NodeId,
    pub source_pin: String,
    pub target_node_id: NodeId,
    pub target_pin: String,
    #[serde(default = "blueprint_path")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddBlueprintVariable {
    pub blueprint_name: String,
    pub variable_name: String,
    pub variable_type: String,
    #[serde(default)]
    pub is_exposed: bool,
    #[serde(default = "blueprint_path")]
    pub path: String,
    #[serde(default, skip_serializing)]
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddBlueprintGetSelfComponentReference {
    pub blueprint_name: String,
    pub component_name: String,
    #[serde(default = "origin")]
    pub node_position: NodePosition,
    #[serde(default = "blueprint_path")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddBlueprintSelfReference {
    pub blueprint_name: String,
    #[serde(default = "origin")]
    pub node_position: NodePosition,
    #[serde(default = "blueprint_path")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FindBlueprintNodes {
    pub blueprint_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default = "blueprint_path")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetNodePinValue {
    pub blueprint_name: String,
    pub node_id: NodeId,
    pub pin_name: String,
    #[serde(deserialize_with = "pin_value_string")]
    pub pin_value: String,
    #[serde(default = "blueprint_path")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddVariableGetNode {
    pub blueprint_name: String,
    pub variable_name: String,
    #[serde(default = "origin")]
    pub node_position: NodePosition,
    #[serde(default = "blueprint_path")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddVariableSetNode {
    pub blueprint_name: String,
    pub variable_name: String,
    #[serde(default = "origin")]
    pub node_position: NodePosition,
    #[serde(default = "blueprint_path")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddBranchNode {
    pub blueprint_name: String,
    #[serde(default = "origin")]
    pub node_position: NodePosition,
    #[serde(default = "blueprint_path")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteBlueprintNode {
    pub blueprint_name: String,
    pub node_id: NodeId,
    #[serde(default = "blueprint_path")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MoveBlueprintNode {
    pub blueprint_name: String,
    pub node_id: NodeId,
    pub position: NodePosition,
    #[serde(default = "blueprint_path")]
    pub path: String,
}

impl AddBlueprintEventNode {
    pub fn new(blueprint_name: impl Into<String>, event_name: impl Into<String>) -> Self {
        Self {
            blueprint_name: blueprint_name.into(),
            event_name: event_name.into(),
            node_position: origin(),
            path: blueprint_path(),
            rationale: None,
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }
}

impl AddBranchNode {
    pub fn new(blueprint_name: impl Into<String>) -> Self {
        Self {
            blueprint_name: blueprint_name.into(),
            node_position: origin(),
            path: blueprint_path(),
        }
    }
}

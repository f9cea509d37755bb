//! Blackboard and behavior tree commands.

use serde::{Deserialize, Serialize};

use crate::subresource::KeyName;

pub const BLACKBOARD_PATH: &str = "/Game/AI/Blackboards";
pub const BEHAVIOR_TREE_PATH: &str = "/Game/AI/BehaviorTrees";

fn blackboard_path() -> String {
    BLACKBOARD_PATH.to_string()
}

fn behavior_tree_path() -> String {
    BEHAVIOR_TREE_PATH.to_string()
}

/// Value type of a blackboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyType {
    Bool,
    Int,
    Float,
    String,
    Name,
    Vector,
    Rotator,
    Object,
    Class,
    Enum,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiAssetType {
    #[default]
    All,
    BehaviorTree,
    Blackboard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateBlackboard {
    pub name: String,
    #[serde(default = "blackboard_path")]
    pub path: String,
}

/// Adds a key. Adding an existing name again is sent as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddBlackboardKey {
    pub blackboard_name: String,
    pub key_name: KeyName,
    pub key_type: KeyType,
    #[serde(default = "blackboard_path")]
    pub path: String,
    #[serde(default)]
    pub instance_synced: bool,
    /// Allowed base class for Object/Class keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_class: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoveBlackboardKey {
    pub blackboard_name: String,
    pub key_name: KeyName,
    #[serde(default = "blackboard_path")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListBlackboardKeys {
    pub blackboard_name: String,
    #[serde(default = "blackboard_path")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateBehaviorTree {
    pub name: String,
    #[serde(default = "behavior_tree_path")]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blackboard_name: Option<String>,
    #[serde(default = "blackboard_path")]
    pub blackboard_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetBehaviorTreeBlackboard {
    pub behavior_tree_name: String,
    pub blackboard_name: String,
    #[serde(default = "behavior_tree_path")]
    pub behavior_tree_path: String,
    #[serde(default = "blackboard_path")]
    pub blackboard_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetBehaviorTreeStructure {
    pub name: String,
    #[serde(default = "behavior_tree_path")]
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListAiAssets {
    #[serde(default)]
    pub asset_type: AiAssetType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_filter: Option<String>,
}

impl AddBlackboardKey {
    pub fn new(blackboard_name: impl Into<String>, key_name: impl Into<KeyName>, key_type: KeyType) -> Self {
        Self {
            blackboard_name: blackboard_name.into(),
            key_name: key_name.into(),
            key_type,
            path: blackboard_path(),
            instance_synced: false,
            base_class: None,
        }
    }
}

impl CreateBlackboard {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: blackboard_path(),
        }
    }
}

impl ListBlackboardKeys {
    pub fn new(blackboard_name: impl Into<String>) -> Self {
        Self {
            blackboard_name: blackboard_name.into(),
            path: blackboard_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_defaults_fill_in() {
        let cmd: AddBlackboardKey = serde_json::from_value(json!({
            "blackboard_name": "BB_Enemy",
            "key_name": "TargetActor",
            "key_type": "Object"
        }))
        .unwrap();
        assert_eq!(cmd.path, BLACKBOARD_PATH);
        assert!(!cmd.instance_synced);

        let wire = serde_json::to_value(&cmd).unwrap();
        assert!(wire.get("base_class").is_none());
    }

    #[test]
    fn unknown_key_type_is_rejected() {
        let err = serde_json::from_value::<AddBlackboardKey>(json!({
            "blackboard_name": "BB_Enemy",
            "key_name": "Health",
            "key_type": "Double"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("Double"));
    }

    #[test]
    fn asset_type_is_snake_case() {
        let cmd: ListAiAssets = serde_json::from_value(json!({"asset_type": "behavior_tree"})).unwrap();
        assert_eq!(cmd.asset_type, AiAssetType::BehaviorTree);
        assert_eq!(serde_json::to_value(ListAiAssets::default()).unwrap(), json!({"asset_type": "all"}));
    }
}

//! The closed catalogue of host commands.
//!
//! Each command is a typed parameter struct; `HostCommand` tags them with the
//! wire name so the whole catalogue serializes straight into the request
//! envelope. Tool names are what callers use; for all but two commands the
//! tool name and the wire name are the same.

pub mod ai;
pub mod eqs;
pub mod material;
pub mod node;
pub mod perception;
pub mod project;
pub mod texture;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::bridge::protocol::CommandEnvelope;

pub use ai::*;
pub use eqs::*;
pub use material::*;
pub use node::*;
pub use perception::*;
pub use project::*;
pub use texture::*;

/// One catalogue row: caller-facing name, wire name, one-line summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    pub tool: &'static str,
    pub wire: &'static str,
    pub summary: &'static str,
}

macro_rules! host_commands {
    ($( $variant:ident($params:ty) => $tool:literal as $wire:literal, $summary:literal; )*) => {
        /// A command the host executes.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "type", content = "params")]
        pub enum HostCommand {
            $( #[serde(rename = $wire)] $variant($params), )*
        }

        impl HostCommand {
            pub const CATALOGUE: &'static [CommandSpec] = &[
                $( CommandSpec { tool: $tool, wire: $wire, summary: $summary }, )*
            ];

            /// Name the host dispatches on.
            pub fn wire_name(&self) -> &'static str {
                match self {
                    $( Self::$variant(_) => $wire, )*
                }
            }

            /// Name callers know the command by.
            pub fn tool_name(&self) -> &'static str {
                match self {
                    $( Self::$variant(_) => $tool, )*
                }
            }
        }

        $(
            impl From<$params> for HostCommand {
                fn from(params: $params) -> Self {
                    Self::$variant(params)
                }
            }
        )*
    };
}

host_commands! {
    CreateBlackboard(CreateBlackboard) => "create_blackboard" as "create_blackboard",
        "Create a Blackboard asset";
    AddBlackboardKey(AddBlackboardKey) => "add_blackboard_key" as "add_blackboard_key",
        "Add a typed key to a Blackboard";
    RemoveBlackboardKey(RemoveBlackboardKey) => "remove_blackboard_key" as "remove_blackboard_key",
        "Remove a key from a Blackboard";
    ListBlackboardKeys(ListBlackboardKeys) => "list_blackboard_keys" as "list_blackboard_keys",
        "List the keys of a Blackboard";
    CreateBehaviorTree(CreateBehaviorTree) => "create_behavior_tree" as "create_behavior_tree",
        "Create a BehaviorTree asset, optionally linked to a Blackboard";
    SetBehaviorTreeBlackboard(SetBehaviorTreeBlackboard) => "set_behavior_tree_blackboard" as "set_behavior_tree_blackboard",
        "Link a Blackboard to a BehaviorTree";
    GetBehaviorTreeStructure(GetBehaviorTreeStructure) => "get_behavior_tree_structure" as "get_behavior_tree_structure",
        "Describe a BehaviorTree's nodes";
    ListAiAssets(ListAiAssets) => "list_ai_assets" as "list_ai_assets",
        "List BehaviorTree and Blackboard assets";

    CreateEqsQuery(CreateEqsQuery) => "create_eqs_query" as "create_eqs_query",
        "Create an environment query asset";
    AddEqsGenerator(AddEqsGenerator) => "add_eqs_generator" as "add_eqs_generator",
        "Add a generator to a query; returns generator_index";
    AddEqsTest(AddEqsTest) => "add_eqs_test" as "add_eqs_test",
        "Add a test under a generator; returns test_index";
    SetEqsTestProperty(SetEqsTestProperty) => "set_eqs_test_property" as "set_eqs_test_property",
        "Set a property on a test addressed by generator and test index";
    ListEqsAssets(ListEqsAssets) => "list_eqs_assets" as "list_eqs_assets",
        "List environment query assets";

    AddAiPerceptionComponent(AddAiPerceptionComponent) => "add_ai_perception_component" as "add_ai_perception_component",
        "Add an AIPerceptionComponent to a Blueprint";
    ConfigureSightSense(ConfigureSightSense) => "configure_sight_sense" as "configure_sight_sense",
        "Configure the sight sense";
    ConfigureHearingSense(ConfigureHearingSense) => "configure_hearing_sense" as "configure_hearing_sense",
        "Configure the hearing sense";
    ConfigureDamageSense(ConfigureDamageSense) => "configure_damage_sense" as "configure_damage_sense",
        "Configure the damage sense";
    SetPerceptionDominantSense(SetPerceptionDominantSense) => "set_perception_dominant_sense" as "set_perception_dominant_sense",
        "Choose the dominant perception sense";
    AddPerceptionStimuliSource(AddPerceptionStimuliSource) => "add_perception_stimuli_source" as "add_perception_stimuli_source",
        "Make a Blueprint detectable by perception";

    AddBlueprintEventNode(AddBlueprintEventNode) => "add_blueprint_event_node" as "add_blueprint_event_node",
        "Add an event node; returns node_id";
    AddBlueprintInputActionNode(AddBlueprintInputActionNode) => "add_blueprint_input_action_node" as "add_blueprint_input_action_node",
        "Add an input action event node";
    AddBlueprintFunctionNode(AddBlueprintFunctionNode) => "add_blueprint_function_node" as "add_blueprint_function_node",
        "Add a function call node";
    ConnectBlueprintNodes(ConnectBlueprintNodes) => "connect_blueprint_nodes" as "connect_blueprint_nodes",
        "Wire a pin on one node to a pin on another";
    AddBlueprintVariable(AddBlueprintVariable) => "add_blueprint_variable" as "add_blueprint_variable",
        "Add a member variable";
    AddBlueprintGetSelfComponentReference(AddBlueprintGetSelfComponentReference) => "add_blueprint_get_self_component_reference" as "add_blueprint_get_self_component_reference",
        "Add a node referencing one of the Blueprint's own components";
    AddBlueprintSelfReference(AddBlueprintSelfReference) => "add_blueprint_self_reference" as "add_blueprint_self_reference",
        "Add a self reference node";
    FindBlueprintNodes(FindBlueprintNodes) => "find_blueprint_nodes" as "find_blueprint_nodes",
        "Find nodes in the event graph";
    SetNodePinValue(SetNodePinValue) => "set_node_pin_value" as "set_node_pin_value",
        "Set a default value on a node's input pin";
    AddVariableGetNode(AddVariableGetNode) => "add_variable_get_node" as "add_variable_get_node",
        "Add a variable getter node";
    AddVariableSetNode(AddVariableSetNode) => "add_variable_set_node" as "add_variable_set_node",
        "Add a variable setter node";
    AddBranchNode(AddBranchNode) => "add_branch_node" as "add_branch_node",
        "Add a branch node";
    DeleteBlueprintNode(DeleteBlueprintNode) => "delete_blueprint_node" as "delete_node",
        "Delete a node by id";
    MoveBlueprintNode(MoveBlueprintNode) => "move_blueprint_node" as "move_node",
        "Move a node to a new graph position";

    CreateSimpleMaterial(CreateSimpleMaterial) => "create_simple_material" as "create_simple_material",
        "Create a material from scalar and colour parameters";
    ImportTexture(ImportTexture) => "import_texture" as "import_texture",
        "Import an image file as a texture asset";

    GetConfigValue(GetConfigValue) => "get_config_value" as "get_config_value",
        "Read a value from a project config file";
    SetConfigValue(SetConfigValue) => "set_config_value" as "set_config_value",
        "Write a value to a project config file";
    ListConfigSections(ListConfigSections) => "list_config_sections" as "list_config_sections",
        "List the sections of a project config file";
}

/// True for a single plain path segment: ASCII letters, digits, `_` and `-`.
///
/// Names that end up in local file paths must pass this.
pub fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// A caller-supplied design note to keep once the command succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct Rationale {
    pub action: &'static str,
    pub category: &'static str,
    pub rationale: String,
    pub details: Value,
}

impl HostCommand {
    pub fn spec_for_tool(tool: &str) -> Option<&'static CommandSpec> {
        Self::CATALOGUE.iter().find(|spec| spec.tool == tool)
    }

    /// Parse caller parameters for a named tool.
    ///
    /// `None` when the tool is not a host command.
    pub fn from_tool(tool: &str, params: Value) -> Option<Result<Self, serde_json::Error>> {
        let spec = Self::spec_for_tool(tool)?;
        let params = match params {
            Value::Null => json!({}),
            other => other,
        };
        Some(serde_json::from_value(json!({"type": spec.wire, "params": params})))
    }

    /// Apply local defaulting that plain serde defaults can't express.
    pub fn normalize(&mut self) {
        if let Self::CreateSimpleMaterial(params) = self {
            params.normalize();
        }
    }

    pub fn to_envelope(&self) -> Result<CommandEnvelope, serde_json::Error> {
        CommandEnvelope::from_tagged(serde_json::to_value(self)?)
    }

    /// The local-only rationale, for the commands that accept one.
    pub fn rationale(&self) -> Option<Rationale> {
        let (category, rationale, details) = match self {
            Self::AddBlueprintEventNode(p) => (
                "blueprint_event",
                p.rationale.as_ref()?,
                json!({"blueprint_name": p.blueprint_name, "event_name": p.event_name}),
            ),
            Self::AddBlueprintFunctionNode(p) => (
                "blueprint_logic",
                p.rationale.as_ref()?,
                json!({
                    "blueprint_name": p.blueprint_name,
                    "target": p.target,
                    "function_name": p.function_name
                }),
            ),
            Self::AddBlueprintVariable(p) => (
                "blueprint_variable",
                p.rationale.as_ref()?,
                json!({
                    "blueprint_name": p.blueprint_name,
                    "variable_name": p.variable_name,
                    "variable_type": p.variable_type
                }),
            ),
            _ => return None,
        };
        let rationale = rationale.trim();
        if rationale.is_empty() {
            return None;
        }
        Some(Rationale {
            action: self.tool_name(),
            category,
            rationale: rationale.to_string(),
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subresource::NodeId;

    #[test]
    fn catalogue_names_are_unique() {
        let mut tools: Vec<_> = HostCommand::CATALOGUE.iter().map(|s| s.tool).collect();
        let mut wires: Vec<_> = HostCommand::CATALOGUE.iter().map(|s| s.wire).collect();
        tools.sort_unstable();
        wires.sort_unstable();
        let before = (tools.len(), wires.len());
        tools.dedup();
        wires.dedup();
        assert_eq!(before, (tools.len(), wires.len()));
        assert_eq!(tools.len(), 38);
    }

    #[test]
    fn envelope_carries_wire_name_and_params() {
        let cmd = HostCommand::from(AddBlackboardKey::new("BB_Test", "IsAlerted", KeyType::Bool));
        let envelope = cmd.to_envelope().unwrap();
        insta::with_settings!({sort_maps => true}, {
            insta::assert_json_snapshot!(envelope, @r#"
            {
              "type": "add_blackboard_key",
              "params": {
                "blackboard_name": "BB_Test",
                "instance_synced": false,
                "key_name": "IsAlerted",
                "key_type": "Bool",
                "path": "/Game/AI/Blackboards"
              }
            }
            "#);
        });
    }

    #[test]
    fn plain_names_are_single_segments() {
        assert!(is_plain_name("T_Moss-01"));
        assert!(!is_plain_name(""));
        assert!(!is_plain_name("../../x"));
        assert!(!is_plain_name("Textures/T_Moss"));
        assert!(!is_plain_name("T Moss"));
    }

    #[test]
    fn renamed_commands_use_host_names() {
        let cmd = HostCommand::from_tool(
            "delete_blueprint_node",
            json!({"blueprint_name": "BP_Enemy", "node_id": "N1"}),
        )
        .unwrap()
        .unwrap();
        assert_eq!(cmd.tool_name(), "delete_blueprint_node");
        assert_eq!(cmd.wire_name(), "delete_node");
        assert_eq!(cmd.to_envelope().unwrap().name, "delete_node");

        let cmd = HostCommand::from(MoveBlueprintNode {
            blueprint_name: "BP_Enemy".into(),
            node_id: NodeId::new("N1"),
            position: [120.0, -40.0],
            path: BLUEPRINT_PATH.into(),
        });
        assert_eq!(cmd.to_envelope().unwrap().name, "move_node");
    }

    #[test]
    fn wire_names_are_not_tool_names() {
        assert!(HostCommand::from_tool("delete_node", json!({})).is_none());
        assert!(HostCommand::from_tool("generate_image", json!({})).is_none());
    }

    #[test]
    fn null_params_mean_all_defaults() {
        let cmd = HostCommand::from_tool("list_eqs_assets", Value::Null)
            .unwrap()
            .unwrap();
        assert_eq!(cmd.to_envelope().unwrap().params.len(), 0);
    }

    #[test]
    fn bad_params_are_a_parse_error() {
        let parsed = HostCommand::from_tool(
            "add_blackboard_key",
            json!({"blackboard_name": "BB_Test", "key_name": "X", "key_type": "Bool", "colour": 3}),
        )
        .unwrap();
        assert!(parsed.is_err());
    }

    #[test]
    fn rationale_is_extracted_and_never_sent() {
        let cmd = HostCommand::from_tool(
            "add_blueprint_variable",
            json!({
                "blueprint_name": "BP_Enemy",
                "variable_name": "Health",
                "variable_type": "Float",
                "rationale": "Tracks damage taken before death"
            }),
        )
        .unwrap()
        .unwrap();

        let rationale = cmd.rationale().unwrap();
        assert_eq!(rationale.action, "add_blueprint_variable");
        assert_eq!(rationale.category, "blueprint_variable");
        assert_eq!(rationale.details["variable_type"], json!("Float"));
        assert!(!cmd.to_envelope().unwrap().params.contains_key("rationale"));
    }

    #[test]
    fn blank_rationale_is_ignored() {
        let cmd = HostCommand::from(
            AddBlueprintEventNode::new("BP_Enemy", "ReceiveBeginPlay").with_rationale("   "),
        );
        assert!(cmd.rationale().is_none());
    }

    #[test]
    fn normalize_drops_orphan_emissive_strength() {
        let mut cmd = HostCommand::from_tool(
            "create_simple_material",
            json!({"name": "M_Test", "emissive_strength": 3.0}),
        )
        .unwrap()
        .unwrap();
        cmd.normalize();
        assert!(!cmd.to_envelope().unwrap().params.contains_key("emissive_strength"));
    }
}

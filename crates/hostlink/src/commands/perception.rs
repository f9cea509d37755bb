//! AI perception component and sense configuration commands.

use serde::{Deserialize, Serialize};

pub const BLUEPRINT_PATH: &str = "/Game/Blueprints";
pub const PERCEPTION_COMPONENT: &str = "AIPerceptionComponent";
pub const STIMULI_SOURCE_COMPONENT: &str = "AIPerceptionStimuliSourceComponent";

pub(crate) fn blueprint_path() -> String {
    BLUEPRINT_PATH.to_string()
}

fn perception_component() -> String {
    PERCEPTION_COMPONENT.to_string()
}

fn stimuli_source_component() -> String {
    STIMULI_SOURCE_COMPONENT.to_string()
}

fn sight_radius() -> f64 {
    3000.0
}

fn lose_sight_radius() -> f64 {
    3500.0
}

fn peripheral_vision_angle() -> f64 {
    90.0
}

fn auto_success_range() -> f64 {
    500.0
}

fn hearing_range() -> f64 {
    3000.0
}

fn max_age() -> f64 {
    5.0
}

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SenseType {
    Sight,
    Hearing,
    Damage,
}

/// Which affiliations a sense reports. Unset flags fall to the host default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectionByAffiliation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enemies: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neutrals: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendlies: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddAiPerceptionComponent {
    pub blueprint_name: String,
    #[serde(default = "perception_component")]
    pub component_name: String,
    #[serde(default = "blueprint_path")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigureSightSense {
    pub blueprint_name: String,
    #[serde(default = "perception_component")]
    pub component_name: String,
    #[serde(default = "sight_radius")]
    pub sight_radius: f64,
    #[serde(default = "lose_sight_radius")]
    pub lose_sight_radius: f64,
    #[serde(default = "peripheral_vision_angle")]
    pub peripheral_vision_angle: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection_by_affiliation: Option<DetectionByAffiliation>,
    #[serde(default = "auto_success_range")]
    pub auto_success_range: f64,
    #[serde(default = "max_age")]
    pub max_age: f64,
    #[serde(default = "blueprint_path")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigureHearingSense {
    pub blueprint_name: String,
    #[serde(default = "perception_component")]
    pub component_name: String,
    #[serde(default = "hearing_range")]
    pub hearing_range: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection_by_affiliation: Option<DetectionByAffiliation>,
    #[serde(default = "max_age")]
    pub max_age: f64,
    #[serde(default = "blueprint_path")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigureDamageSense {
    pub blueprint_name: String,
    #[serde(default = "perception_component")]
    pub component_name: String,
    #[serde(default = "max_age")]
    pub max_age: f64,
    #[serde(default = "blueprint_path")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetPerceptionDominantSense {
    pub blueprint_name: String,
    pub sense_type: SenseType,
    #[serde(default = "perception_component")]
    pub component_name: String,
    #[serde(default = "blueprint_path")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddPerceptionStimuliSource {
    pub blueprint_name: String,
    #[serde(default = "stimuli_source_component")]
    pub component_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub register_as_source_for: Option<Vec<SenseType>>,
    #[serde(default = "yes")]
    pub auto_register: bool,
    #[serde(default = "blueprint_path")]
    pub path: String,
}

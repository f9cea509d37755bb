//! Environment query commands.
//!
//! Generators are addressed by position on the query, tests by position under
//! their generator. Both positions come back from the add command.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::subresource::{GeneratorIndex, TestIndex};

pub const EQS_PATH: &str = "/Game/AI/EQS";

fn eqs_path() -> String {
    EQS_PATH.to_string()
}

fn querier() -> String {
    "Querier".to_string()
}

fn item() -> String {
    "Item".to_string()
}

fn visibility() -> String {
    "Visibility".to_string()
}

fn grid_size() -> f64 {
    1000.0
}

fn space_between() -> f64 {
    100.0
}

fn inner_radius() -> f64 {
    300.0
}

fn outer_radius() -> f64 {
    1000.0
}

fn circle_radius() -> f64 {
    500.0
}

fn number_of_points() -> u32 {
    8
}

fn unit_factor() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneratorType {
    SimpleGrid,
    Donut,
    OnCircle,
    ActorsOfClass,
    CurrentLocation,
    PathingGrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestType {
    Distance,
    Trace,
    Dot,
    Pathfinding,
    PathExists,
    GameplayTags,
    Overlap,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestPurpose {
    #[default]
    Score,
    Filter,
    FilterAndScore,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoringEquation {
    #[default]
    Linear,
    Square,
    InverseLinear,
    Constant,
    SquareRoot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateEqsQuery {
    pub name: String,
    #[serde(default = "eqs_path")]
    pub path: String,
}

/// Shape parameters are all sent; the host reads the ones its generator type uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddEqsGenerator {
    pub query_name: String,
    pub generator_type: GeneratorType,
    #[serde(default = "grid_size")]
    pub grid_size: f64,
    #[serde(default = "space_between")]
    pub space_between: f64,
    #[serde(default = "inner_radius")]
    pub inner_radius: f64,
    #[serde(default = "outer_radius")]
    pub outer_radius: f64,
    #[serde(default = "circle_radius")]
    pub circle_radius: f64,
    #[serde(default = "number_of_points")]
    pub number_of_points: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub searched_actor_class: Option<String>,
    #[serde(default = "querier")]
    pub generate_around: String,
    #[serde(default = "eqs_path")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddEqsTest {
    pub query_name: String,
    pub test_type: TestType,
    #[serde(default)]
    pub generator_index: GeneratorIndex,
    #[serde(default = "querier")]
    pub distance_to: String,
    #[serde(default = "querier")]
    pub trace_from: String,
    #[serde(default = "item")]
    pub trace_to: String,
    #[serde(default = "visibility")]
    pub trace_channel: String,
    #[serde(default)]
    pub test_purpose: TestPurpose,
    #[serde(default)]
    pub scoring_equation: ScoringEquation,
    #[serde(default = "unit_factor")]
    pub scoring_factor: f64,
    #[serde(default = "eqs_path")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetEqsTestProperty {
    pub query_name: String,
    pub generator_index: GeneratorIndex,
    pub test_index: TestIndex,
    pub property_name: String,
    pub property_value: Value,
    #[serde(default = "eqs_path")]
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListEqsAssets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_filter: Option<String>,
}

impl CreateEqsQuery {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: eqs_path(),
        }
    }
}

impl AddEqsGenerator {
    pub fn new(query_name: impl Into<String>, generator_type: GeneratorType) -> Self {
        Self {
            query_name: query_name.into(),
            generator_type,
            grid_size: grid_size(),
            space_between: space_between(),
            inner_radius: inner_radius(),
            outer_radius: outer_radius(),
            circle_radius: circle_radius(),
            number_of_points: number_of_points(),
            searched_actor_class: None,
            generate_around: querier(),
            path: eqs_path(),
        }
    }
}

impl AddEqsTest {
    pub fn new(query_name: impl Into<String>, test_type: TestType, generator_index: GeneratorIndex) -> Self {
        Self {
            query_name: query_name.into(),
            test_type,
            generator_index,
            distance_to: querier(),
            trace_from: querier(),
            trace_to: item(),
            trace_channel: visibility(),
            test_purpose: TestPurpose::default(),
            scoring_equation: ScoringEquation::default(),
            scoring_factor: unit_factor(),
            path: eqs_path(),
        }
    }
}

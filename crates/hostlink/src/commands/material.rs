//! Material creation command.

use serde::{Deserialize, Serialize};

pub const MATERIAL_PATH: &str = "/Game/Materials";

pub(crate) fn material_path() -> String {
    MATERIAL_PATH.to_string()
}

fn full_opacity() -> f64 {
    1.0
}

/// Linear RGB, each channel 0.0-1.0.
pub type Color = [f64; 3];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadingModel {
    #[default]
    DefaultLit,
    Unlit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    Opaque,
    Translucent,
    Masked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateSimpleMaterial {
    pub name: String,
    #[serde(default = "material_path")]
    pub path: String,
    #[serde(default)]
    pub shading_model: ShadingModel,
    #[serde(default)]
    pub blend_mode: BlendMode,
    #[serde(default)]
    pub two_sided: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_color: Option<Color>,
    #[serde(default = "full_opacity")]
    pub opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissive_color: Option<Color>,
    /// Only sent alongside `emissive_color`; see `normalize`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissive_strength: Option<f64>,
}

impl CreateSimpleMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: material_path(),
            shading_model: ShadingModel::default(),
            blend_mode: BlendMode::default(),
            two_sided: false,
            base_color: None,
            opacity: full_opacity(),
            emissive_color: None,
            emissive_strength: None,
        }
    }

    /// Strength rides with the emissive colour: defaults to 1.0 when a colour
    /// is set, dropped when it is not.
    pub fn normalize(&mut self) {
        if self.emissive_color.is_some() {
            self.emissive_strength.get_or_insert(1.0);
        } else {
            self.emissive_strength = None;
        }
    }
}

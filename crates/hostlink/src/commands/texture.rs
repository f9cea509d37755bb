//! Texture import command.

use serde::{Deserialize, Serialize};

pub(crate) fn default_compression() -> String {
    "Default".to_string()
}

pub(crate) fn default_lod_group() -> String {
    "World".to_string()
}

fn yes() -> bool {
    true
}

/// How `source` is to be read by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// `source` is a path the host can open.
    #[default]
    File,
    /// `source` is the image bytes, base64-encoded.
    Base64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportTexture {
    pub source: String,
    pub asset_name: String,
    pub destination_path: String,
    #[serde(default)]
    pub source_type: SourceType,
    /// e.g. `Default`, `Normalmap`, `Masks`, `UI`, `BC7`
    #[serde(default = "default_compression")]
    pub compression: String,
    #[serde(default = "yes")]
    pub srgb: bool,
    /// e.g. `World`, `WorldNormalMap`, `UI`, `Lightmap`
    #[serde(default = "default_lod_group")]
    pub lod_group: String,
}

//! Project configuration file commands.

use serde::{Deserialize, Serialize};

fn default_engine() -> String {
    "DefaultEngine".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetConfigValue {
    /// e.g. `/Script/EngineSettings.GameMapsSettings`
    pub section: String,
    pub key: String,
    /// `DefaultEngine`, `DefaultGame`, `DefaultEditor` or `DefaultInput`
    #[serde(default = "default_engine")]
    pub config_file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetConfigValue {
    pub section: String,
    pub key: String,
    pub value: String,
    #[serde(default = "default_engine")]
    pub config_file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListConfigSections {
    #[serde(default = "default_engine")]
    pub config_file: String,
}

impl Default for ListConfigSections {
    fn default() -> Self {
        Self {
            config_file: default_engine(),
        }
    }
}

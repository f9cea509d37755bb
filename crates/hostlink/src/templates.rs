//! Material templates.
//!
//! Built-in templates are JSON files shipped with the crate. User templates
//! live in the knowledge store under `material_template`. Lookups check
//! built-ins first, so a user template can never shadow one.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::commands::material::material_path;
use crate::commands::{BlendMode, Color, CreateSimpleMaterial, ShadingModel, is_plain_name};
use crate::config::TemplateConfig;
use crate::contract::Bridge;
use crate::knowledge::{KnowledgeClient, KnowledgeError};
use crate::result::CommandResult;

pub const TEMPLATE_CATEGORY: &str = "material_template";
const USER_LIST_LIMIT: u32 = 100;
const USER_LOOKUP_LIMIT: u32 = 10;

const WHITE: Color = [1.0, 1.0, 1.0];

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("invalid template name: {0:?}")]
    InvalidName(String),

    #[error("failed to read template {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse template {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissive_color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissive_strength: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub shading_model: ShadingModel,
    #[serde(default)]
    pub blend_mode: BlendMode,
    #[serde(default)]
    pub two_sided: bool,
    #[serde(default)]
    pub parameters: TemplateParameters,
}

impl MaterialTemplate {
    fn summary(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "blend_mode": self.blend_mode,
            "shading_model": self.shading_model,
            "two_sided": self.two_sided,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateSource {
    Builtin,
    User,
    #[default]
    All,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListMaterialTemplates {
    #[serde(default)]
    pub source: TemplateSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateName {
    pub name: String,
}

fn full_opacity() -> f64 {
    1.0
}

fn unit_strength() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaveMaterialTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub shading_model: ShadingModel,
    #[serde(default)]
    pub blend_mode: BlendMode,
    #[serde(default)]
    pub two_sided: bool,
    #[serde(default)]
    pub base_color: Option<Color>,
    /// Kept only for Translucent templates.
    #[serde(default = "full_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub emissive_color: Option<Color>,
    #[serde(default = "unit_strength")]
    pub emissive_strength: f64,
    /// Comma-separated.
    #[serde(default)]
    pub tags: String,
}

impl SaveMaterialTemplate {
    fn into_template(self) -> (MaterialTemplate, String) {
        let mut parameters = TemplateParameters {
            base_color: self.base_color,
            ..Default::default()
        };
        if self.blend_mode == BlendMode::Translucent {
            parameters.opacity = Some(self.opacity);
        }
        if self.emissive_color.is_some() {
            parameters.emissive_color = self.emissive_color;
            parameters.emissive_strength = Some(self.emissive_strength);
        }
        let template = MaterialTemplate {
            name: self.name,
            description: self.description,
            shading_model: self.shading_model,
            blend_mode: self.blend_mode,
            two_sided: self.two_sided,
            parameters,
        };
        (template, self.tags)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateMaterialFromTemplate {
    pub name: String,
    pub template: String,
    #[serde(default = "material_path")]
    pub path: String,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub opacity: Option<f64>,
    #[serde(default)]
    pub two_sided: Option<bool>,
}

impl CreateMaterialFromTemplate {
    /// Build the material command from a resolved template plus overrides.
    pub fn resolve(&self, template: &MaterialTemplate) -> CreateSimpleMaterial {
        let params = &template.parameters;
        let mut material = CreateSimpleMaterial::new(&self.name);
        material.path = self.path.clone();
        material.shading_model = template.shading_model;
        material.blend_mode = template.blend_mode;
        material.two_sided = self.two_sided.unwrap_or(template.two_sided);

        if template.shading_model == ShadingModel::Unlit {
            material.emissive_color = Some(self.color.or(params.emissive_color).unwrap_or(WHITE));
        } else {
            material.base_color = Some(self.color.or(params.base_color).unwrap_or(WHITE));
            if params.emissive_color.is_some() {
                material.emissive_color = params.emissive_color;
                material.emissive_strength = Some(params.emissive_strength.unwrap_or(1.0));
            }
        }

        if template.blend_mode == BlendMode::Translucent {
            material.opacity = self.opacity.or(params.opacity).unwrap_or(0.5);
        }
        material
    }
}

/// Where a resolved template came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Builtin,
    User,
}

impl Origin {
    fn as_str(self) -> &'static str {
        match self {
            Self::Builtin => "builtin",
            Self::User => "user",
        }
    }
}

pub struct TemplateStore {
    builtin_dir: PathBuf,
    knowledge: Arc<KnowledgeClient>,
}

impl TemplateStore {
    pub fn new(config: &TemplateConfig, knowledge: Arc<KnowledgeClient>) -> Self {
        Self {
            builtin_dir: config.builtin_dir.clone(),
            knowledge,
        }
    }

    /// Every readable built-in template, by name. Unreadable files are skipped.
    pub async fn builtins(&self) -> BTreeMap<String, MaterialTemplate> {
        let mut templates = BTreeMap::new();
        let mut entries = match tokio::fs::read_dir(&self.builtin_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %self.builtin_dir.display(), error = %e, "Template directory unreadable");
                return templates;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_template(&path).await {
                Ok(template) => {
                    templates.insert(template.name.clone(), template);
                }
                Err(e) => tracing::error!(error = %e, "Skipping template"),
            }
        }
        templates
    }

    pub async fn builtin(&self, name: &str) -> Result<Option<MaterialTemplate>, TemplateError> {
        check_name(name)?;
        let path = self.builtin_dir.join(format!("{name}.json"));
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }
        read_template(&path).await.map(Some)
    }

    async fn user_templates(&self, query: &str, limit: u32) -> Result<Vec<MaterialTemplate>, KnowledgeError> {
        let documents = self
            .knowledge
            .search(query, Some(TEMPLATE_CATEGORY), limit)
            .await?;
        Ok(documents
            .iter()
            .filter_map(|doc| serde_json::from_str::<MaterialTemplate>(doc).ok())
            .collect())
    }

    /// Built-in first, then user.
    pub async fn resolve(&self, name: &str) -> Result<(Origin, MaterialTemplate), CommandResult> {
        match self.builtin(name).await {
            Ok(Some(template)) => return Ok((Origin::Builtin, template)),
            Ok(None) => {}
            Err(TemplateError::InvalidName(n)) => {
                return Err(CommandResult::invalid_parameter(format!("Invalid template name: {n}")));
            }
            Err(e) => return Err(CommandResult::failure(e.to_string())),
        }

        let candidates = self
            .user_templates(name, USER_LOOKUP_LIMIT)
            .await
            .map_err(|e| CommandResult::failure(format!("Knowledge search failed: {e}")))?;
        candidates
            .into_iter()
            .find(|t| t.name == name)
            .map(|t| (Origin::User, t))
            .ok_or_else(|| CommandResult::failure(format!("Template not found: {name}")))
    }

    pub async fn list(&self, params: ListMaterialTemplates) -> CommandResult {
        let mut builtin = Vec::new();
        let mut user = Vec::new();
        let mut user_error = None;

        if matches!(params.source, TemplateSource::Builtin | TemplateSource::All) {
            builtin = self.builtins().await.values().map(MaterialTemplate::summary).collect();
        }
        if matches!(params.source, TemplateSource::User | TemplateSource::All) {
            match self.user_templates("", USER_LIST_LIMIT).await {
                Ok(templates) => user = templates.iter().map(MaterialTemplate::summary).collect(),
                Err(e) => user_error = Some(e.to_string()),
            }
        }

        let mut result = CommandResult::success()
            .with_field("total_builtin", builtin.len())
            .with_field("total_user", user.len())
            .with_field("builtin", builtin)
            .with_field("user", user);
        if let Some(error) = user_error {
            result.insert("user_error", error);
        }
        result
    }

    pub async fn get(&self, params: TemplateName) -> CommandResult {
        match self.resolve(&params.name).await {
            Ok((origin, template)) => CommandResult::success()
                .with_field("source", origin.as_str())
                .with_field("template", json!(template)),
            Err(result) => result,
        }
    }

    pub async fn save(&self, params: SaveMaterialTemplate) -> CommandResult {
        if let Err(e) = check_name(&params.name) {
            return CommandResult::invalid_parameter(e.to_string());
        }
        let (template, tags) = params.into_template();
        let name = template.name.clone();
        let document = json!(template).to_string();
        let tags: Vec<&str> = tags.split(',').map(str::trim).filter(|t| !t.is_empty()).collect();
        let doc_id = format!("{TEMPLATE_CATEGORY}_{name}");

        match self.knowledge.add(&document, TEMPLATE_CATEGORY, &tags, Some(doc_id.as_str())).await {
            Ok(id) => CommandResult::success()
                .with_field("name", name.clone())
                .with_field("id", id)
                .with_field("message", format!("Template '{name}' saved successfully")),
            Err(e) => CommandResult::failure(e.to_string()),
        }
    }

    pub async fn delete(&self, params: TemplateName) -> CommandResult {
        match self.builtin(&params.name).await {
            Ok(Some(_)) => {
                return CommandResult::failure(format!("Cannot delete builtin template: {}", params.name));
            }
            Ok(None) => {}
            Err(e) => return CommandResult::invalid_parameter(e.to_string()),
        }

        let doc_id = format!("{TEMPLATE_CATEGORY}_{}", params.name);
        match self.knowledge.delete(&doc_id).await {
            Ok(()) => CommandResult::success()
                .with_field("name", params.name.clone())
                .with_field("message", format!("Template '{}' deleted successfully", params.name)),
            Err(e) => CommandResult::failure(e.to_string()),
        }
    }

    pub async fn create_material(&self, bridge: &Bridge, params: CreateMaterialFromTemplate) -> CommandResult {
        let template = match self.resolve(&params.template).await {
            Ok((_, template)) => template,
            Err(result) => return result,
        };
        let material = params.resolve(&template);
        tracing::info!(
            name = %material.name,
            template = %template.name,
            "Creating material from template"
        );
        bridge.execute(material).await
    }
}

fn check_name(name: &str) -> Result<(), TemplateError> {
    if is_plain_name(name) {
        Ok(())
    } else {
        Err(TemplateError::InvalidName(name.to_string()))
    }
}

async fn read_template(path: &Path) -> Result<MaterialTemplate, TemplateError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| TemplateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| TemplateError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

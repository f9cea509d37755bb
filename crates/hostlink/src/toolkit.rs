//! Single entry point for automated callers: one tool name, one JSON
//! parameter object, one `CommandResult`.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::bridge::Session;
use crate::commands::HostCommand;
use crate::config::Config;
use crate::contract::{Bridge, RationaleHook};
use crate::image_gen::ImageGenClient;
use crate::knowledge::{KnowledgeClient, KnowledgeError};
use crate::result::CommandResult;
use crate::templates::TemplateStore;

/// Tools implemented in this process rather than by the host.
const LOCAL_TOOLS: &[(&str, &str)] = &[
    ("get_ai_image_server_status", "Check whether the AI image server is reachable and list its models"),
    ("generate_image", "Generate an image from a text prompt"),
    ("generate_and_import_texture", "Generate an image and import it into the project as a texture"),
    ("list_material_templates", "List built-in and user material templates"),
    ("get_material_template", "Fetch one material template by name"),
    ("save_material_template", "Save a user material template"),
    ("delete_material_template", "Delete a user material template"),
    ("create_material_from_template", "Create a material from a named template"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInfo {
    pub name: &'static str,
    pub summary: &'static str,
    pub host: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ToolkitError {
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Knowledge(#[from] KnowledgeError),
}

pub struct Toolkit {
    bridge: Bridge,
    image_gen: ImageGenClient,
    templates: TemplateStore,
}

impl Toolkit {
    pub fn new(bridge: Bridge, image_gen: ImageGenClient, templates: TemplateStore) -> Self {
        Self {
            bridge,
            image_gen,
            templates,
        }
    }

    /// Wire up the session, HTTP clients and hooks from config.
    pub fn from_config(config: &Config) -> Result<Self, ToolkitError> {
        let knowledge = Arc::new(KnowledgeClient::new(&config.knowledge)?);
        let session = Arc::new(Session::tcp(config.session.clone()));
        let bridge = Bridge::new(session).with_hook(Arc::new(RationaleHook::new(knowledge.clone())));
        let image_gen = ImageGenClient::new(&config.image_gen)?;
        let templates = TemplateStore::new(&config.templates, knowledge);

        tracing::info!(
            host = %config.session.addr(),
            image_server = %image_gen.server_url(),
            knowledge_enabled = config.knowledge.enabled,
            "Toolkit ready"
        );
        Ok(Self::new(bridge, image_gen, templates))
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    /// Every tool, host commands first.
    pub fn catalogue() -> Vec<ToolInfo> {
        HostCommand::CATALOGUE
            .iter()
            .map(|spec| ToolInfo {
                name: spec.tool,
                summary: spec.summary,
                host: true,
            })
            .chain(LOCAL_TOOLS.iter().map(|&(name, summary)| ToolInfo {
                name,
                summary,
                host: false,
            }))
            .collect()
    }

    pub async fn call(&self, tool: &str, params: Value) -> CommandResult {
        tracing::debug!(tool, "Tool call");

        if let Some(parsed) = HostCommand::from_tool(tool, params.clone()) {
            return match parsed {
                Ok(command) => self.bridge.execute(command).await,
                Err(e) => invalid(tool, e),
            };
        }

        match tool {
            "get_ai_image_server_status" => self.image_gen.status().await,
            "generate_image" => match parse(tool, params) {
                Ok(p) => self.image_gen.generate_image(p).await,
                Err(result) => result,
            },
            "generate_and_import_texture" => match parse(tool, params) {
                Ok(p) => self.image_gen.generate_and_import_texture(&self.bridge, p).await,
                Err(result) => result,
            },
            "list_material_templates" => match parse(tool, params) {
                Ok(p) => self.templates.list(p).await,
                Err(result) => result,
            },
            "get_material_template" => match parse(tool, params) {
                Ok(p) => self.templates.get(p).await,
                Err(result) => result,
            },
            "save_material_template" => match parse(tool, params) {
                Ok(p) => self.templates.save(p).await,
                Err(result) => result,
            },
            "delete_material_template" => match parse(tool, params) {
                Ok(p) => self.templates.delete(p).await,
                Err(result) => result,
            },
            "create_material_from_template" => match parse(tool, params) {
                Ok(p) => self.templates.create_material(&self.bridge, p).await,
                Err(result) => result,
            },
            _ => {
                tracing::warn!(tool, "Unknown tool");
                CommandResult::failure(format!("Unknown tool: {tool}")).with_field("error_code", "UnknownTool")
            }
        }
    }
}

fn parse<T: DeserializeOwned>(tool: &str, params: Value) -> Result<T, CommandResult> {
    let params = match params {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(params).map_err(|e| invalid(tool, e))
}

fn invalid(tool: &str, e: serde_json::Error) -> CommandResult {
    tracing::debug!(tool, error = %e, "Rejected parameters");
    CommandResult::invalid_parameter(format!("Invalid parameters for {tool}: {e}"))
}

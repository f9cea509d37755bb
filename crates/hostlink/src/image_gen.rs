//! Text-to-image client and the generate-then-import texture workflow.
//!
//! Talks to a Stable Diffusion WebUI/Forge style API. Independent of the host
//! session: its own client, its own timeouts, never retried.

use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::commands::texture::{default_compression, default_lod_group};
use crate::commands::{ImportTexture, SourceType, is_plain_name};
use crate::config::ImageGenConfig;
use crate::contract::Bridge;
use crate::http::{base_url, build_client};
use crate::result::{CommandResult, FAILED_TO_CONNECT, NO_RESPONSE};

pub const MAX_STEPS: u32 = 150;
const MAX_LISTED_MODELS: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum ImageGenError {
    #[error("{0}")]
    Validation(String),

    #[error("Failed to connect to AI image server at {url}")]
    Connect { url: String, source: reqwest::Error },

    #[error("AI image server request timed out")]
    Timeout,

    #[error("AI server error: {detail}")]
    Http { status: u16, detail: String },

    #[error("No images returned from server")]
    NoImages,

    #[error("Error generating image: {0}")]
    Request(reqwest::Error),
}

impl ImageGenError {
    fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect {
                url: url.to_string(),
                source: e,
            }
        } else {
            Self::Request(e)
        }
    }

    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Connect { .. } => Some(
                "Make sure AI image server is running and AI_IMAGE_SERVER_URL is correct".to_string(),
            ),
            Self::Timeout => Some("Try reducing steps or image size".to_string()),
            _ => None,
        }
    }

    pub fn into_result(self) -> CommandResult {
        let hint = self.hint();
        let mut result = CommandResult::failure_message(self.to_string());
        if matches!(self, Self::Validation(_)) {
            result.insert("error_code", "InvalidParameter");
        }
        if let Some(hint) = hint {
            result.insert("hint", hint);
        }
        result
    }
}

/// Named parameter bundles for common asset kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    GameIcon,
    TextureTileable,
    ConceptArt,
    CharacterPortrait,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::GameIcon,
        Preset::TextureTileable,
        Preset::ConceptArt,
        Preset::CharacterPortrait,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::GameIcon => "game_icon",
            Self::TextureTileable => "texture_tileable",
            Self::ConceptArt => "concept_art",
            Self::CharacterPortrait => "character_portrait",
        }
    }

    /// (width, height, steps, cfg_scale, negative prompt suffix)
    fn settings(self) -> (u32, u32, u32, f64, &'static str) {
        match self {
            Self::GameIcon => (512, 512, 25, 7.5, ", text, watermark, signature"),
            Self::TextureTileable => (1024, 1024, 30, 7.0, ", text, watermark, seams visible"),
            Self::ConceptArt => (768, 512, 35, 8.0, ", blurry, low quality"),
            Self::CharacterPortrait => (512, 768, 30, 7.5, ", deformed, ugly, blurry"),
        }
    }
}

fn default_size() -> u32 {
    512
}

fn default_steps() -> u32 {
    20
}

fn default_cfg_scale() -> f64 {
    7.0
}

fn random_seed() -> i64 {
    -1
}

fn default_sampler() -> String {
    "Euler".to_string()
}

fn generated_path() -> String {
    "/Game/Generated".to_string()
}

fn yes() -> bool {
    true
}

/// Caller-facing generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateImage {
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: String,
    #[serde(default = "default_size")]
    pub width: u32,
    #[serde(default = "default_size")]
    pub height: u32,
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default = "default_cfg_scale")]
    pub cfg_scale: f64,
    /// -1 lets the server pick.
    #[serde(default = "random_seed")]
    pub seed: i64,
    #[serde(default = "default_sampler")]
    pub sampler_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
}

impl GenerateImage {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: String::new(),
            width: default_size(),
            height: default_size(),
            steps: default_steps(),
            cfg_scale: default_cfg_scale(),
            seed: random_seed(),
            sampler_name: default_sampler(),
            preset: None,
        }
    }

    /// Overlay the named preset. Unknown names are logged and ignored.
    pub fn apply_preset(&mut self) {
        let Some(name) = self.preset.as_deref() else {
            return;
        };
        let Some(preset) = Preset::parse(name) else {
            tracing::warn!(
                preset = name,
                available = ?Preset::ALL.map(Preset::name),
                "Unknown preset, using given parameters"
            );
            return;
        };

        let (width, height, steps, cfg_scale, suffix) = preset.settings();
        self.width = width;
        self.height = height;
        self.steps = steps;
        self.cfg_scale = cfg_scale;
        if !self.negative_prompt.contains(suffix) {
            self.negative_prompt.push_str(suffix);
        }
        tracing::info!(preset = name, width, height, steps, "Applied preset");
    }

    pub fn validate(&self) -> Result<(), ImageGenError> {
        if self.width % 8 != 0 || self.height % 8 != 0 {
            return Err(ImageGenError::Validation(format!(
                "Width and height must be multiples of 8 (got width={}, height={})",
                self.width, self.height
            )));
        }
        if !(1..=MAX_STEPS).contains(&self.steps) {
            return Err(ImageGenError::Validation(format!(
                "Steps must be between 1 and {MAX_STEPS} (got steps={})",
                self.steps
            )));
        }
        Ok(())
    }

    fn parameters(&self) -> Value {
        json!({
            "prompt": self.prompt,
            "negative_prompt": self.negative_prompt,
            "width": self.width,
            "height": self.height,
            "steps": self.steps,
            "cfg_scale": self.cfg_scale,
            "sampler_name": self.sampler_name,
        })
    }
}

#[derive(Debug, Serialize)]
struct Txt2ImgRequest<'a> {
    prompt: &'a str,
    negative_prompt: &'a str,
    width: u32,
    height: u32,
    steps: u32,
    cfg_scale: f64,
    seed: i64,
    sampler_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct Txt2ImgResponse {
    #[serde(default)]
    images: Vec<String>,
    /// JSON-encoded string carrying the seed actually used.
    #[serde(default)]
    info: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    #[serde(default)]
    model_name: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SamplerEntry {
    #[serde(default)]
    name: Option<String>,
}

/// A generated image as returned by the server.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub image_base64: String,
    pub seed: i64,
    pub parameters: Value,
}

/// Parameters for `generate_and_import_texture`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateAndImportTexture {
    pub prompt: String,
    pub asset_name: String,
    #[serde(default = "generated_path")]
    pub destination_path: String,
    #[serde(default)]
    pub negative_prompt: String,
    #[serde(default = "default_size")]
    pub width: u32,
    #[serde(default = "default_size")]
    pub height: u32,
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default = "default_cfg_scale")]
    pub cfg_scale: f64,
    #[serde(default = "random_seed")]
    pub seed: i64,
    #[serde(default = "default_sampler")]
    pub sampler_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    #[serde(default = "default_compression")]
    pub compression: String,
    #[serde(default = "yes")]
    pub srgb: bool,
    #[serde(default = "default_lod_group")]
    pub lod_group: String,
}

impl GenerateAndImportTexture {
    /// The asset name doubles as the temp file stem, so it must stay one segment.
    pub fn check_asset_name(&self) -> Result<(), ImageGenError> {
        if is_plain_name(&self.asset_name) {
            Ok(())
        } else {
            Err(ImageGenError::Validation(format!(
                "Asset name must contain only letters, digits, '_' or '-' (got {:?})",
                self.asset_name
            )))
        }
    }

    fn generation(&self) -> GenerateImage {
        GenerateImage {
            prompt: self.prompt.clone(),
            negative_prompt: self.negative_prompt.clone(),
            width: self.width,
            height: self.height,
            steps: self.steps,
            cfg_scale: self.cfg_scale,
            seed: self.seed,
            sampler_name: self.sampler_name.clone(),
            preset: self.preset.clone(),
        }
    }
}

pub struct ImageGenClient {
    generate_client: reqwest::Client,
    status_client: reqwest::Client,
    base_url: String,
    temp_dir: PathBuf,
}

impl ImageGenClient {
    pub fn new(config: &ImageGenConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            generate_client: build_client(config.generation_timeout)?,
            status_client: build_client(config.status_timeout)?,
            base_url: base_url(&config.server_url),
            temp_dir: config.temp_dir.clone(),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.base_url
    }

    /// Probe the server and list what it offers.
    pub async fn status(&self) -> CommandResult {
        tracing::info!(server_url = %self.base_url, "Checking AI image server status");
        match self.probe().await {
            Ok((models, samplers)) => {
                let model_count = models.len();
                let listed: Vec<_> = models.into_iter().take(MAX_LISTED_MODELS).collect();
                CommandResult::success()
                    .with_field("server_url", self.base_url.clone())
                    .with_field("status", "online")
                    .with_field("models", listed)
                    .with_field("model_count", model_count)
                    .with_field("samplers", samplers)
                    .with_field(
                        "message",
                        format!("AI image server is online with {model_count} models available"),
                    )
            }
            Err(e) => {
                let (status, message, hint) = match &e {
                    ImageGenError::Connect { url, .. } => (
                        "offline",
                        format!("Cannot connect to AI image server at {url}"),
                        Some("Make sure the image server is running with its API enabled"),
                    ),
                    ImageGenError::Timeout => ("timeout", e.to_string(), None),
                    _ => ("error", e.to_string(), None),
                };
                let result = CommandResult::failure_message(message)
                    .with_field("server_url", self.base_url.clone())
                    .with_field("status", status);
                match hint {
                    Some(hint) => result.with_hint(hint),
                    None => result,
                }
            }
        }
    }

    async fn probe(&self) -> Result<(Vec<String>, Vec<String>), ImageGenError> {
        let models: Vec<ModelEntry> = self.get_json("/sdapi/v1/sd-models").await?;
        let samplers: Vec<SamplerEntry> = self.get_json("/sdapi/v1/samplers").await?;

        let models = models
            .into_iter()
            .map(|m| {
                m.model_name
                    .or(m.title)
                    .unwrap_or_else(|| "unknown".to_string())
            })
            .collect();
        let samplers = samplers
            .into_iter()
            .map(|s| s.name.unwrap_or_else(|| "unknown".to_string()))
            .collect();
        Ok((models, samplers))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ImageGenError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .status_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ImageGenError::from_reqwest(&self.base_url, e))?;
        let response = check(response).await?;
        response
            .json()
            .await
            .map_err(|e| ImageGenError::from_reqwest(&self.base_url, e))
    }

    /// Apply preset, validate, then generate.
    pub async fn generate(&self, mut params: GenerateImage) -> Result<GeneratedImage, ImageGenError> {
        params.apply_preset();
        params.validate()?;
        self.txt2img(&params).await
    }

    async fn txt2img(&self, params: &GenerateImage) -> Result<GeneratedImage, ImageGenError> {
        let url = format!("{}/sdapi/v1/txt2img", self.base_url);
        let body = Txt2ImgRequest {
            prompt: &params.prompt,
            negative_prompt: &params.negative_prompt,
            width: params.width,
            height: params.height,
            steps: params.steps,
            cfg_scale: params.cfg_scale,
            seed: params.seed,
            sampler_name: &params.sampler_name,
        };

        let prompt_preview: String = params.prompt.chars().take(50).collect();
        tracing::info!(
            prompt = %prompt_preview,
            width = params.width,
            height = params.height,
            steps = params.steps,
            "Generating image"
        );

        let response = self
            .generate_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ImageGenError::from_reqwest(&self.base_url, e))?;
        let data: Txt2ImgResponse = check(response)
            .await?
            .json()
            .await
            .map_err(|e| ImageGenError::from_reqwest(&self.base_url, e))?;

        let image_base64 = data.images.into_iter().next().ok_or(ImageGenError::NoImages)?;
        let seed = actual_seed(data.info.as_ref()).unwrap_or(params.seed);
        tracing::info!(seed, "Image generated");

        Ok(GeneratedImage {
            image_base64,
            seed,
            parameters: params.parameters(),
        })
    }

    /// The `generate_image` tool.
    pub async fn generate_image(&self, params: GenerateImage) -> CommandResult {
        match self.generate(params).await {
            Ok(image) => CommandResult::success()
                .with_field("image_base64", image.image_base64)
                .with_field("seed", image.seed)
                .with_field("parameters", image.parameters),
            Err(e) => {
                tracing::warn!(error = %e, "Image generation failed");
                e.into_result()
            }
        }
    }

    /// Generate, save to a temp file, import through the bridge, clean up.
    ///
    /// Each failure names the stage it happened in. Once generation has
    /// succeeded the seed is reported so the image can be reproduced.
    pub async fn generate_and_import_texture(
        &self,
        bridge: &Bridge,
        params: GenerateAndImportTexture,
    ) -> CommandResult {
        let mut generation = params.generation();
        generation.apply_preset();
        if let Err(e) = params.check_asset_name().and_then(|()| generation.validate()) {
            return e.into_result().with_field("stage", "validation");
        }

        tracing::info!(
            asset_name = %params.asset_name,
            destination_path = %params.destination_path,
            "Generating and importing texture"
        );

        let image = match self.txt2img(&generation).await {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(error = %e, "Texture generation failed");
                return e.into_result().with_field("stage", "generation");
            }
        };

        let temp_file = match self.save_image(&params.asset_name, &image.image_base64).await {
            Ok(path) => path,
            Err(message) => {
                return CommandResult::failure_message(message)
                    .with_field("stage", "file_save")
                    .with_field(
                        "generation",
                        json!({
                            "success": true,
                            "seed": image.seed,
                            "hint": "Image was generated but couldn't be saved locally."
                        }),
                    );
            }
        };
        let source = temp_file.to_string_lossy().replace('\\', "/");

        let import = ImportTexture {
            source: source.clone(),
            asset_name: params.asset_name.clone(),
            destination_path: params.destination_path.clone(),
            source_type: SourceType::File,
            compression: params.compression.clone(),
            srgb: params.srgb,
            lod_group: params.lod_group.clone(),
        };
        let imported = bridge.execute(import).await;

        if !imported.is_success() {
            return import_failure(&imported, image.seed, &source);
        }

        if let Err(e) = tokio::fs::remove_file(&temp_file).await {
            tracing::warn!(path = %temp_file.display(), error = %e, "Failed to clean up temp file");
        } else {
            tracing::debug!(path = %temp_file.display(), "Cleaned up temp file");
        }

        let asset_path = format!("{}/{}", params.destination_path, params.asset_name);
        tracing::info!(asset_path = %asset_path, "Texture imported");
        CommandResult::success()
            .with_field(
                "message",
                format!("Successfully generated and imported texture '{}'", params.asset_name),
            )
            .with_field(
                "generation",
                json!({"seed": image.seed, "parameters": image.parameters}),
            )
            .with_field(
                "import",
                json!({
                    "asset_path": asset_path,
                    "compression": params.compression,
                    "srgb": params.srgb,
                    "lod_group": params.lod_group
                }),
            )
    }

    async fn save_image(&self, asset_name: &str, image_base64: &str) -> Result<PathBuf, String> {
        let bytes = STANDARD
            .decode(image_base64)
            .map_err(|e| format!("Failed to decode generated image: {e}"))?;
        tokio::fs::create_dir_all(&self.temp_dir)
            .await
            .map_err(|e| format!("Failed to create temp directory: {e}"))?;
        let path = self.temp_dir.join(format!("{asset_name}_generated.png"));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| format!("Failed to save generated image to temp file: {e}"))?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "Saved generated image");
        Ok(path)
    }
}

fn import_failure(imported: &CommandResult, seed: i64, temp_file: &str) -> CommandResult {
    let error = imported.error().unwrap_or("Unknown import error");
    match error {
        FAILED_TO_CONNECT => CommandResult::failure_message(FAILED_TO_CONNECT)
            .with_field("stage", "import")
            .with_field(
                "generation",
                json!({
                    "success": true,
                    "seed": seed,
                    "temp_file": temp_file,
                    "hint": "Image saved to temp file. Use import_texture with the file path."
                }),
            ),
        NO_RESPONSE => CommandResult::failure_message(NO_RESPONSE)
            .with_hint("Check the editor logs; the editor may have crashed")
            .with_field("stage", "import")
            .with_field("generation", json!({"success": true, "seed": seed})),
        other => CommandResult::failure_message(format!("Texture import failed: {other}"))
            .with_field("stage", "import")
            .with_field("generation", json!({"success": true, "seed": seed})),
    }
}

/// Seed from the `info` field, which the server sends as a JSON string.
fn actual_seed(info: Option<&Value>) -> Option<i64> {
    let info = match info? {
        Value::String(s) => serde_json::from_str::<Value>(s).ok()?,
        other => other.clone(),
    };
    info.get("seed").and_then(Value::as_i64)
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, ImageGenError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("detail").map(|d| d.as_str().map(str::to_string).unwrap_or_else(|| d.to_string())))
        .unwrap_or_else(|| format!("HTTP {status}: {body}"));
    Err(ImageGenError::Http {
        status: status.as_u16(),
        detail,
    })
}

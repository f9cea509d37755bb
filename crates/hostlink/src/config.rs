//! Environment-driven configuration.
//!
//! Each `Default` impl reads its environment variables; malformed values fall
//! back to the built-in default with a warning. Builders exist for tests.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::bridge::codec::MAX_FRAME_LENGTH;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 55557;
pub const DEFAULT_IMAGE_SERVER_URL: &str = "http://localhost:7860";
pub const DEFAULT_KNOWLEDGE_URL: &str = "http://localhost:8100";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is not a valid {expected}")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Read and parse an env var. Unset yields `Ok(None)`.
fn parse_var<T: FromStr>(var: &'static str, expected: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                var,
                value,
                expected,
            }),
        Err(_) => Ok(None),
    }
}

fn var_or<T: FromStr>(var: &'static str, expected: &'static str, default: T) -> T {
    match parse_var(var, expected) {
        Ok(Some(value)) => value,
        Ok(None) => default,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed config value, using default");
            default
        }
    }
}

fn string_var(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Host session settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
    /// Bound on each send and each receive.
    pub io_timeout: Duration,
    pub max_frame_length: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: string_var("HOSTLINK_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: var_or("HOSTLINK_PORT", "port number", DEFAULT_PORT),
            connect_timeout: Duration::from_secs(var_or(
                "HOSTLINK_CONNECT_TIMEOUT_SECS",
                "number of seconds",
                5,
            )),
            io_timeout: Duration::from_secs(var_or(
                "HOSTLINK_IO_TIMEOUT_SECS",
                "number of seconds",
                60,
            )),
            max_frame_length: MAX_FRAME_LENGTH,
        }
    }
}

impl SessionConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn with_addr(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }
}

/// Text-to-image server settings.
#[derive(Debug, Clone)]
pub struct ImageGenConfig {
    pub server_url: String,
    pub generation_timeout: Duration,
    pub status_timeout: Duration,
    /// Where generated images are written before import.
    pub temp_dir: PathBuf,
}

impl Default for ImageGenConfig {
    fn default() -> Self {
        Self {
            server_url: string_var("AI_IMAGE_SERVER_URL")
                .unwrap_or_else(|| DEFAULT_IMAGE_SERVER_URL.to_string()),
            generation_timeout: Duration::from_secs(120),
            status_timeout: Duration::from_secs(5),
            temp_dir: string_var("HOSTLINK_IMAGE_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join("hostlink")),
        }
    }
}

impl ImageGenConfig {
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    pub fn with_status_timeout(mut self, timeout: Duration) -> Self {
        self.status_timeout = timeout;
        self
    }
}

/// Knowledge store settings.
#[derive(Debug, Clone)]
pub struct KnowledgeConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub enabled: bool,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        let disabled = string_var("HOSTLINK_KNOWLEDGE_DISABLED")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Self {
            base_url: string_var("HOSTLINK_KNOWLEDGE_URL")
                .unwrap_or_else(|| DEFAULT_KNOWLEDGE_URL.to_string()),
            timeout: Duration::from_secs(10),
            enabled: !disabled,
        }
    }
}

impl KnowledgeConfig {
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Material template settings.
#[derive(Debug, Clone)]
pub struct TemplateConfig {
    pub builtin_dir: PathBuf,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            builtin_dir: string_var("HOSTLINK_TEMPLATES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| {
                    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates/materials")
                }),
        }
    }
}

impl TemplateConfig {
    pub fn with_builtin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.builtin_dir = dir.into();
        self
    }
}

/// Everything a `Toolkit` needs.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub session: SessionConfig,
    pub image_gen: ImageGenConfig,
    pub knowledge: KnowledgeConfig,
    pub templates: TemplateConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

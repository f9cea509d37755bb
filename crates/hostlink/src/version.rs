//! Version information for hostlink.

/// Hostlink version from Cargo.toml
pub const HOSTLINK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version information printed by `hostlink --version`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct VersionInfo {
    pub hostlink: &'static str,
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self {
            hostlink: HOSTLINK_VERSION,
        }
    }
}

impl VersionInfo {
    pub fn new() -> Self {
        Self::default()
    }
}

/// `User-Agent` header value for outbound HTTP requests.
pub fn user_agent() -> String {
    format!("hostlink/{HOSTLINK_VERSION}")
}

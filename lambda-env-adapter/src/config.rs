//! Adapter configuration.
//!
//! Loaded once per container from a small JSON file plus the
//! `API_GATEWAY_BASE_PATH` environment variable:
//!
//! ```json
//! { "text_mime_types": ["application/custom+json"], "config_path": "hello" }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

/// Environment variable holding the custom-domain base path mapping.
pub const BASE_PATH_VAR: &str = "API_GATEWAY_BASE_PATH";

/// Non-`text/*` MIME types whose bodies are passed through without base64.
pub const DEFAULT_TEXT_MIME_TYPES: [&str; 5] = [
    "application/json",
    "application/javascript",
    "application/xml",
    "application/vnd.api+json",
    "image/svg+xml",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AdapterConfig {
    /// Base path mapped onto the API on a custom domain, without slashes.
    #[serde(skip)]
    pub base_path: Option<String>,
    /// Extra MIME types to treat as text, on top of the defaults.
    #[serde(default)]
    pub text_mime_types: Vec<String>,
    /// Name of the application to serve.
    #[serde(default, rename = "config_path")]
    pub entry_point: Option<String>,
}

impl AdapterConfig {
    /// Read the config file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no adapter config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read adapter config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse adapter config {}", path.display()))
    }

    /// Pick up the base path override from the process environment.
    pub fn with_env_base_path(self) -> Self {
        match std::env::var(BASE_PATH_VAR) {
            Ok(base) => self.with_base_path(base),
            Err(_) => self,
        }
    }

    /// Set the base path override; an empty string clears it.
    pub fn with_base_path(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.base_path = (!base.is_empty()).then_some(base);
        self
    }

    pub fn with_text_mime_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.text_mime_types.extend(types.into_iter().map(Into::into));
        self
    }

    pub fn base_path(&self) -> Option<&str> {
        self.base_path.as_deref().filter(|b| !b.is_empty())
    }

    /// The default text MIME types followed by the configured ones.
    pub fn text_mime_types(&self) -> impl Iterator<Item = &str> {
        DEFAULT_TEXT_MIME_TYPES
            .into_iter()
            .chain(self.text_mime_types.iter().map(String::as_str))
    }
}

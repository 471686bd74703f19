//! Server configuration
//!
//! Values come from built-in defaults, then environment variables, then an
//! optional JSON file. Keys in the file use the same snake_case names as the
//! fields below; keys that are absent keep their earlier value.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::registry::config::{DEFAULT_MAX_BODY_SIZE, DEFAULT_VIEWER_QUEUE_CAPACITY};
use crate::registry::RegistryConfig;

/// Server configuration options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    pub http_port: u16,

    /// Interface to bind
    pub host: String,

    /// Apex hostname that serves the landing page instead of catching
    pub root_host: String,

    /// Directory holding `index.html`, `root.html` and `/assets`
    pub frontend_dir: PathBuf,

    /// Favicon file
    pub favicon: PathBuf,

    /// Where to send requests nobody is listening for (empty = plain reply)
    #[serde(default)]
    pub redirect_dest: Option<String>,

    /// Captured body cap in bytes
    pub max_body_size: usize,

    /// Per-viewer outbound queue bound
    pub viewer_queue_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            host: "127.0.0.1".to_string(),
            root_host: "localhost".to_string(),
            frontend_dir: PathBuf::from("frontend/dist"),
            favicon: PathBuf::from("frontend/favicon.ico"),
            redirect_dest: None,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            viewer_queue_capacity: DEFAULT_VIEWER_QUEUE_CAPACITY,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(port) = var("HTTP_PORT") {
            config.http_port = parse_var("HTTP_PORT", &port)?;
        }
        if let Some(host) = var("HOST") {
            config.host = host;
        }
        if let Some(root_host) = var("ROOT_HOST") {
            config.root_host = root_host;
        }
        if let Some(dir) = var("FRONTEND_DIR") {
            config.frontend_dir = PathBuf::from(dir);
        }
        if let Some(favicon) = var("FAVICON") {
            config.favicon = PathBuf::from(favicon);
        }
        if let Some(dest) = var("REDIRECT_DEST") {
            config.redirect_dest = Some(dest);
        }
        if let Some(size) = var("MAX_BODY_SIZE") {
            config.max_body_size = parse_var("MAX_BODY_SIZE", &size)?;
        }
        if let Some(capacity) = var("VIEWER_QUEUE_CAPACITY") {
            config.viewer_queue_capacity = parse_var("VIEWER_QUEUE_CAPACITY", &capacity)?;
        }

        Ok(config)
    }

    /// Environment configuration, overlaid with a JSON file when given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = Self::from_env()?;

        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                tracing::info!(path = %path.display(), "Using default config+env+file");
                config.overlay_json(&text)
            }
            None => {
                tracing::info!("Using default config+env");
                Ok(config)
            }
        }
    }

    /// Apply the keys present in a JSON object on top of this config
    pub fn overlay_json(self, text: &str) -> Result<Self> {
        let overlay: Value = serde_json::from_str(text)?;
        let Value::Object(overlay) = overlay else {
            return Err(Error::Config("config file must be a JSON object".into()));
        };

        let mut base = serde_json::to_value(&self)?;
        if let Value::Object(base) = &mut base {
            base.extend(overlay);
        }

        let mut config: Self = serde_json::from_value(base)?;
        if config.redirect_dest.as_deref() == Some("") {
            config.redirect_dest = None;
        }
        Ok(config)
    }

    /// Set the bind interface and port
    pub fn bind(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.http_port = port;
        self
    }

    /// Set the landing-page hostname
    pub fn root_host(mut self, root_host: impl Into<String>) -> Self {
        self.root_host = root_host.into();
        self
    }

    /// Set the frontend directory
    pub fn frontend_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.frontend_dir = dir.into();
        self
    }

    /// Redirect ignored requests to `dest`
    pub fn redirect_dest(mut self, dest: impl Into<String>) -> Self {
        self.redirect_dest = Some(dest.into());
        self
    }

    /// Set the captured body cap
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Set the per-viewer queue capacity
    pub fn viewer_queue_capacity(mut self, capacity: usize) -> Self {
        self.viewer_queue_capacity = capacity;
        self
    }

    /// `host:port` string to bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }

    /// Registry settings derived from this config
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig::default()
            .viewer_queue_capacity(self.viewer_queue_capacity)
            .max_body_size(self.max_body_size)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} has invalid value {value:?}")))
}

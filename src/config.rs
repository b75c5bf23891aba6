use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::loader::ScriptOptions;

pub const DEFAULT_DEV_PATH: &str = "/index.js";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config {path:?}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid {var}: {reason}")]
    Env { var: &'static str, reason: String },
}

/// Options recognised by the loader plugin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct LoaderOptions {
    /// Prefix placed between the runtime base path and each output file name.
    pub external_src: Option<String>,
    /// Base name of the emitted loader, without extension.
    pub file_name: String,
    pub should_hash: bool,
    pub crossorigin: bool,
    pub crossorigin_val: String,
    /// Unbundled entry module served by the dev loader, relative to the base path.
    pub dev_entry: String,
    /// Request path answered with the dev loader.
    pub dev_path: String,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            external_src: None,
            file_name: "app".to_string(),
            should_hash: true,
            crossorigin: false,
            crossorigin_val: String::new(),
            dev_entry: "src/main.ts".to_string(),
            dev_path: DEFAULT_DEV_PATH.to_string(),
        }
    }
}

impl LoaderOptions {
    pub fn from_toml_str(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents, path)
    }

    pub fn script_options(&self) -> ScriptOptions<'_> {
        ScriptOptions {
            external_src: self.external_src.as_deref(),
            crossorigin: self.crossorigin.then_some(self.crossorigin_val.as_str()),
        }
    }
}

/// Runtime configuration for the dev server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub root: PathBuf,
    pub loader_config: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr: SocketAddr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:5173".to_string())
            .parse()
            .map_err(|err: std::net::AddrParseError| ConfigError::Env {
                var: "BIND_ADDR",
                reason: err.to_string(),
            })?;

        let root = PathBuf::from(std::env::var("DEV_ROOT").unwrap_or_else(|_| ".".to_string()));
        let loader_config = std::env::var("LOADER_CONFIG").ok().map(PathBuf::from);

        Ok(Self {
            bind_addr,
            root,
            loader_config,
        })
    }
}

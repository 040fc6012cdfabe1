use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use crate::error::PulseError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Query API listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Prefix every query route is nested under.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// Largest accepted upload body.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// `["*"]` allows any origin with credentials.
    #[serde(default = "default_cors_origins")]
    pub cors_allow_origins: Vec<String>,
}

/// Backing JSONL file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrometheusConfig {
    /// When false, the collector records nothing and the route is not mounted.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_addr() -> String { "0.0.0.0:8002".into() }
fn default_api_prefix() -> String { "/api".into() }
fn default_max_upload_bytes() -> usize { 50 * 1024 * 1024 }
fn default_cors_origins() -> Vec<String> { vec!["*".into()] }
fn default_log_file() -> PathBuf { PathBuf::from("./data/monitoring.jsonl") }
fn default_metrics_path() -> String { "/metrics".into() }

// ── Impls ─────────────────────────────────────────────────────

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            api_prefix: default_api_prefix(),
            max_upload_bytes: default_max_upload_bytes(),
            cors_allow_origins: default_cors_origins(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
        }
    }
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_metrics_path(),
        }
    }
}

impl PulseConfig {
    /// Load configuration from YAML file + env overrides.
    ///
    /// Nested keys use a double underscore (`LOGPULSE_STORE__LOG_FILE`).
    /// The bare `LOG_FILE` variable is honoured as well and wins over both.
    ///
    /// A missing file is not an error: env overrides still apply on top of
    /// the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config: PulseConfig = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("LOGPULSE_").split("__"))
            .merge(Env::raw().only(&["LOG_FILE"]).map(|_| "store.log_file".into()))
    }

    /// Reject route settings the HTTP router cannot mount.
    pub fn validate(&self) -> Result<(), PulseError> {
        let prefix = &self.server.api_prefix;
        if !prefix.is_empty() && !prefix.starts_with('/') {
            return Err(PulseError::Config(format!(
                "server.api_prefix must be empty or start with '/', got {prefix:?}"
            )));
        }

        let prometheus = &self.observability.prometheus;
        if prometheus.enabled && !prometheus.path.starts_with('/') {
            return Err(PulseError::Config(format!(
                "observability.prometheus.path must start with '/', got {:?}",
                prometheus.path
            )));
        }
        Ok(())
    }

    /// Whether CORS should mirror any origin.
    pub fn cors_is_permissive(&self) -> bool {
        self.server.cors_allow_origins.iter().any(|o| o == "*")
    }
}

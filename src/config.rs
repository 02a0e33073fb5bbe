use anyhow::{Context, Result};
use directories::ProjectDirs;
use lookalike_engine::{EngineConfig, FusionConfig, Method, Metric};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const FALLBACK_PREFIX: &str = "/usr/local/etc/lookalike";

static PROJECT_DIRS: Lazy<Option<ProjectDirs>> =
    Lazy::new(|| ProjectDirs::from("", "", "lookalike"));

pub static CONFIG_PATH: Lazy<PathBuf> = Lazy::new(|| match option_env!("LOOKALIKE_CONFIG_PATH") {
    Some(p) => PathBuf::from(p),
    None => PROJECT_DIRS
        .as_ref()
        .map(|d| d.config_dir().join("config.toml"))
        .unwrap_or_else(|| Path::new(FALLBACK_PREFIX).join("config.toml")),
});

pub static STORE_PREFIX: Lazy<PathBuf> = Lazy::new(|| match option_env!("LOOKALIKE_STORE_PREFIX") {
    Some(p) => PathBuf::from(p),
    None => PROJECT_DIRS
        .as_ref()
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(FALLBACK_PREFIX)),
});

/// Metric used when a single method is matched on its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodMetrics {
    pub descriptor: Metric,
    pub landmarks: Metric,
}

impl Default for MethodMetrics {
    fn default() -> Self {
        Self {
            descriptor: Metric::CosineLinear,
            landmarks: Metric::DistanceLinear,
        }
    }
}

impl MethodMetrics {
    pub fn for_method(&self, method: Method) -> Metric {
        match method {
            Method::Descriptor => self.descriptor,
            Method::Landmarks => self.landmarks,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub threshold: f32,
    pub limit: usize,
    pub store: Option<PathBuf>,
    pub single: MethodMetrics,
    pub fusion: FusionConfig,
}

impl Default for Config {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            threshold: engine.threshold,
            limit: engine.limit,
            store: None,
            single: MethodMetrics::default(),
            fusion: engine.fusion,
        }
    }
}

impl Config {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            threshold: self.threshold,
            limit: self.limit,
            fusion: self.fusion,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for method in Method::ALL {
            self.single
                .for_method(method)
                .validate()
                .with_context(|| format!("metric for {method}"))?;
        }
        self.fusion.validate().context("fusion settings")?;
        if !self.threshold.is_finite() {
            anyhow::bail!("threshold must be finite, got {}", self.threshold);
        }
        Ok(())
    }

    pub fn store_prefix(&self) -> &Path {
        self.store.as_deref().unwrap_or(&STORE_PREFIX)
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or(&CONFIG_PATH);
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config at {}", path.display()))?;
    let cfg: Config =
        toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validating config {}", path.display()))?;
    Ok(cfg)
}

pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or(&CONFIG_PATH);
    let data = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;
    Ok(())
}

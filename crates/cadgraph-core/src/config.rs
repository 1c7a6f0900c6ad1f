//! Configuration loading, from .cadgraph/config.yaml or an explicit path.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::export::ExportFormat;
use crate::shapes::heuristics::{NutConfig, PipeConfig, PlateConfig, ScrewConfig, WheelConfig};
use crate::shapes::CONF_THRESHOLD;

/// Config file looked up relative to the working directory.
pub const CONFIG_RELATIVE_PATH: &str = ".cadgraph/config.yaml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadgraphConfig {
    /// Detector order, thresholds and keyword lists
    pub classifier: ClassifierConfig,

    /// Scene graph cache
    pub cache: CacheConfig,

    /// Serializer selection
    pub export: ExportConfig,
}

/// The detector kinds a registry can be assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    Screw,
    Plate,
    Pipe,
    Nut,
    Wheel,
}

impl DetectorKind {
    pub const DEFAULT_ORDER: [DetectorKind; 5] = [
        DetectorKind::Screw,
        DetectorKind::Plate,
        DetectorKind::Pipe,
        DetectorKind::Nut,
        DetectorKind::Wheel,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_threshold")]
    pub acceptance_threshold: f64,

    /// Evaluation order; the first accepted detector wins
    #[serde(default = "default_order")]
    pub order: Vec<DetectorKind>,

    #[serde(default)]
    pub screw: ScrewConfig,

    #[serde(default)]
    pub plate: PlateConfig,

    #[serde(default)]
    pub pipe: PipeConfig,

    #[serde(default)]
    pub nut: NutConfig,

    #[serde(default)]
    pub wheel: WheelConfig,
}

fn default_threshold() -> f64 {
    CONF_THRESHOLD
}
fn default_order() -> Vec<DetectorKind> {
    DetectorKind::DEFAULT_ORDER.to_vec()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: default_threshold(),
            order: default_order(),
            screw: ScrewConfig::default(),
            plate: PlateConfig::default(),
            pipe: PipeConfig::default(),
            nut: NutConfig::default(),
            wheel: WheelConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// Where cache files go; beside the asset when unset
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_cache_enabled() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Formats written when the CLI gets no `--format`
    #[serde(default = "default_formats")]
    pub formats: Vec<ExportFormat>,
}

fn default_formats() -> Vec<ExportFormat> {
    ExportFormat::ALL.to_vec()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            formats: default_formats(),
        }
    }
}

impl CadgraphConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(config)
    }

    /// Load from a directory (looks for .cadgraph/config.yaml), defaults otherwise
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_RELATIVE_PATH);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve a relative cache directory against `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        if let Some(dir) = self.cache.dir.as_mut() {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }
}

//! Scene graph construction with an on-disk GraphML cache.
//!
//! The cache file is keyed by the asset's modification time and size. A
//! hit restores the graph only; meshes are always re-imported because the
//! cache holds no geometry.

use std::path::{Path, PathBuf};
use std::time::{Instant, UNIX_EPOCH};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::asset::{GltfAsset, SceneAssets};
use super::graph::{SceneGraph, SceneNode, ROOT_ID};
use crate::config::CacheConfig;
use crate::error::SceneError;
use crate::export::graphml;

/// Loader behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    pub use_cache: bool,
    /// Directory for cache files; beside the asset when unset.
    pub cache_dir: Option<PathBuf>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            cache_dir: None,
        }
    }
}

impl From<&CacheConfig> for LoadOptions {
    fn from(config: &CacheConfig) -> Self {
        Self {
            use_cache: config.enabled,
            cache_dir: config.dir.clone(),
        }
    }
}

/// Result of a load, with cache bookkeeping.
#[derive(Debug)]
pub struct LoadedScene {
    pub assets: SceneAssets,
    pub graph: SceneGraph,
    /// True when the graph came from the cache file.
    pub from_cache: bool,
    pub cache_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct SceneLoader {
    options: LoadOptions,
}

impl SceneLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: LoadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Load meshes and scene graph for `path`.
    pub fn load(&self, path: &Path) -> Result<(SceneAssets, SceneGraph)> {
        let loaded = self.load_scene(path)?;
        Ok((loaded.assets, loaded.graph))
    }

    pub fn load_scene(&self, path: &Path) -> Result<LoadedScene> {
        let start = Instant::now();
        if !path.exists() {
            return Err(SceneError::NotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let asset = GltfAsset::open(path)?;

        let cache_path = if self.options.use_cache {
            match cache_fingerprint(path) {
                Ok(fp) => Some(cache_path_for(path, &fp, self.options.cache_dir.as_deref())),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Cannot fingerprint asset, cache disabled"
                    );
                    None
                }
            }
        } else {
            None
        };

        if let Some(cache) = cache_path.as_deref().filter(|p| p.exists()) {
            match graphml::read_graph(cache) {
                Ok(graph) => {
                    info!(
                        cache = %cache.display(),
                        nodes = graph.node_count(),
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Loaded scene graph from cache"
                    );
                    return Ok(LoadedScene {
                        assets: asset.assets,
                        graph,
                        from_cache: true,
                        cache_path,
                    });
                }
                Err(e) => {
                    warn!(cache = %cache.display(), error = %e, "Discarding unreadable cache");
                }
            }
        }

        let graph = build_graph(&asset)
            .with_context(|| format!("Failed to build scene graph for {}", path.display()))?;

        if let Some(cache) = cache_path.as_deref() {
            match write_cache(&graph, cache) {
                Ok(()) => debug!(cache = %cache.display(), "Wrote scene graph cache"),
                Err(e) => warn!(cache = %cache.display(), error = %e, "Failed to write cache"),
            }
        }

        info!(
            path = %path.display(),
            nodes = graph.node_count(),
            meshes = asset.assets.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Built scene graph"
        );
        Ok(LoadedScene {
            assets: asset.assets,
            graph,
            from_cache: false,
            cache_path,
        })
    }
}

/// First 8 hex chars of SHA-256 over `"<mtime_ns>_<size>"`.
pub fn cache_fingerprint(path: &Path) -> Result<String> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?;
    let mtime_ns = meta
        .modified()
        .with_context(|| format!("No modification time for {}", path.display()))?
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    let digest = Sha256::digest(format!("{mtime_ns}_{}", meta.len()).as_bytes());
    let mut fp = hex::encode(digest);
    fp.truncate(8);
    Ok(fp)
}

/// `<stem>.<fingerprint>.graphml`, beside the asset or inside `dir`.
pub fn cache_path_for(asset: &Path, fingerprint: &str, dir: Option<&Path>) -> PathBuf {
    let beside = asset.with_extension(format!("{fingerprint}.graphml"));
    match (dir, beside.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => beside,
    }
}

fn write_cache(graph: &SceneGraph, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    graphml::write_graph(graph, path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Scene graph for an imported asset: the `world` root, then every asset
/// node in depth-first order.
pub fn build_graph(asset: &GltfAsset) -> Result<SceneGraph, SceneError> {
    let mut graph = SceneGraph::new();
    graph.add_node(SceneNode::new(ROOT_ID))?;

    for source in &asset.nodes {
        let mut node = SceneNode::new(source.id.as_str());
        if let Some(geom) = &source.geometry {
            node.label = geom.clone();
            node.geom_name = Some(geom.clone());
        }
        node.matrix = Some(source.matrix);
        graph.add_node(node)?;
        graph.add_edge(source.parent.as_deref().unwrap_or(ROOT_ID), &source.id)?;
    }

    graph.refresh_organisation();
    Ok(graph)
}

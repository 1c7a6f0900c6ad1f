//! Tags scene graph nodes with a part type.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ClassifierConfig;
use crate::scene::{SceneAssets, SceneGraph};
use crate::shapes::DetectorRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichOptions {
    /// When false only the keyword rules run and no mesh is consulted.
    pub use_geometry: bool,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self { use_geometry: true }
    }
}

/// Counts from one enrichment pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichReport {
    /// A detector was accepted.
    pub classified: usize,
    /// No geometry reference, or the reference did not resolve.
    pub skipped: usize,
    /// Geometry present but no detector was accepted.
    pub unmatched: usize,
    pub elapsed_ms: u64,
}

/// Runs the detector registry over every node of a graph.
#[derive(Debug, Default)]
pub struct Enricher {
    registry: DetectorRegistry,
    options: EnrichOptions,
}

impl Enricher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::with_registry(DetectorRegistry::from_config(config))
    }

    pub fn with_registry(registry: DetectorRegistry) -> Self {
        Self {
            registry,
            options: EnrichOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EnrichOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &DetectorRegistry {
        &self.registry
    }

    /// Classify every node in insertion order.
    ///
    /// Nodes without a resolvable geometry reference keep whatever
    /// classification they already carry.
    pub fn enrich(&self, assets: &SceneAssets, graph: &mut SceneGraph) -> EnrichReport {
        let start = Instant::now();
        let mut report = EnrichReport::default();

        for node in graph.nodes_mut() {
            let Some(geom) = node.geom_name.as_deref() else {
                report.skipped += 1;
                continue;
            };

            let verdict = if self.options.use_geometry {
                let Some(mesh) = assets.get(geom) else {
                    debug!(node = %node.id, geometry = geom, "Geometry not found, skipping");
                    report.skipped += 1;
                    continue;
                };
                self.registry.resolve(mesh, node)
            } else {
                self.registry.resolve_by_name(node)
            };

            match verdict {
                Some(result) => {
                    debug!(
                        node = %node.id,
                        part_type = %result.label(),
                        confidence = result.confidence(),
                        rationale = result.rationale(),
                        "Classified"
                    );
                    node.part_type = result.label();
                    node.detection_rationale = Some(result.rationale().to_string());
                    report.classified += 1;
                }
                None => report.unmatched += 1,
            }
        }

        report.elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            classified = report.classified,
            skipped = report.skipped,
            unmatched = report.unmatched,
            elapsed_ms = report.elapsed_ms,
            "Enriched scene graph"
        );
        report
    }
}

/// Enrich with the stock detectors and geometry enabled.
pub fn enrich_graph(assets: &SceneAssets, graph: &mut SceneGraph) -> EnrichReport {
    Enricher::new().enrich(assets, graph)
}

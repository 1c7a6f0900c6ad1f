//! cadgraph-core - scene graphs and heuristic part classification for CAD
//! assets.
//!
//! A GLB/glTF file is turned into a [`SceneGraph`] under a `world` root,
//! each node carrying a local transform and an optional geometry
//! reference. The [`Enricher`] then runs an ordered list of
//! [`ShapeDetector`]s over every node with geometry and tags it with a
//! [`PartType`]:
//! - **Screw**: keyword match, else a slender round bounding box
//! - **Plate**: thin, elongated bounding box
//! - **Pipe**: round bounding box with a hollow interior
//! - **Nut**: keyword match, else a round cross-section
//! - **Wheel**: keyword match, else a disk-shaped bounding box
//!
//! The first detector that reports a confidence of at least
//! [`CONF_THRESHOLD`] wins. Tagged graphs are written as triples, node-link
//! JSON, gzipped JSON lines, GraphML or Cytoscape elements.
//!
//! # Example
//!
//! ```no_run
//! use cadgraph_core::{part_histogram, Enricher, SceneLoader};
//! use std::path::Path;
//!
//! let (assets, mut graph) = SceneLoader::new().load(Path::new("robot.glb")).unwrap();
//! let report = Enricher::new().enrich(&assets, &mut graph);
//! println!("classified {} nodes", report.classified);
//! for (part, count) in part_histogram(&graph) {
//!     println!("{part:<8} {count}");
//! }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod graph;
pub mod mesh;
pub mod scene;
pub mod shapes;

// Re-export commonly used types
pub use config::{CacheConfig, CadgraphConfig, ClassifierConfig, DetectorKind, ExportConfig};
pub use error::{GeometryError, GraphmlError, SceneError};
pub use export::{export, ExportFormat, ExportedFile};
pub use graph::{enrich_graph, neighborhood, part_histogram, EnrichOptions, EnrichReport, Enricher};
pub use mesh::TriMesh;
pub use scene::{LoadOptions, LoadedScene, SceneAssets, SceneGraph, SceneLoader, SceneNode, ROOT_ID};
pub use shapes::{DetectionResult, DetectorRegistry, PartType, ShapeDetector, CONF_THRESHOLD};

//! Error types for geometry, scene loading and GraphML interchange.

use std::path::PathBuf;

use thiserror::Error;

/// Faults raised by mesh metrics.
///
/// Detectors propagate these; the resolver treats any of them as the
/// detector abstaining for that node.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// The mesh has no vertices, so it has no bounding box.
    #[error("mesh has no vertices, bounding box is undefined")]
    NoBounds,

    /// A face points past the end of the vertex list.
    #[error("face {face} references missing vertex {vertex}")]
    BadIndex { face: usize, vertex: u32 },

    /// A measurement would divide by a zero-sized extent or volume.
    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}

/// Errors raised while loading an asset or building its scene graph.
#[derive(Debug, Error)]
pub enum SceneError {
    /// The asset file does not exist.
    #[error("asset not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// The glTF importer rejected the file.
    #[error("failed to import {}: {source}", .path.display())]
    Import {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    /// The asset declares no scene to walk.
    #[error("asset {} contains no scenes", .path.display())]
    NoScene { path: PathBuf },

    #[error("duplicate node id `{0}`")]
    DuplicateNode(String),

    #[error("unknown node id `{0}`")]
    UnknownNode(String),

    /// Adding the edge would make a node its own ancestor.
    #[error("edge `{parent}` -> `{child}` would create a cycle")]
    Cycle { parent: String, child: String },
}

/// Errors raised by the GraphML reader and writer.
#[derive(Debug, Error)]
pub enum GraphmlError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An element is missing an attribute GraphML requires.
    #[error("<{element}> is missing required attribute `{attribute}`")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    /// A `<data>` value does not parse as its declared key type.
    #[error("invalid value for `{key}` on node `{node}`: {message}")]
    InvalidValue {
        node: String,
        key: String,
        message: String,
    },

    #[error(transparent)]
    Graph(#[from] SceneError),
}

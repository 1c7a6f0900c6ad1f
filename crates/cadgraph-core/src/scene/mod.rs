//! Scene import: glTF assets, the scene graph model and its cached builder.

pub mod asset;
pub mod graph;
pub mod loader;

pub use asset::{AssetNode, GltfAsset, SceneAssets};
pub use graph::{Matrix4x4, SceneGraph, SceneNode, IDENTITY, ROOT_ID};
pub use loader::{
    build_graph, cache_fingerprint, cache_path_for, LoadOptions, LoadedScene, SceneLoader,
};

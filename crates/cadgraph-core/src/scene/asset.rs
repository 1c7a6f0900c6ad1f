//! GLB/glTF import: node hierarchy plus one triangle mesh per glTF mesh.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use gltf::mesh::Mode;
use nalgebra::Point3;
use tracing::{debug, warn};

use super::graph::{Matrix4x4, ROOT_ID};
use crate::error::SceneError;
use crate::mesh::TriMesh;

/// A node of the imported hierarchy, flattened.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetNode {
    /// Unique within the asset, never equal to [`ROOT_ID`].
    pub id: String,
    /// `None` for nodes directly under the scene.
    pub parent: Option<String>,
    /// Local transform, row-major.
    pub matrix: Matrix4x4,
    /// Key into [`SceneAssets`].
    pub geometry: Option<String>,
}

/// Geometry name to mesh lookup for one asset.
#[derive(Debug, Clone, Default)]
pub struct SceneAssets {
    meshes: HashMap<String, TriMesh>,
}

impl SceneAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, mesh: TriMesh) {
        self.meshes.insert(name.into(), mesh);
    }

    pub fn get(&self, name: &str) -> Option<&TriMesh> {
        self.meshes.get(name)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

/// An imported asset: nodes in depth-first order, parents first.
#[derive(Debug, Clone)]
pub struct GltfAsset {
    pub nodes: Vec<AssetNode>,
    pub assets: SceneAssets,
}

impl GltfAsset {
    /// Import a `.glb` or `.gltf` file.
    ///
    /// Walks the default scene, or the first one when no default is set.
    /// Each glTF node is visited once; repeated references are dropped.
    /// Primitives of a mesh are merged into one [`TriMesh`]; primitives
    /// that are not triangle lists are skipped.
    pub fn open(path: &Path) -> Result<Self, SceneError> {
        if !path.exists() {
            return Err(SceneError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let (document, buffers, _) = gltf::import(path).map_err(|source| SceneError::Import {
            path: path.to_path_buf(),
            source,
        })?;

        let mut geometry_names = UniqueNames::default();
        let mut mesh_keys = Vec::new();
        let mut assets = SceneAssets::new();
        for mesh in document.meshes() {
            let key = geometry_names.claim(
                &mesh
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("geometry_{}", mesh.index())),
            );
            match read_mesh(&mesh, &buffers) {
                Some(tri) => {
                    debug!(
                        geometry = %key,
                        vertices = tri.vertices().len(),
                        faces = tri.faces().len(),
                        "Read mesh"
                    );
                    assets.insert(key.clone(), tri);
                }
                None => warn!(geometry = %key, "Skipping malformed mesh"),
            }
            mesh_keys.push(key);
        }

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or_else(|| SceneError::NoScene {
                path: path.to_path_buf(),
            })?;

        let mut node_names = UniqueNames::default();
        node_names.reserve(ROOT_ID);
        let mut nodes = Vec::new();
        let mut visited = HashSet::new();
        let mut stack: Vec<(gltf::Node<'_>, Option<String>)> =
            scene.nodes().map(|n| (n, None)).collect();
        stack.reverse();

        while let Some((node, parent)) = stack.pop() {
            // a node listed under two parents, or under its own descendant
            if !visited.insert(node.index()) {
                warn!(
                    node = node.index(),
                    parent = parent.as_deref().unwrap_or(ROOT_ID),
                    "Skipping node reached twice in hierarchy"
                );
                continue;
            }
            let id = node_names.claim(
                &node
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("node_{}", node.index())),
            );
            let mut children: Vec<_> = node.children().map(|c| (c, Some(id.clone()))).collect();
            children.reverse();
            stack.extend(children);

            nodes.push(AssetNode {
                geometry: node.mesh().map(|m| mesh_keys[m.index()].clone()),
                matrix: row_major(node.transform().matrix()),
                parent,
                id,
            });
        }

        Ok(Self { nodes, assets })
    }
}

fn read_mesh(mesh: &gltf::Mesh<'_>, buffers: &[gltf::buffer::Data]) -> Option<TriMesh> {
    let mut vertices = Vec::new();
    let mut faces = Vec::new();

    for primitive in mesh.primitives() {
        if primitive.mode() != Mode::Triangles {
            continue;
        }
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));
        let Some(positions) = reader.read_positions() else {
            continue;
        };
        let base = vertices.len() as u32;
        vertices.extend(positions.map(|[x, y, z]| Point3::new(x as f64, y as f64, z as f64)));
        let count = vertices.len() as u32 - base;

        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..count).collect(),
        };
        faces.extend(
            indices
                .chunks_exact(3)
                .map(|t| [base + t[0], base + t[1], base + t[2]]),
        );
    }

    TriMesh::from_parts(vertices, faces).ok()
}

/// glTF stores matrices column-major.
fn row_major(columns: [[f32; 4]; 4]) -> Matrix4x4 {
    let mut rows = [[0.0; 4]; 4];
    for (c, column) in columns.iter().enumerate() {
        for (r, value) in column.iter().enumerate() {
            rows[r][c] = *value as f64;
        }
    }
    rows
}

/// Hands out names, suffixing `_<n>` on collisions.
#[derive(Default)]
struct UniqueNames {
    taken: HashSet<String>,
}

impl UniqueNames {
    fn reserve(&mut self, name: &str) {
        self.taken.insert(name.to_string());
    }

    fn claim(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_string()) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{base}_{n}"))
            .find(|candidate| self.taken.insert(candidate.clone()))
            .unwrap_or_else(|| base.to_string())
    }
}

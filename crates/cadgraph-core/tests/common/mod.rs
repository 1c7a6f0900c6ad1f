//! Writes small `.gltf` + `.bin` pairs for the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use cadgraph_core::TriMesh;
use serde_json::{json, Value};

pub struct MeshSpec {
    pub name: Option<&'static str>,
    pub mesh: TriMesh,
}

#[derive(Default)]
pub struct NodeSpec {
    pub name: Option<&'static str>,
    pub mesh: Option<usize>,
    pub children: Vec<usize>,
    pub translation: Option<[f32; 3]>,
}

impl NodeSpec {
    pub fn named(name: &'static str) -> Self {
        Self {
            name: Some(name),
            ..Self::default()
        }
    }

    pub fn with_mesh(mut self, mesh: usize) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_children(mut self, children: &[usize]) -> Self {
        self.children = children.to_vec();
        self
    }

    pub fn translated(mut self, t: [f32; 3]) -> Self {
        self.translation = Some(t);
        self
    }
}

/// Write `<dir>/<stem>.gltf` and `<dir>/<stem>.bin`; returns the `.gltf` path.
pub fn write_gltf(
    dir: &Path,
    stem: &str,
    meshes: &[MeshSpec],
    nodes: &[NodeSpec],
    roots: &[usize],
) -> PathBuf {
    let mut bin: Vec<u8> = Vec::new();
    let mut views = Vec::new();
    let mut accessors = Vec::new();
    let mut mesh_json = Vec::new();

    for spec in meshes {
        let verts = spec.mesh.vertices();
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        let offset = bin.len();
        for v in verts {
            for (axis, value) in [v.x, v.y, v.z].into_iter().enumerate() {
                let value = value as f32;
                min[axis] = min[axis].min(value);
                max[axis] = max[axis].max(value);
                bin.extend_from_slice(&value.to_le_bytes());
            }
        }
        views.push(json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": bin.len() - offset,
            "target": 34962,
        }));
        accessors.push(json!({
            "bufferView": views.len() - 1,
            "componentType": 5126,
            "count": verts.len(),
            "type": "VEC3",
            "min": min,
            "max": max,
        }));
        let position = accessors.len() - 1;

        let offset = bin.len();
        for face in spec.mesh.faces() {
            for index in face {
                bin.extend_from_slice(&index.to_le_bytes());
            }
        }
        views.push(json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": bin.len() - offset,
            "target": 34963,
        }));
        accessors.push(json!({
            "bufferView": views.len() - 1,
            "componentType": 5125,
            "count": spec.mesh.faces().len() * 3,
            "type": "SCALAR",
        }));
        let indices = accessors.len() - 1;

        let mut mesh = json!({
            "primitives": [{ "attributes": { "POSITION": position }, "indices": indices }],
        });
        if let Some(name) = spec.name {
            mesh["name"] = json!(name);
        }
        mesh_json.push(mesh);
    }

    let node_json: Vec<Value> = nodes
        .iter()
        .map(|spec| {
            let mut node = json!({});
            if let Some(name) = spec.name {
                node["name"] = json!(name);
            }
            if let Some(mesh) = spec.mesh {
                node["mesh"] = json!(mesh);
            }
            if !spec.children.is_empty() {
                node["children"] = json!(spec.children);
            }
            if let Some(t) = spec.translation {
                node["translation"] = json!(t);
            }
            node
        })
        .collect();

    let bin_name = format!("{stem}.bin");
    let doc = json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": roots }],
        "nodes": node_json,
        "meshes": mesh_json,
        "accessors": accessors,
        "bufferViews": views,
        "buffers": [{ "uri": bin_name, "byteLength": bin.len() }],
    });

    std::fs::write(dir.join(&bin_name), &bin).unwrap();
    let path = dir.join(format!("{stem}.gltf"));
    std::fs::write(&path, serde_json::to_vec_pretty(&doc).unwrap()).unwrap();
    path
}

/// `Assembly` holding `Bolt_01` (a unit cube) and `Body` (a 0.05 x 5 x 1
/// slab shifted 2 along y).
pub fn bolt_and_body(dir: &Path) -> PathBuf {
    write_gltf(
        dir,
        "assembly",
        &[
            MeshSpec {
                name: Some("Bolt_01"),
                mesh: TriMesh::cuboid(1.0, 1.0, 1.0),
            },
            MeshSpec {
                name: Some("Body"),
                mesh: TriMesh::cuboid(0.05, 5.0, 1.0),
            },
        ],
        &[
            NodeSpec::named("Assembly").with_children(&[1, 2]),
            NodeSpec::named("Bolt_01").with_mesh(0),
            NodeSpec::named("Body").with_mesh(1).translated([0.0, 2.0, 0.5]),
        ],
        &[0],
    )
}

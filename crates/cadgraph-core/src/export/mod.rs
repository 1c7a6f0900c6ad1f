//! Serializers for tagged scene graphs.

pub mod cytoscape;
pub mod graphml;
pub mod jsonl;
pub mod node_link;
pub mod triples;

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::scene::SceneGraph;

pub use cytoscape::to_cytoscape;
pub use graphml::{read_graph, read_graphml, write_graph, write_graphml};
pub use jsonl::write_jsonl_gz;
pub use node_link::to_node_link;
pub use triples::write_triples;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Triples,
    NodeLink,
    Jsonl,
    Graphml,
    Cytoscape,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Triples,
        ExportFormat::NodeLink,
        ExportFormat::Jsonl,
        ExportFormat::Graphml,
        ExportFormat::Cytoscape,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Triples => "triples",
            ExportFormat::NodeLink => "node_link",
            ExportFormat::Jsonl => "jsonl",
            ExportFormat::Graphml => "graphml",
            ExportFormat::Cytoscape => "cytoscape",
        }
    }

    /// Output file name inside the export directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportFormat::Triples => "scene.triples",
            ExportFormat::NodeLink => "scene.node_link.json",
            ExportFormat::Jsonl => "scene.nodes.jsonl.gz",
            ExportFormat::Graphml => "scene.graphml",
            ExportFormat::Cytoscape => "scene.cytoscape.json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        ExportFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<_> = ExportFormat::ALL.iter().map(|f| f.as_str()).collect();
                format!("unknown format `{s}` (expected one of: {})", known.join(", "))
            })
    }
}

/// A file written by [`export`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedFile {
    pub format: ExportFormat,
    pub path: PathBuf,
    pub bytes: u64,
}

/// Write `graph` into `out_dir` once per requested format, in the order
/// given. Creates `out_dir` if needed.
pub fn export(
    graph: &SceneGraph,
    out_dir: &Path,
    formats: &[ExportFormat],
) -> Result<Vec<ExportedFile>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let mut written = Vec::with_capacity(formats.len());
    for &format in formats {
        let path = out_dir.join(format.file_name());
        write_format(graph, format, &path)
            .with_context(|| format!("Failed to write {} to {}", format, path.display()))?;
        let bytes = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        info!(format = %format, path = %path.display(), bytes, "Exported");
        written.push(ExportedFile {
            format,
            path,
            bytes,
        });
    }
    Ok(written)
}

fn write_format(graph: &SceneGraph, format: ExportFormat, path: &Path) -> Result<()> {
    match format {
        ExportFormat::Graphml => write_graph(graph, path)?,
        ExportFormat::Triples => write_buffered(path, |out| Ok(write_triples(graph, out)?))?,
        ExportFormat::NodeLink => {
            write_buffered(path, |out| Ok(serde_json::to_writer(out, &to_node_link(graph))?))?
        }
        ExportFormat::Jsonl => write_buffered(path, |out| Ok(write_jsonl_gz(graph, out)?))?,
        ExportFormat::Cytoscape => write_buffered(path, |out| {
            Ok(serde_json::to_writer_pretty(out, &to_cytoscape(graph))?)
        })?,
    }
    Ok(())
}

fn write_buffered(
    path: &Path,
    body: impl FnOnce(&mut BufWriter<File>) -> Result<()>,
) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    body(&mut out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SceneNode, ROOT_ID};
    use tempfile::TempDir;

    #[test]
    fn parses_format_names() {
        assert_eq!("node-link".parse::<ExportFormat>().unwrap(), ExportFormat::NodeLink);
        assert_eq!("GraphML".parse::<ExportFormat>().unwrap(), ExportFormat::Graphml);
        let err = "dot".parse::<ExportFormat>().unwrap_err();
        assert!(err.contains("triples"));
    }

    #[test]
    fn writes_each_requested_format() {
        let mut graph = SceneGraph::new();
        graph.add_node(SceneNode::new(ROOT_ID)).unwrap();
        graph.add_node(SceneNode::new("part")).unwrap();
        graph.add_edge(ROOT_ID, "part").unwrap();

        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nested/out");
        let files = export(&graph, &out, &ExportFormat::ALL).unwrap();

        assert_eq!(files.len(), 5);
        for file in &files {
            assert!(file.path.exists(), "{}", file.path.display());
            assert!(file.bytes > 0);
        }
        let restored = read_graph(&out.join("scene.graphml")).unwrap();
        assert_eq!(restored.node_count(), 2);
    }
}

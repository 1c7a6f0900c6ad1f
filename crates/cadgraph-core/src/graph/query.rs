//! Read-only queries: part histogram and label search.

use std::collections::{BTreeMap, HashSet};

use crate::scene::SceneGraph;
use crate::shapes::PartType;

/// Count of nodes per part type. Types with no nodes are absent.
pub fn part_histogram(graph: &SceneGraph) -> BTreeMap<PartType, usize> {
    let mut histogram = BTreeMap::new();
    for node in graph.nodes() {
        *histogram.entry(node.part_type).or_insert(0) += 1;
    }
    histogram
}

/// Subgraph of nodes whose label contains `query` (case-insensitive),
/// together with their direct parents and children and the edges among
/// all of them. A blank query returns the whole graph.
pub fn neighborhood(graph: &SceneGraph, query: &str) -> SceneGraph {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return graph.clone();
    }

    let mut keep = HashSet::new();
    for node in graph.nodes() {
        if node.label.to_lowercase().contains(&needle) {
            keep.insert(node.id.as_str());
            keep.extend(graph.children(&node.id).into_iter().map(|n| n.id.as_str()));
            keep.extend(graph.parents(&node.id).into_iter().map(|n| n.id.as_str()));
        }
    }
    graph.subgraph(|node| keep.contains(node.id.as_str()))
}

//! The scene graph: a transform hierarchy of [`SceneNode`]s.

use std::collections::HashMap;

use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde_json::{Map, Value};

use crate::error::{GraphmlError, SceneError};
use crate::shapes::PartType;

/// Row-major 4x4 transform.
pub type Matrix4x4 = [[f64; 4]; 4];

/// Id of the scene root every asset node hangs under.
pub const ROOT_ID: &str = "world";

pub const IDENTITY: Matrix4x4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// One node of the scene hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: String,
    /// Display name; the geometry name when the node references one.
    pub label: String,
    pub geom_name: Option<String>,
    /// Local transform relative to the parent.
    pub matrix: Option<Matrix4x4>,
    pub part_type: PartType,
    /// Set only when a detector was accepted.
    pub detection_rationale: Option<String>,
    /// True when the node has at least one child.
    pub has_children: bool,
}

impl SceneNode {
    /// A bare node labelled with its own id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            geom_name: None,
            matrix: None,
            part_type: PartType::Unknown,
            detection_rationale: None,
            has_children: false,
        }
    }

    /// Attribute map as written to the interchange formats. The id is not
    /// included; optional attributes are omitted when unset.
    pub fn attributes(&self) -> Map<String, Value> {
        let mut attrs = Map::new();
        attrs.insert("label".into(), Value::from(self.label.as_str()));
        if let Some(geom) = &self.geom_name {
            attrs.insert("geom_name".into(), Value::from(geom.as_str()));
        }
        if let Some(matrix) = &self.matrix {
            let rows = matrix
                .iter()
                .map(|row| Value::from(row.to_vec()))
                .collect::<Vec<_>>();
            attrs.insert("matrix".into(), Value::Array(rows));
        }
        attrs.insert("part_type".into(), Value::from(self.part_type.as_str()));
        if let Some(rationale) = &self.detection_rationale {
            attrs.insert("detection_rationale".into(), Value::from(rationale.as_str()));
        }
        attrs.insert("has_children".into(), Value::Bool(self.has_children));
        attrs
    }

    /// Rebuild a node from an attribute map.
    ///
    /// Accepts matrices as nested arrays or as JSON-encoded strings, and
    /// booleans as `true`/`false` strings. Unknown attributes are ignored.
    pub fn from_attributes(
        id: impl Into<String>,
        attrs: &Map<String, Value>,
    ) -> Result<Self, GraphmlError> {
        let id: String = id.into();
        let invalid = |key: &str, message: String| GraphmlError::InvalidValue {
            node: id.clone(),
            key: key.to_string(),
            message,
        };
        let mut node = SceneNode::new(id.clone());

        if let Some(label) = attrs.get("label").and_then(Value::as_str) {
            node.label = label.to_string();
        }
        node.geom_name = attrs
            .get("geom_name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        node.matrix = match attrs.get("matrix") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(Value::String(s)) => {
                Some(serde_json::from_str(s).map_err(|e| invalid("matrix", e.to_string()))?)
            }
            Some(value) => Some(
                serde_json::from_value(value.clone())
                    .map_err(|e| invalid("matrix", e.to_string()))?,
            ),
        };
        if let Some(part) = attrs.get("part_type").and_then(Value::as_str) {
            node.part_type = part.parse().map_err(|e| invalid("part_type", e))?;
        }
        node.detection_rationale = attrs
            .get("detection_rationale")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        node.has_children = match attrs.get("has_children") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        };
        Ok(node)
    }
}

/// Directed acyclic transform hierarchy; an edge reads "parent contains
/// child". Nodes iterate in insertion order.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    graph: DiGraph<SceneNode, ()>,
    index: HashMap<String, NodeIndex>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: SceneNode) -> Result<(), SceneError> {
        if self.index.contains_key(&node.id) {
            return Err(SceneError::DuplicateNode(node.id));
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(id, idx);
        Ok(())
    }

    /// Link `parent` to `child`. Re-adding an existing edge is a no-op.
    pub fn add_edge(&mut self, parent: &str, child: &str) -> Result<(), SceneError> {
        let from = self.lookup(parent)?;
        let to = self.lookup(child)?;
        if from == to || has_path_connecting(&self.graph, to, from, None) {
            return Err(SceneError::Cycle {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }
        self.graph.update_edge(from, to, ());
        self.graph[from].has_children = true;
        Ok(())
    }

    fn lookup(&self, id: &str) -> Result<NodeIndex, SceneError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| SceneError::UnknownNode(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&SceneNode> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut SceneNode> {
        let idx = *self.index.get(id)?;
        Some(&mut self.graph[idx])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode> {
        self.graph.node_weights()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut SceneNode> {
        self.graph.node_weights_mut()
    }

    /// `(parent, child)` id pairs in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.graph.edge_references().map(|e| {
            (
                self.graph[e.source()].id.as_str(),
                self.graph[e.target()].id.as_str(),
            )
        })
    }

    pub fn children(&self, id: &str) -> Vec<&SceneNode> {
        self.neighbors(id, Direction::Outgoing)
    }

    pub fn parents(&self, id: &str) -> Vec<&SceneNode> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: &str, dir: Direction) -> Vec<&SceneNode> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut found: Vec<NodeIndex> = self.graph.neighbors_directed(idx, dir).collect();
        found.sort();
        found.into_iter().map(|n| &self.graph[n]).collect()
    }

    pub fn out_degree(&self, id: &str) -> usize {
        self.index
            .get(id)
            .map(|&idx| self.graph.neighbors_directed(idx, Direction::Outgoing).count())
            .unwrap_or(0)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Induced subgraph over the nodes `keep` accepts. Node attributes,
    /// including `has_children`, are copied unchanged.
    pub fn subgraph(&self, mut keep: impl FnMut(&SceneNode) -> bool) -> SceneGraph {
        let graph = self
            .graph
            .filter_map(|_, node| keep(node).then(|| node.clone()), |_, _| Some(()));
        let index = graph
            .node_indices()
            .map(|idx| (graph[idx].id.clone(), idx))
            .collect();
        Self { graph, index }
    }

    /// Recompute `has_children` from the current edges.
    pub fn refresh_organisation(&mut self) {
        for idx in self.graph.node_indices() {
            let has_out = self
                .graph
                .neighbors_directed(idx, Direction::Outgoing)
                .next()
                .is_some();
            self.graph[idx].has_children = has_out;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> SceneGraph {
        let mut graph = SceneGraph::new();
        for id in [ROOT_ID, "frame", "bolt", "nut"] {
            graph.add_node(SceneNode::new(id)).unwrap();
        }
        graph.add_edge(ROOT_ID, "frame").unwrap();
        graph.add_edge("frame", "bolt").unwrap();
        graph.add_edge("frame", "nut").unwrap();
        graph
    }

    #[test]
    fn nodes_keep_insertion_order() {
        let graph = chain();
        let ids: Vec<_> = graph.nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, [ROOT_ID, "frame", "bolt", "nut"]);
        let edges: Vec<_> = graph.edges().collect();
        assert_eq!(
            edges,
            [(ROOT_ID, "frame"), ("frame", "bolt"), ("frame", "nut")]
        );
    }

    #[test]
    fn children_are_ordered_and_flagged() {
        let graph = chain();
        let children: Vec<_> = graph.children("frame").iter().map(|n| n.id.clone()).collect();
        assert_eq!(children, ["bolt", "nut"]);
        assert_eq!(graph.parents("nut")[0].id, "frame");
        assert!(graph.node("frame").unwrap().has_children);
        assert!(!graph.node("bolt").unwrap().has_children);
        assert_eq!(graph.out_degree("frame"), 2);
        assert!(graph.children("missing").is_empty());
    }

    #[test]
    fn rejects_cycles_and_self_loops() {
        let mut graph = chain();
        assert!(matches!(
            graph.add_edge("nut", ROOT_ID),
            Err(SceneError::Cycle { .. })
        ));
        assert!(matches!(
            graph.add_edge("bolt", "bolt"),
            Err(SceneError::Cycle { .. })
        ));
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn rejects_duplicates_and_unknown_ids() {
        let mut graph = chain();
        assert!(matches!(
            graph.add_node(SceneNode::new("bolt")),
            Err(SceneError::DuplicateNode(_))
        ));
        assert!(matches!(
            graph.add_edge("frame", "washer"),
            Err(SceneError::UnknownNode(_))
        ));
        // repeated edge collapses onto the existing one
        graph.add_edge("frame", "bolt").unwrap();
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn refresh_recomputes_flags() {
        let mut graph = chain();
        for node in graph.nodes_mut() {
            node.has_children = true;
        }
        graph.refresh_organisation();
        let flagged: Vec<_> = graph
            .nodes()
            .filter(|n| n.has_children)
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(flagged, [ROOT_ID, "frame"]);
    }

    #[test]
    fn attributes_roundtrip() {
        let mut node = SceneNode::new("node_4");
        node.label = "Bolt_01".into();
        node.geom_name = Some("Bolt_01".into());
        let mut matrix = IDENTITY;
        matrix[0][3] = 12.5;
        node.matrix = Some(matrix);
        node.part_type = PartType::Screw;
        node.detection_rationale = Some("keyword match".into());

        let attrs = node.attributes();
        assert_eq!(attrs["part_type"], "SCREW");
        assert!(!attrs.contains_key("id"));
        assert_eq!(SceneNode::from_attributes("node_4", &attrs).unwrap(), node);
    }

    #[test]
    fn from_attributes_decodes_strings() {
        let mut attrs = Map::new();
        attrs.insert(
            "matrix".into(),
            Value::from(serde_json::to_string(&IDENTITY).unwrap()),
        );
        attrs.insert("geom_name".into(), Value::from(""));
        attrs.insert("has_children".into(), Value::from("True"));

        let node = SceneNode::from_attributes("frame", &attrs).unwrap();
        assert_eq!(node.label, "frame");
        assert_eq!(node.matrix, Some(IDENTITY));
        assert_eq!(node.geom_name, None);
        assert!(node.has_children);
        assert_eq!(node.part_type, PartType::Unknown);

        attrs.insert("part_type".into(), Value::from("GEAR"));
        match SceneNode::from_attributes("frame", &attrs) {
            Err(GraphmlError::InvalidValue { node, key, .. }) => {
                assert_eq!(node, "frame");
                assert_eq!(key, "part_type");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn from_attributes_names_the_bad_matrix_key() {
        let mut attrs = Map::new();
        attrs.insert("matrix".into(), Value::from("[[1, 0], [0, 1]]"));
        assert!(matches!(
            SceneNode::from_attributes("frame", &attrs),
            Err(GraphmlError::InvalidValue { key, .. }) if key == "matrix"
        ));
    }
}

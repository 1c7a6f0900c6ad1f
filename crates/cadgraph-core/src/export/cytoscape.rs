//! Cytoscape.js elements: nodes classed by lower-case part type, then edges.

use serde_json::{json, Value};

use crate::scene::SceneGraph;

pub fn to_cytoscape(graph: &SceneGraph) -> Value {
    let nodes = graph.nodes().map(|node| {
        json!({
            "data": { "id": node.id, "label": node.label },
            "classes": node.part_type.as_str().to_lowercase(),
        })
    });
    let edges = graph
        .edges()
        .map(|(source, target)| json!({ "data": { "source": source, "target": target } }));
    Value::Array(nodes.chain(edges).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SceneNode, ROOT_ID};
    use crate::shapes::PartType;

    #[test]
    fn nodes_precede_edges() {
        let mut graph = SceneGraph::new();
        graph.add_node(SceneNode::new(ROOT_ID)).unwrap();
        let mut plate = SceneNode::new("node_2");
        plate.label = "Body".into();
        plate.part_type = PartType::Plate;
        graph.add_node(plate).unwrap();
        graph.add_edge(ROOT_ID, "node_2").unwrap();

        let elements = to_cytoscape(&graph);
        assert_eq!(elements.as_array().unwrap().len(), 3);
        assert_eq!(elements[1]["data"]["label"], "Body");
        assert_eq!(elements[1]["classes"], "plate");
        assert_eq!(elements[2]["data"]["target"], "node_2");
    }
}

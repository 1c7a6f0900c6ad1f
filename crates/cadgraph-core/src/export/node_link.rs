//! Node-link JSON, the layout most graph libraries import directly.

use serde_json::{json, Map, Value};

use crate::scene::SceneGraph;

pub fn to_node_link(graph: &SceneGraph) -> Value {
    let nodes: Vec<Value> = graph
        .nodes()
        .map(|node| {
            let mut record = Map::new();
            record.insert("id".into(), Value::from(node.id.as_str()));
            record.extend(node.attributes());
            Value::Object(record)
        })
        .collect();
    let links: Vec<Value> = graph
        .edges()
        .map(|(source, target)| json!({ "source": source, "target": target }))
        .collect();

    json!({
        "directed": true,
        "multigraph": false,
        "graph": {},
        "nodes": nodes,
        "links": links,
    })
}

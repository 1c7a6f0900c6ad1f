//! Gzip-compressed JSON lines, one record per node.

use std::io::{self, Write};

use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{Map, Value};

use crate::scene::SceneGraph;

/// `{"id", ..attributes, "children": [..]}` per line, gzip compressed.
pub fn write_jsonl_gz<W: Write>(graph: &SceneGraph, out: W) -> io::Result<()> {
    let mut encoder = GzEncoder::new(out, Compression::default());
    for node in graph.nodes() {
        let mut record = Map::new();
        record.insert("id".into(), Value::from(node.id.as_str()));
        record.extend(node.attributes());
        let children: Vec<Value> = graph
            .children(&node.id)
            .into_iter()
            .map(|c| Value::from(c.id.as_str()))
            .collect();
        record.insert("children".into(), Value::Array(children));

        serde_json::to_writer(&mut encoder, &Value::Object(record))?;
        encoder.write_all(b"\n")?;
    }
    encoder.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SceneNode, ROOT_ID};
    use flate2::read::GzDecoder;
    use std::io::{BufRead, BufReader};

    #[test]
    fn one_record_per_node() {
        let mut graph = SceneGraph::new();
        for id in [ROOT_ID, "a", "b"] {
            graph.add_node(SceneNode::new(id)).unwrap();
        }
        graph.add_edge(ROOT_ID, "a").unwrap();
        graph.add_edge(ROOT_ID, "b").unwrap();

        let mut compressed = Vec::new();
        write_jsonl_gz(&graph, &mut compressed).unwrap();

        let records: Vec<Value> = BufReader::new(GzDecoder::new(&compressed[..]))
            .lines()
            .map(|line| serde_json::from_str(&line.unwrap()).unwrap())
            .collect();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["id"], ROOT_ID);
        assert_eq!(records[0]["children"], serde_json::json!(["a", "b"]));
        assert_eq!(records[2]["children"], serde_json::json!([]));
    }
}

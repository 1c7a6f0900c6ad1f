//! GraphML reader and writer.
//!
//! GraphML only carries scalar attributes, so arrays and objects (the
//! transform matrix) are written as JSON text and decoded again on read.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{Map, Value};

use crate::error::GraphmlError;
use crate::scene::{SceneGraph, SceneNode};

const GRAPHML_NS: &str = "http://graphml.graphdrawing.org/xmlns";

/// Declared type of a GraphML attribute key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyType {
    Boolean,
    Long,
    Double,
    String,
}

impl KeyType {
    fn as_str(self) -> &'static str {
        match self {
            KeyType::Boolean => "boolean",
            KeyType::Long => "long",
            KeyType::Double => "double",
            KeyType::String => "string",
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            "boolean" => KeyType::Boolean,
            "int" | "long" => KeyType::Long,
            "float" | "double" => KeyType::Double,
            _ => KeyType::String,
        }
    }

    fn of(value: &Value) -> Self {
        match value {
            Value::Bool(_) => KeyType::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => KeyType::Long,
            Value::Number(_) => KeyType::Double,
            _ => KeyType::String,
        }
    }

    /// Narrowest type that holds both.
    fn widen(self, other: KeyType) -> Self {
        match (self, other) {
            (a, b) if a == b => a,
            (KeyType::Long, KeyType::Double) | (KeyType::Double, KeyType::Long) => KeyType::Double,
            _ => KeyType::String,
        }
    }
}

/// Text form of an attribute value.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Write `graph` as GraphML to `path`.
pub fn write_graph(graph: &SceneGraph, path: &Path) -> Result<(), GraphmlError> {
    let mut out = BufWriter::new(File::create(path)?);
    write_graphml(graph, &mut out)?;
    out.flush()?;
    Ok(())
}

pub fn write_graphml<W: Write>(graph: &SceneGraph, out: W) -> Result<(), GraphmlError> {
    let rows: Vec<(&str, Map<String, Value>)> = graph
        .nodes()
        .map(|n| (n.id.as_str(), n.attributes()))
        .collect();

    // keys in first-seen order, typed by every value they take
    let mut keys: Vec<(String, KeyType)> = Vec::new();
    for (_, attrs) in &rows {
        for (name, value) in attrs {
            let kind = KeyType::of(value);
            match keys.iter_mut().find(|(k, _)| k == name) {
                Some((_, existing)) => *existing = existing.widen(kind),
                None => keys.push((name.clone(), kind)),
            }
        }
    }
    let key_ids: HashMap<&str, String> = keys
        .iter()
        .enumerate()
        .map(|(i, (name, _))| (name.as_str(), format!("d{i}")))
        .collect();

    let mut writer = Writer::new_with_indent(out, b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("graphml");
    root.push_attribute(("xmlns", GRAPHML_NS));
    writer.write_event(Event::Start(root))?;

    for (name, kind) in &keys {
        let mut key = BytesStart::new("key");
        key.push_attribute(("id", key_ids[name.as_str()].as_str()));
        key.push_attribute(("for", "node"));
        key.push_attribute(("attr.name", name.as_str()));
        key.push_attribute(("attr.type", kind.as_str()));
        writer.write_event(Event::Empty(key))?;
    }

    let mut graph_el = BytesStart::new("graph");
    graph_el.push_attribute(("edgedefault", "directed"));
    writer.write_event(Event::Start(graph_el))?;

    for (id, attrs) in &rows {
        let mut node = BytesStart::new("node");
        node.push_attribute(("id", *id));
        writer.write_event(Event::Start(node))?;
        for (name, value) in attrs {
            let mut data = BytesStart::new("data");
            data.push_attribute(("key", key_ids[name.as_str()].as_str()));
            writer.write_event(Event::Start(data))?;
            writer.write_event(Event::Text(BytesText::new(&scalar_text(value))))?;
            writer.write_event(Event::End(BytesEnd::new("data")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("node")))?;
    }

    for (source, target) in graph.edges() {
        let mut edge = BytesStart::new("edge");
        edge.push_attribute(("source", source));
        edge.push_attribute(("target", target));
        writer.write_event(Event::Empty(edge))?;
    }

    writer.write_event(Event::End(BytesEnd::new("graph")))?;
    writer.write_event(Event::End(BytesEnd::new("graphml")))?;
    Ok(())
}

/// Read a GraphML file into a scene graph.
///
/// Fails on malformed XML, undecodable attribute values, duplicate node ids
/// and edges that would close a cycle.
pub fn read_graph(path: &Path) -> Result<SceneGraph, GraphmlError> {
    read_graphml(BufReader::new(File::open(path)?))
}

pub fn read_graphml<R: BufRead>(input: R) -> Result<SceneGraph, GraphmlError> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();

    let mut keys: HashMap<String, (String, KeyType)> = HashMap::new();
    let mut nodes: Vec<(String, Map<String, Value>)> = Vec::new();
    let mut edges: Vec<(String, String)> = Vec::new();

    let mut current: Option<(String, Map<String, Value>)> = None;
    let mut data_key: Option<String> = None;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"key" => register_key(e, &mut keys)?,
                b"node" => current = Some((required(e, "node", "id")?, Map::new())),
                b"data" => {
                    data_key = Some(required(e, "data", "key")?);
                    text.clear();
                }
                b"edge" => edges.push(edge_ends(e)?),
                _ => {}
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"key" => register_key(e, &mut keys)?,
                b"node" => nodes.push((required(e, "node", "id")?, Map::new())),
                b"edge" => edges.push(edge_ends(e)?),
                _ => {}
            },
            Event::Text(ref t) if data_key.is_some() => {
                text.push_str(&t.unescape()?);
            }
            Event::CData(t) if data_key.is_some() => {
                text.push_str(&String::from_utf8_lossy(&t.into_inner()));
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"data" => {
                    let target = current.as_mut();
                    if let (Some(key), Some((node_id, attrs))) = (data_key.take(), target) {
                        let (name, kind) = keys
                            .get(&key)
                            .cloned()
                            .unwrap_or_else(|| (key.clone(), KeyType::String));
                        let value = typed_value(&text, kind).map_err(|message| {
                            GraphmlError::InvalidValue {
                                node: node_id.clone(),
                                key: name.clone(),
                                message,
                            }
                        })?;
                        attrs.insert(name, value);
                    }
                }
                b"node" => {
                    if let Some(node) = current.take() {
                        nodes.push(node);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let mut graph = SceneGraph::new();
    for (id, attrs) in nodes {
        graph.add_node(SceneNode::from_attributes(id, &attrs)?)?;
    }
    for (source, target) in edges {
        graph.add_edge(&source, &target)?;
    }
    graph.refresh_organisation();
    Ok(graph)
}

fn required(
    e: &BytesStart<'_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<String, GraphmlError> {
    match e
        .try_get_attribute(attribute)
        .map_err(quick_xml::Error::from)?
    {
        Some(attr) => Ok(attr.unescape_value()?.into_owned()),
        None => Err(GraphmlError::MissingAttribute { element, attribute }),
    }
}

fn register_key(
    e: &BytesStart<'_>,
    keys: &mut HashMap<String, (String, KeyType)>,
) -> Result<(), GraphmlError> {
    let id = required(e, "key", "id")?;
    // keys for edges or the graph itself carry nothing we store
    if let Some(scope) = e.try_get_attribute("for").map_err(quick_xml::Error::from)? {
        if scope.unescape_value()? != "node" {
            return Ok(());
        }
    }
    let name = required(e, "key", "attr.name")?;
    let kind = match e.try_get_attribute("attr.type").map_err(quick_xml::Error::from)? {
        Some(attr) => KeyType::parse(&attr.unescape_value()?),
        None => KeyType::String,
    };
    keys.insert(id, (name, kind));
    Ok(())
}

fn edge_ends(e: &BytesStart<'_>) -> Result<(String, String), GraphmlError> {
    Ok((required(e, "edge", "source")?, required(e, "edge", "target")?))
}

fn typed_value(text: &str, kind: KeyType) -> Result<Value, String> {
    let trimmed = text.trim();
    match kind {
        KeyType::String => Ok(Value::String(text.to_string())),
        KeyType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(format!("`{trimmed}` is not a boolean")),
        },
        KeyType::Long => trimmed
            .parse::<i64>()
            .map(Value::from)
            .map_err(|e| format!("`{trimmed}`: {e}")),
        KeyType::Double => trimmed
            .parse::<f64>()
            .map(Value::from)
            .map_err(|e| format!("`{trimmed}`: {e}")),
    }
}

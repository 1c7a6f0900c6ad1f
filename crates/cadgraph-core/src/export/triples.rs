//! Line-oriented `subject predicate object` triples.

use std::io::{self, Write};

use crate::scene::SceneGraph;

/// One `parent_of` line per edge, then per node its `part_type` and, for
/// nodes with children, `has_children true`.
pub fn write_triples<W: Write>(graph: &SceneGraph, mut out: W) -> io::Result<()> {
    for (parent, child) in graph.edges() {
        writeln!(out, "{parent} parent_of {child}")?;
    }
    for node in graph.nodes() {
        writeln!(out, "{} part_type {}", node.id, node.part_type)?;
        if node.has_children {
            writeln!(out, "{} has_children true", node.id)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SceneNode, ROOT_ID};
    use crate::shapes::PartType;

    #[test]
    fn edges_first_then_node_facts() {
        let mut graph = SceneGraph::new();
        graph.add_node(SceneNode::new(ROOT_ID)).unwrap();
        let mut bolt = SceneNode::new("bolt");
        bolt.part_type = PartType::Screw;
        graph.add_node(bolt).unwrap();
        graph.add_edge(ROOT_ID, "bolt").unwrap();

        let mut out = Vec::new();
        write_triples(&graph, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "world parent_of bolt\n\
             world part_type UNKNOWN\n\
             world has_children true\n\
             bolt part_type SCREW\n"
        );
    }
}

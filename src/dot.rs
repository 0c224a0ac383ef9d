//! Graphviz DOT output for a [`GraphIR`]. Layout is left to Graphviz.

use std::fmt;

use crate::ir::{Edge, GraphIR, Node, NodeShape, RankDir};

/// Renders as a `digraph` via [`fmt::Display`].
pub struct Dot<'a> {
    ir: &'a GraphIR,
    name: &'a str,
}

impl<'a> Dot<'a> {
    pub fn new(ir: &'a GraphIR) -> Self {
        Self { ir, name: "erd" }
    }

    pub fn named(ir: &'a GraphIR, name: &'a str) -> Self {
        Self { ir, name }
    }
}

impl fmt::Display for Dot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph {} {{", quote(self.name))?;
        let rankdir = match self.ir.direction {
            RankDir::LeftRight => "LR",
            RankDir::TopBottom => "TB",
        };
        writeln!(f, "    rankdir={};", rankdir)?;

        for node in &self.ir.nodes {
            write_node(f, node)?;
        }
        for edge in &self.ir.edges {
            write_edge(f, edge)?;
        }

        writeln!(f, "}}")
    }
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &Node) -> fmt::Result {
    let shape = match node.shape {
        NodeShape::Box => "box",
    };
    writeln!(
        f,
        "    {} [label={}, shape={}];",
        quote(&node.id),
        quote(&node.label),
        shape
    )
}

fn write_edge(f: &mut fmt::Formatter<'_>, edge: &Edge) -> fmt::Result {
    write!(f, "    {} -> {}", quote(&edge.from), quote(&edge.to))?;
    if let Some(label) = &edge.label {
        write!(f, " [label={}]", quote(label))?;
    }
    writeln!(f, ";")
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

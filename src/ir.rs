use crate::infer::Relationship;

pub const JOINS_LABEL: &str = "joins";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankDir {
    #[default]
    LeftRight,
    TopBottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeShape {
    #[default]
    Box,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphIR {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub direction: RankDir,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub shape: NodeShape,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
}

impl GraphIR {
    pub fn with_direction(mut self, direction: RankDir) -> Self {
        self.direction = direction;
        self
    }

    /// Anchor table with a `joins` edge to each joinable table. Empty when
    /// there is nothing to join; callers skip rendering in that case.
    pub fn joinable_tables<S: AsRef<str>>(anchor: &str, joinable_tables: &[S]) -> Self {
        let mut ir = GraphIR::default();
        if joinable_tables.is_empty() {
            return ir;
        }

        ir.add_node(anchor);
        for table in joinable_tables {
            let table = table.as_ref();
            ir.add_node(table);
            ir.add_edge(anchor, table, Some(JOINS_LABEL.to_string()));
        }
        ir
    }

    /// Seed relationship plus one hop of relationships leaving its target.
    /// Entries of `downstream` that do not start at the seed's target are
    /// ignored.
    pub fn relationship<'r>(
        relationship: &Relationship,
        downstream: impl IntoIterator<Item = &'r Relationship>,
    ) -> Self {
        let mut ir = GraphIR::default();
        let hub = relationship.to_table.as_str();

        ir.add_node(&relationship.from_table);
        ir.add_node(hub);
        ir.add_edge(
            &relationship.from_table,
            hub,
            Some(relationship.column_label()),
        );

        for next in downstream.into_iter().filter(|r| r.from_table == hub) {
            ir.add_node(&next.to_table);
            ir.add_edge(hub, &next.to_table, Some(next.column_label()));
        }
        ir
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn add_node(&mut self, id: &str) {
        if self.nodes.iter().any(|n| n.id == id) {
            return;
        }
        self.nodes.push(Node {
            id: id.to_string(),
            label: id.to_string(),
            shape: NodeShape::Box,
        });
    }

    fn add_edge(&mut self, from: &str, to: &str, label: Option<String>) {
        let edge = Edge {
            from: from.to_string(),
            to: to.to_string(),
            label,
        };
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
    }
}

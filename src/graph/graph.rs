//! Signal-flow graph structure.

use super::types::{EdgeId, NodeId};
use crate::error::{Result, SfgError};
use crate::expr::Expr;

/// A named signal in the graph.
#[derive(Debug, Clone)]
pub struct Node {
    /// Display name, not necessarily unique
    pub name: String,
    /// Identity assigned at creation, `None` once marked deleted
    pub identity: Option<usize>,
}

impl Node {
    pub fn is_deleted(&self) -> bool {
        self.identity.is_none()
    }
}

/// A directed branch carrying a symbolic gain.
#[derive(Debug, Clone)]
pub struct Edge {
    /// Source node
    pub from: NodeId,
    /// Target node
    pub to: NodeId,
    /// Gain expression, owned by the edge
    pub gain: Expr,
    /// Identity assigned at creation, `None` once marked deleted
    pub identity: Option<usize>,
}

impl Edge {
    pub fn is_deleted(&self) -> bool {
        self.identity.is_none()
    }
}

/// A signal-flow graph.
///
/// Nodes and edges live in index-addressed lists; [`NodeId`] and [`EdgeId`]
/// are positions in those lists. Deletion only marks entries, [`Graph::gc`]
/// removes them and renumbers.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    id_counter: usize,
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all nodes and edges. Identities keep counting up.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    fn next_identity(&mut self) -> usize {
        let id = self.id_counter;
        self.id_counter += 1;
        id
    }

    /// Add a node and return its position.
    pub fn add_node(&mut self, name: impl Into<String>) -> NodeId {
        let identity = Some(self.next_identity());
        self.nodes.push(Node {
            name: name.into(),
            identity,
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Add an edge, taking ownership of its gain.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, gain: Expr) -> Result<EdgeId> {
        for node in [from, to] {
            if self.node(node).is_none() {
                return Err(SfgError::node_not_found(node.to_string()));
            }
        }
        let identity = Some(self.next_identity());
        self.edges.push(Edge {
            from,
            to,
            gain,
            identity,
        });
        Ok(EdgeId(self.edges.len() - 1))
    }

    /// Parse `text` as the gain of a new edge.
    pub fn add_edge_parsed(&mut self, from: NodeId, to: NodeId, text: &str) -> Result<EdgeId> {
        let gain = Expr::parse(text)?;
        self.add_edge(from, to, gain)
    }

    /// Replace the gain of an edge. The previous gain is dropped.
    pub fn set_gain(&mut self, edge: EdgeId, gain: Expr) -> Result<()> {
        let slot = self
            .edges
            .get_mut(edge.0)
            .ok_or(SfgError::EdgeNotFound { edge: edge.0 })?;
        slot.gain = gain;
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// First live node with the given name.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| !n.is_deleted() && n.name == name)
            .map(NodeId)
    }

    /// Live edges leaving `node`, in index order.
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(move |(_, e)| e.from == node && !e.is_deleted())
            .map(|(i, _)| EdgeId(i))
    }

    /// Mark a node and every edge touching it as deleted.
    pub fn mark_node_deleted(&mut self, node: NodeId) {
        let slot = match self.nodes.get_mut(node.0) {
            Some(slot) => slot,
            None => return,
        };
        slot.identity = None;
        for edge in self.edges.iter_mut() {
            if edge.from == node || edge.to == node {
                edge.identity = None;
            }
        }
    }

    pub fn mark_edge_deleted(&mut self, edge: EdgeId) {
        if let Some(slot) = self.edges.get_mut(edge.0) {
            slot.identity = None;
        }
    }

    /// Remove everything marked deleted.
    ///
    /// Removal swaps the last entry into the freed slot, so positions of
    /// surviving nodes and edges may change. Edge endpoints are rewritten to
    /// follow moved nodes.
    pub fn gc(&mut self) -> usize {
        let mut removed = 0;

        let mut i = 0;
        while i < self.edges.len() {
            if self.edges[i].is_deleted() {
                self.edges.swap_remove(i);
                removed += 1;
            } else {
                i += 1;
            }
        }

        let mut i = 0;
        while i < self.nodes.len() {
            if !self.nodes[i].is_deleted() {
                i += 1;
                continue;
            }
            let last = NodeId(self.nodes.len() - 1);
            self.nodes.swap_remove(i);
            removed += 1;
            for edge in self.edges.iter_mut() {
                if edge.from == last {
                    edge.from = NodeId(i);
                }
                if edge.to == last {
                    edge.to = NodeId(i);
                }
            }
        }

        if removed > 0 {
            log::debug!("graph gc removed {} entries", removed);
        }
        removed
    }

    /// Check that a gain can be computed between `input` and `output`.
    pub fn validate_io(&self, input: NodeId, output: NodeId) -> Result<()> {
        for node in [input, output] {
            match self.node(node) {
                Some(n) if !n.is_deleted() => {}
                _ => return Err(SfgError::node_not_found(node.to_string())),
            }
        }
        if input == output {
            return Err(SfgError::invalid_topology("input and output must be different nodes"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identities_increase() {
        let mut g = Graph::new();
        let a = g.add_node("a");
        let b = g.add_node("b");
        let e = g.add_edge_parsed(a, b, "K").unwrap();
        assert_eq!(g.node(a).unwrap().identity, Some(0));
        assert_eq!(g.node(b).unwrap().identity, Some(1));
        assert_eq!(g.edge(e).unwrap().identity, Some(2));
        assert_eq!(g.find_node("b"), Some(b));
        assert_eq!(g.find_node("c"), None);
    }

    #[test]
    fn test_add_edge_rejects_unknown_node() {
        let mut g = Graph::new();
        let a = g.add_node("a");
        let err = g.add_edge(a, NodeId(7), Expr::literal(1.0)).unwrap_err();
        assert!(matches!(err, SfgError::NodeNotFound { .. }));
    }

    #[test]
    fn test_gc_swaps_last_and_fixes_endpoints() {
        let mut g = Graph::new();
        let a = g.add_node("a");
        let b = g.add_node("b");
        let c = g.add_node("c");
        let d = g.add_node("d");
        g.add_edge_parsed(a, b, "1").unwrap();
        g.add_edge_parsed(c, d, "2").unwrap();
        g.add_edge_parsed(d, c, "3").unwrap();

        g.mark_node_deleted(b);
        assert!(g.edge(EdgeId(0)).unwrap().is_deleted());
        assert_eq!(g.gc(), 2);

        // d was moved into the slot of b
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.find_node("d"), Some(NodeId(1)));
        let c = g.find_node("c").unwrap();
        let d = g.find_node("d").unwrap();
        assert_eq!(g.edge_count(), 2);
        for edge in g.edges() {
            let ends = (edge.from, edge.to);
            assert!(ends == (c, d) || ends == (d, c));
        }
    }

    #[test]
    fn test_out_edges_skip_deleted() {
        let mut g = Graph::new();
        let a = g.add_node("a");
        let b = g.add_node("b");
        let e1 = g.add_edge_parsed(a, b, "1").unwrap();
        let e2 = g.add_edge_parsed(a, b, "2").unwrap();
        g.mark_edge_deleted(e1);
        assert_eq!(g.out_edges(a).collect::<Vec<_>>(), vec![e2]);
    }

    #[test]
    fn test_validate_io() {
        let mut g = Graph::new();
        let a = g.add_node("a");
        let b = g.add_node("b");
        assert!(g.validate_io(a, b).is_ok());
        assert!(matches!(g.validate_io(a, a), Err(SfgError::InvalidTopology { .. })));
        g.mark_node_deleted(b);
        assert!(matches!(g.validate_io(a, b), Err(SfgError::NodeNotFound { .. })));
    }
}

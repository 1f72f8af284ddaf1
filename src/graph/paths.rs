//! Forward-path and loop enumeration.
//!
//! Both searches are depth-first with backtracking. A node is marked on
//! entry and unmarked on exit, so every recorded path is simple. Results go
//! into a flat [`Paths`] buffer where each path is a run of edge positions
//! closed by [`EdgeId::SENTINEL`].

use std::collections::BTreeSet;

use super::graph::Graph;
use super::types::{EdgeId, NodeId};
use crate::error::Result;

/// Paths stored back to back in one buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paths {
    buf: Vec<EdgeId>,
}

impl Paths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Append one path.
    pub fn push(&mut self, path: &[EdgeId]) {
        self.buf.extend_from_slice(path);
        self.buf.push(EdgeId::SENTINEL);
    }

    /// Number of stored paths.
    pub fn len(&self) -> usize {
        self.buf.iter().filter(|e| e.is_sentinel()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The raw buffer, sentinels included.
    pub fn as_slice(&self) -> &[EdgeId] {
        &self.buf
    }

    /// Iterate over the stored paths without their sentinels.
    pub fn iter(&self) -> impl Iterator<Item = &[EdgeId]> + '_ {
        self.buf
            .split_inclusive(|e| e.is_sentinel())
            .map(|path| &path[..path.len() - 1])
    }

    pub fn get(&self, index: usize) -> Option<&[EdgeId]> {
        self.iter().nth(index)
    }
}

struct Search<'g> {
    graph: &'g Graph,
    visited: Vec<bool>,
    stack: Vec<EdgeId>,
    found: Paths,
}

impl<'g> Search<'g> {
    fn new(graph: &'g Graph) -> Self {
        Self {
            graph,
            visited: vec![false; graph.node_count()],
            stack: Vec::new(),
            found: Paths::new(),
        }
    }

    /// Follow `edge` and record every continuation that ends in `target`.
    fn follow(&mut self, edge: EdgeId, target: NodeId) {
        let to = match self.graph.edge(edge) {
            Some(e) => e.to,
            None => return,
        };
        if self.visited[to.0] {
            return;
        }

        self.visited[to.0] = true;
        self.stack.push(edge);
        if to == target {
            self.found.push(&self.stack);
        } else {
            let next: Vec<EdgeId> = self.graph.out_edges(to).collect();
            for edge in next {
                self.follow(edge, target);
            }
        }
        self.stack.pop();
        self.visited[to.0] = false;
    }
}

impl Graph {
    /// Enumerate every simple path from `input` to `output`.
    ///
    /// Paths are ordered by the edge positions taken at each branch point.
    pub fn find_forward_paths(&self, input: NodeId, output: NodeId) -> Result<Paths> {
        self.validate_io(input, output)?;

        let mut search = Search::new(self);
        search.visited[input.0] = true;
        let start: Vec<EdgeId> = self.out_edges(input).collect();
        for edge in start {
            search.follow(edge, output);
        }

        log::debug!("found {} forward paths from {} to {}", search.found.len(), input, output);
        Ok(search.found)
    }

    /// Enumerate every loop once.
    ///
    /// Nodes are taken in index order and each loop is reported by its
    /// lowest-positioned node: once a node's loops are recorded it is closed
    /// to later searches.
    pub fn find_loops(&self) -> Paths {
        let mut search = Search::new(self);
        for (index, node) in self.nodes().iter().enumerate() {
            if node.is_deleted() {
                continue;
            }
            let start = NodeId(index);
            let edges: Vec<EdgeId> = self.out_edges(start).collect();
            for edge in edges {
                search.follow(edge, start);
            }
            search.visited[index] = true;
        }

        log::debug!("found {} loops", search.found.len());
        search.found
    }

    /// Nodes a path passes through, endpoints included.
    pub fn path_nodes(&self, path: &[EdgeId]) -> BTreeSet<NodeId> {
        path.iter()
            .filter_map(|&e| self.edge(e))
            .flat_map(|e| [e.from, e.to])
            .collect()
    }

    /// Two paths touch when they share at least one node.
    pub fn paths_touch(&self, a: &[EdgeId], b: &[EdgeId]) -> bool {
        let nodes = self.path_nodes(a);
        b.iter()
            .filter_map(|&e| self.edge(e))
            .any(|e| nodes.contains(&e.from) || nodes.contains(&e.to))
    }

    /// The loops of `loops` that do not touch `path`, in their original order.
    pub fn find_nontouching(&self, loops: &Paths, path: &[EdgeId]) -> Paths {
        let mut out = Paths::new();
        for l in loops.iter().filter(|l| !self.paths_touch(l, path)) {
            out.push(l);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(nodes: usize, edges: &[(usize, usize)]) -> (Graph, Vec<NodeId>, Vec<EdgeId>) {
        let mut g = Graph::new();
        let ns: Vec<NodeId> = (0..nodes).map(|i| g.add_node(format!("V{}", i + 1))).collect();
        let es = edges
            .iter()
            .map(|&(a, b)| g.add_edge_parsed(ns[a], ns[b], "1").unwrap())
            .collect();
        (g, ns, es)
    }

    fn collect(paths: &Paths) -> Vec<Vec<EdgeId>> {
        paths.iter().map(|p| p.to_vec()).collect()
    }

    #[test]
    fn test_flat_buffer_layout() {
        let mut paths = Paths::new();
        paths.push(&[EdgeId(0), EdgeId(1)]);
        paths.push(&[EdgeId(2)]);
        assert_eq!(paths.len(), 2);
        assert_eq!(
            paths.as_slice(),
            &[EdgeId(0), EdgeId(1), EdgeId::SENTINEL, EdgeId(2), EdgeId::SENTINEL]
        );
        assert_eq!(paths.get(1), Some(&[EdgeId(2)][..]));
        assert_eq!(paths.get(2), None);
    }

    #[test]
    fn test_forward_paths_with_parallel_edges() {
        let (g, n, e) = graph(3, &[(0, 1), (1, 2), (1, 2)]);
        let paths = g.find_forward_paths(n[0], n[2]).unwrap();
        assert_eq!(collect(&paths), vec![vec![e[0], e[1]], vec![e[0], e[2]]]);
    }

    #[test]
    fn test_forward_paths_with_dead_ends() {
        let (g, n, e) = graph(5, &[(0, 1), (1, 2), (2, 3), (1, 2), (1, 3), (2, 4)]);
        let paths = g.find_forward_paths(n[0], n[3]).unwrap();
        assert_eq!(
            collect(&paths),
            vec![vec![e[0], e[1], e[2]], vec![e[0], e[3], e[2]], vec![e[0], e[4]]]
        );

        let paths = g.find_forward_paths(n[0], n[4]).unwrap();
        assert_eq!(collect(&paths), vec![vec![e[0], e[1], e[5]], vec![e[0], e[3], e[5]]]);
    }

    #[test]
    fn test_forward_paths_never_revisit_input() {
        // V2 -> V1 feeds back into the input; V1 -> V3 must not follow it
        let (g, n, e) = graph(3, &[(0, 1), (1, 0), (0, 2)]);
        let paths = g.find_forward_paths(n[0], n[2]).unwrap();
        assert_eq!(collect(&paths), vec![vec![e[2]]]);
    }

    #[test]
    fn test_self_loop() {
        let (g, _, e) = graph(1, &[(0, 0)]);
        assert_eq!(collect(&g.find_loops()), vec![vec![e[0]]]);
    }

    #[test]
    fn test_overlapping_loops_owned_by_lowest_node() {
        let (g, _, e) = graph(5, &[(0, 1), (1, 2), (3, 2), (2, 1), (1, 3), (2, 4)]);
        let loops = g.find_loops();
        assert_eq!(collect(&loops), vec![vec![e[1], e[3]], vec![e[4], e[2], e[3]]]);
    }

    #[test]
    fn test_touching() {
        // two separate two-node loops joined by a forward edge
        let (g, _, e) = graph(4, &[(0, 1), (1, 0), (2, 3), (3, 2), (1, 2)]);
        let loops = g.find_loops();
        assert_eq!(loops.len(), 2);
        let (l1, l2) = (loops.get(0).unwrap(), loops.get(1).unwrap());
        assert!(!g.paths_touch(l1, l2));
        assert!(g.paths_touch(l1, &[e[4]]));
        assert!(g.paths_touch(&[e[4]], l2));

        let only_second = g.find_nontouching(&loops, &[e[0]]);
        assert_eq!(collect(&only_second), vec![l2.to_vec()]);
        assert!(g.find_nontouching(&loops, &[e[0], e[4], e[2]]).is_empty());
    }
}

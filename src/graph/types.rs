//! Core types for graph representation.

use std::fmt;

/// Position of a node in the graph's node list.
///
/// Positions are stable until [`Graph::gc`](super::Graph::gc) compacts the
/// list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Position of an edge in the graph's edge list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub usize);

impl EdgeId {
    /// Terminates each path in a flat [`Paths`](super::Paths) buffer.
    pub const SENTINEL: EdgeId = EdgeId(usize::MAX);

    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_sentinel() {
            write!(f, "-")
        } else {
            write!(f, "e{}", self.0)
        }
    }
}

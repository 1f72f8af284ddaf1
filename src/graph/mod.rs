//! Signal-flow graph model and gain computation.
//!
//! A [`Graph`] holds named nodes and directed edges whose gains are
//! symbolic [`Expr`](crate::expr::Expr)s. The gain between two nodes is
//! obtained with Mason's formula from the forward paths between them and
//! the loops of the whole graph:
//!
//! ```text
//! use sfg_core::graph::Graph;
//!
//! let mut g = Graph::new();
//! let x = g.add_node("x");
//! let y = g.add_node("y");
//! g.add_edge_parsed(x, y, "K")?;
//! g.add_edge_parsed(y, x, "-H")?;
//! let gain = g.mason(x, y)?;    // K / (1 - K * -H)
//! ```

mod graph;
mod mason;
mod paths;
mod types;

pub use graph::{Edge, Graph, Node};
pub use mason::{determinant, mason};
pub use paths::Paths;
pub use types::*;

//! Mason's gain formula.
//!
//! ```text
//!        Σ_k P_k Δ_k
//!  G  =  -----------      Δ = 1 - ΣL_i + ΣL_iL_j - ΣL_iL_jL_k + ...
//!             Δ
//! ```
//!
//! The sums of products run over sets of mutually non-touching loops;
//! `Δ_k` is the determinant of the loops that do not touch forward path
//! `P_k`. The quotient is left symbolic.

use bit_set::BitSet;

use super::graph::Graph;
use super::paths::Paths;
use super::types::{EdgeId, NodeId};
use crate::error::Result;
use crate::expr::{Expr, ExprId, ExprPool};

/// Position of the pair `(i, j)`, `i < j`, in an upper-triangular table
/// over `n` entries.
fn touch_index(i: usize, j: usize, n: usize) -> usize {
    i * (2 * n - i - 1) / 2 + (j - i - 1)
}

/// Product of the gains along a path, copied into `pool`.
fn path_gain(graph: &Graph, pool: &mut ExprPool, path: &[EdgeId]) -> ExprId {
    let mut gain: Option<ExprId> = None;
    for edge in path.iter().filter_map(|&e| graph.edge(e)) {
        let factor = pool.dup_from(edge.gain.pool(), edge.gain.root());
        gain = Some(match gain {
            Some(acc) => pool.mul(acc, factor),
            None => factor,
        });
    }
    gain.unwrap_or_else(|| pool.literal(1.0))
}

/// Advance `comb` to the next k-subset of `0..n` in lexicographic order.
fn next_combination(comb: &mut [usize], n: usize) -> bool {
    let k = comb.len();
    let pivot = match (0..k).rev().find(|&i| comb[i] < n - k + i) {
        Some(i) => i,
        None => return false,
    };
    comb[pivot] += 1;
    for i in pivot + 1..k {
        comb[i] = comb[i - 1] + 1;
    }
    true
}

/// Build the graph determinant Δ of a set of loops into `pool`.
pub fn determinant(graph: &Graph, pool: &mut ExprPool, loops: &Paths) -> ExprId {
    let gains: Vec<&[EdgeId]> = loops.iter().collect();
    let n = gains.len();

    let mut det = pool.literal(1.0);
    for l in &gains {
        let gain = path_gain(graph, pool, l);
        det = pool.sub(det, gain);
    }
    if n < 2 {
        return det;
    }

    let mut touching = BitSet::with_capacity(n * (n - 1) / 2);
    for i in 0..n - 1 {
        for j in i + 1..n {
            if graph.paths_touch(gains[i], gains[j]) {
                touching.insert(touch_index(i, j, n));
            }
        }
    }

    for k in 2..=n {
        let mut comb: Vec<usize> = (0..k).collect();
        let mut found = 0;
        loop {
            let disjoint = (0..k - 1)
                .all(|a| (a + 1..k).all(|b| !touching.contains(touch_index(comb[a], comb[b], n))));
            if disjoint {
                found += 1;
                let mut term = path_gain(graph, pool, gains[comb[0]]);
                for &l in &comb[1..] {
                    let factor = path_gain(graph, pool, gains[l]);
                    term = pool.mul(term, factor);
                }
                det = if k % 2 == 0 {
                    pool.add(det, term)
                } else {
                    pool.sub(det, term)
                };
            }
            if !next_combination(&mut comb, n) {
                break;
            }
        }

        log::trace!("{} non-touching sets of {} loops", found, k);
        // no disjoint k-set means no disjoint (k+1)-set either
        if found == 0 {
            break;
        }
    }
    det
}

/// Apply Mason's gain formula to precomputed forward paths and loops.
///
/// A graph without forward paths has gain 0.
pub fn mason(graph: &Graph, paths: &Paths, loops: &Paths) -> Expr {
    let mut pool = ExprPool::new();

    let mut numerator: Option<ExprId> = None;
    for path in paths.iter() {
        let nontouching = graph.find_nontouching(loops, path);
        let gain = path_gain(graph, &mut pool, path);
        let cofactor = determinant(graph, &mut pool, &nontouching);
        let term = pool.mul(gain, cofactor);
        numerator = Some(match numerator {
            Some(acc) => pool.add(acc, term),
            None => term,
        });
    }

    let root = match numerator {
        Some(numerator) => {
            let det = determinant(graph, &mut pool, loops);
            pool.div(numerator, det)
        }
        None => {
            log::debug!("no forward paths, gain is 0");
            pool.literal(0.0)
        }
    };
    pool.gc(&[root]);
    Expr::from_parts(pool, root)
}

impl Graph {
    /// Symbolic gain from `input` to `output`.
    pub fn mason(&self, input: NodeId, output: NodeId) -> Result<Expr> {
        let paths = self.find_forward_paths(input, output)?;
        let loops = self.find_loops();
        Ok(mason(self, &paths, &loops))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vars::VarTable;
    use approx::assert_relative_eq;

    fn bind(values: &[(&str, f64)]) -> VarTable {
        let mut vars = VarTable::new();
        for &(name, value) in values {
            vars.set_literal(name, value);
        }
        vars
    }

    #[test]
    fn test_touch_index_is_dense() {
        let n = 5;
        let mut seen = Vec::new();
        for i in 0..n - 1 {
            for j in i + 1..n {
                seen.push(touch_index(i, j, n));
            }
        }
        assert_eq!(seen, (0..n * (n - 1) / 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_combinations_in_lexicographic_order() {
        let mut comb = vec![0, 1];
        let mut all = vec![comb.clone()];
        while next_combination(&mut comb, 4) {
            all.push(comb.clone());
        }
        assert_eq!(
            all,
            vec![vec![0, 1], vec![0, 2], vec![0, 3], vec![1, 2], vec![1, 3], vec![2, 3]]
        );
    }

    #[test]
    fn test_ladder_with_two_nontouching_loops() {
        let mut g = Graph::new();
        let n: Vec<NodeId> = ["n1", "n2", "n3", "n4"].iter().map(|s| g.add_node(*s)).collect();
        for (from, to, gain) in [
            (0, 1, "G1"),
            (1, 2, "G2"),
            (2, 3, "G3"),
            (3, 2, "H3"),
            (1, 0, "H1"),
            (3, 0, "H2"),
        ] {
            g.add_edge_parsed(n[from], n[to], gain).unwrap();
        }

        let expr = g.mason(n[0], n[3]).unwrap();
        let (g1, g2, g3, h1, h2, h3) = (3.0, 5.0, 7.0, 11.0, 13.0, 17.0);
        let vars = bind(&[("G1", g1), ("G2", g2), ("G3", g3), ("H1", h1), ("H2", h2), ("H3", h3)]);
        let expected = g1 * g2 * g3 / (1.0 - g1 * g2 * g3 * h2 - g1 * h1 - g3 * h3 + g1 * h1 * g3 * h3);
        assert_relative_eq!(expr.eval(&vars), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_two_branches_with_local_loops() {
        let mut g = Graph::new();
        let n: Vec<NodeId> = (1..=8).map(|i| g.add_node(format!("V{}", i))).collect();
        for (from, to, gain) in [
            (0, 4, "G1"),
            (4, 5, "G2"),
            (5, 6, "G3"),
            (6, 7, "G4"),
            (0, 1, "G5"),
            (1, 2, "G6"),
            (2, 3, "G7"),
            (3, 7, "G8"),
            (5, 4, "H2"),
            (6, 5, "H3"),
            (2, 1, "H6"),
            (3, 2, "H7"),
        ] {
            g.add_edge_parsed(n[from], n[to], gain).unwrap();
        }

        let values = [
            ("G1", 3.0),
            ("G2", 5.0),
            ("G3", 7.0),
            ("G4", 11.0),
            ("G5", 13.0),
            ("G6", 17.0),
            ("G7", 19.0),
            ("G8", 23.0),
            ("H2", 29.0),
            ("H3", 31.0),
            ("H6", 37.0),
            ("H7", 41.0),
        ];
        let vars = bind(&values);
        let v = |name: &str| values.iter().find(|(n, _)| *n == name).map(|(_, x)| *x).unwrap();
        let (g1, g2, g3, g4) = (v("G1"), v("G2"), v("G3"), v("G4"));
        let (g5, g6, g7, g8) = (v("G5"), v("G6"), v("G7"), v("G8"));
        let (h2, h3, h6, h7) = (v("H2"), v("H3"), v("H6"), v("H7"));

        let upper = 1.0 - g2 * h2 - g3 * h3;
        let lower = 1.0 - g6 * h6 - g7 * h7;
        let expected = (g1 * g2 * g3 * g4 * lower + g5 * g6 * g7 * g8 * upper) / (upper * lower);

        let expr = g.mason(n[0], n[7]).unwrap();
        assert_relative_eq!(expr.eval(&vars), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_no_forward_path_is_zero() {
        let mut g = Graph::new();
        let a = g.add_node("a");
        let b = g.add_node("b");
        g.add_edge_parsed(b, a, "K").unwrap();
        let expr = g.mason(a, b).unwrap();
        assert_eq!(expr.literal_value(), Some(0.0));
    }

    #[test]
    fn test_determinant_without_loops_is_one() {
        let g = Graph::new();
        let mut pool = ExprPool::new();
        let det = determinant(&g, &mut pool, &Paths::new());
        assert_eq!(pool.literal_value(det), Some(1.0));
    }
}

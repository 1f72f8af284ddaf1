//! Merging of repeated factors and like terms.

use super::bottom_up;
use super::chain::{self, ChainOp};
use crate::expr::{ExprId, ExprPool, NodeKind};

/// Merge factors with equal bases: `x*x` → `x^(1+1)`, `x^a*x^b` → `x^(a+b)`.
///
/// One pair is merged per chain and sweep; constant folding finishes the
/// exponent.
pub fn simplify_products(pool: &mut ExprPool, root: ExprId) -> bool {
    bottom_up(pool, root, |pool, id| {
        if !chain::is_chain_top(pool, id, ChainOp::Mul) {
            return false;
        }
        let factors = chain::operands(pool, id, ChainOp::Mul);
        let split: Vec<(ExprId, Option<ExprId>)> = factors
            .iter()
            .map(|&f| match *pool.kind(f) {
                NodeKind::Pow(base, exp) => (base, Some(exp)),
                _ => (f, None),
            })
            .collect();

        let pair = (0..split.len()).find_map(|i| {
            if pool.literal_value(split[i].0).is_some() {
                return None;
            }
            (i + 1..split.len())
                .find(|&j| pool.same(split[i].0, split[j].0))
                .map(|j| (i, j))
        });
        let (i, j) = match pair {
            Some(pair) => pair,
            None => return false,
        };

        let mut exponent = |e: Option<ExprId>| match e {
            Some(e) => pool.dup(e),
            None => pool.literal(1.0),
        };
        let (e1, e2) = (exponent(split[i].1), exponent(split[j].1));
        let sum = pool.add(e1, e2);
        let base = pool.dup(split[i].0);
        let merged = pool.pow(base, sum);

        let mut remaining = factors;
        remaining[i] = merged;
        remaining.remove(j);
        chain::rebuild(pool, id, ChainOp::Mul, &remaining);
        true
    })
}

/// Merge terms that differ only in their literal coefficient:
/// `x + x` → `2*x`, `2*a*x - 3*a*x` → `-1*a*x`.
pub fn simplify_sums(pool: &mut ExprPool, root: ExprId) -> bool {
    bottom_up(pool, root, |pool, id| {
        if !chain::is_chain_top(pool, id, ChainOp::Add) {
            return false;
        }
        let terms = chain::operands(pool, id, ChainOp::Add);
        let split: Vec<Option<(f64, Vec<ExprId>)>> = terms.iter().map(|&t| split_term(pool, t)).collect();

        let pair = (0..split.len()).find_map(|i| {
            let (_, a) = split[i].as_ref()?;
            (i + 1..split.len())
                .find(|&j| match &split[j] {
                    Some((_, b)) => a.len() == b.len() && a.iter().zip(b).all(|(x, y)| pool.same(*x, *y)),
                    None => false,
                })
                .map(|j| (i, j))
        });
        let (i, j) = match pair {
            Some(pair) => pair,
            None => return false,
        };
        let (ci, factors) = match &split[i] {
            Some(term) => term.clone(),
            None => return false,
        };
        let cj = split[j].as_ref().map_or(0.0, |(c, _)| *c);

        let mut operands = vec![pool.literal(ci + cj)];
        for f in factors {
            operands.push(pool.dup(f));
        }
        let merged = chain::build(pool, ChainOp::Mul, &operands);

        let mut remaining = terms;
        remaining[i] = merged;
        remaining.remove(j);
        chain::rebuild(pool, id, ChainOp::Add, &remaining);
        true
    })
}

/// Literal coefficient and non-literal factors of a term. Constant terms
/// are left to folding.
fn split_term(pool: &ExprPool, mut term: ExprId) -> Option<(f64, Vec<ExprId>)> {
    let mut coefficient = 1.0;
    while let NodeKind::Negate(x) = *pool.kind(term) {
        coefficient = -coefficient;
        term = x;
    }

    let mut factors = Vec::new();
    for f in chain::operands(pool, term, ChainOp::Mul) {
        match pool.literal_value(f) {
            Some(v) => coefficient *= v,
            None => factors.push(f),
        }
    }
    if factors.is_empty() {
        None
    } else {
        Some((coefficient, factors))
    }
}

//! Constant folding.

use super::bottom_up;
use super::chain::{self, ChainOp};
use crate::expr::{ExprId, ExprPool, NodeKind};

/// Evaluate operators on literal operands and merge literals that sit in
/// the same sum or product chain.
///
/// Results that are not finite (`0^-1`, overflow) are left unfolded.
pub fn fold_constants(pool: &mut ExprPool, root: ExprId) -> bool {
    bottom_up(pool, root, |pool, id| eval_subtree(pool, id) || combine_constants(pool, id))
}

fn eval_subtree(pool: &mut ExprPool, id: ExprId) -> bool {
    let both = |pool: &ExprPool, l: ExprId, r: ExprId| Some((pool.literal_value(l)?, pool.literal_value(r)?));
    let value = match *pool.kind(id) {
        NodeKind::Negate(x) => pool.literal_value(x).map(|v| -v),
        NodeKind::Add(l, r) => both(pool, l, r).map(|(a, b)| a + b),
        NodeKind::Mul(l, r) => both(pool, l, r).map(|(a, b)| a * b),
        NodeKind::Pow(l, r) => both(pool, l, r).map(|(a, b)| a.powf(b)),
        _ => None,
    };

    match value.filter(|v| v.is_finite()) {
        Some(v) => {
            pool.set_literal(id, v);
            true
        }
        None => false,
    }
}

fn combine_constants(pool: &mut ExprPool, id: ExprId) -> bool {
    for op in [ChainOp::Add, ChainOp::Mul] {
        if !chain::is_chain_top(pool, id, op) {
            continue;
        }

        let operands = chain::operands(pool, id, op);
        let literals: Vec<usize> = operands
            .iter()
            .enumerate()
            .filter(|(_, &o)| pool.literal_value(o).is_some())
            .map(|(i, _)| i)
            .collect();
        if literals.len() < 2 {
            return false;
        }

        let value = literals
            .iter()
            .filter_map(|&i| pool.literal_value(operands[i]))
            .fold(op.identity(), |acc, v| op.combine(acc, v));
        if !value.is_finite() {
            continue;
        }
        let keep = operands[literals[0]];
        pool.set_literal(keep, value);

        let remaining: Vec<ExprId> = operands
            .iter()
            .enumerate()
            .filter(|(i, _)| *i == literals[0] || !literals.contains(i))
            .map(|(_, &o)| o)
            .collect();
        chain::rebuild(pool, id, op, &remaining);
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::super::test_util::apply;
    use super::*;

    #[test]
    fn test_fold_operator_on_literals() {
        assert_eq!(apply(fold_constants, "2 * 3 + a"), "6 + a");
        assert_eq!(apply(fold_constants, "-(3)^2"), "-9");
        assert_eq!(apply(fold_constants, "2^-1 * a"), "0.5 * a");
    }

    #[test]
    fn test_combine_across_chain() {
        assert_eq!(apply(fold_constants, "2 + a + 3"), "5 + a");
        assert_eq!(apply(fold_constants, "2 * a * 4 * b"), "8 * a * b");
        assert_eq!(apply(fold_constants, "a * (b + 1 + 1)"), "a * (b + 2)");
    }

    #[test]
    fn test_division_by_zero_stays_symbolic() {
        let (mut pool, root) = super::super::test_util::parse("1 / 0");
        assert!(!fold_constants(&mut pool, root));
        let (mut pool, root) = super::super::test_util::parse("a * 1e300 * 1e300");
        assert!(!fold_constants(&mut pool, root));
    }

    #[test]
    fn test_nothing_to_fold() {
        let (mut pool, root) = super::super::test_util::parse("a + b * c");
        assert!(!fold_constants(&mut pool, root));
    }
}

//! Removal of identity and self-cancelling operations.

use super::{bottom_up, is_literal};
use crate::expr::{ExprId, ExprPool, NodeKind};

/// Drop operations that do not change the value of their operand.
pub fn remove_useless_ops(pool: &mut ExprPool, root: ExprId) -> bool {
    bottom_up(pool, root, |pool, id| match *pool.kind(id) {
        NodeKind::Negate(x) => match *pool.kind(x) {
            NodeKind::Negate(inner) => {
                pool.replace(id, inner);
                true
            }
            _ => false,
        },
        NodeKind::Add(l, r) => {
            if is_literal(pool, l, 0.0) {
                pool.replace(id, r);
                true
            } else if is_literal(pool, r, 0.0) {
                pool.replace(id, l);
                true
            } else {
                false
            }
        }
        NodeKind::Mul(l, r) => simplify_product(pool, id, l, r),
        NodeKind::Pow(base, exp) => simplify_power(pool, id, base, exp),
        _ => false,
    })
}

fn simplify_product(pool: &mut ExprPool, id: ExprId, l: ExprId, r: ExprId) -> bool {
    if let (NodeKind::Negate(a), NodeKind::Negate(b)) = (pool.kind(l), pool.kind(r)) {
        let (a, b) = (*a, *b);
        pool.set_kind(id, NodeKind::Mul(a, b));
        return true;
    }

    for (this, other) in [(l, r), (r, l)] {
        if is_literal(pool, this, 1.0) {
            pool.replace(id, other);
            return true;
        }
        if is_literal(pool, this, -1.0) {
            pool.set_kind(id, NodeKind::Negate(other));
            return true;
        }
        // 0 * oo has no value; keep it for limit evaluation
        if is_literal(pool, this, 0.0) && !contains_infinity(pool, other) {
            pool.set_literal(id, 0.0);
            return true;
        }
        if is_reciprocal_of(pool, other, this) {
            pool.set_literal(id, 1.0);
            return true;
        }
    }
    false
}

fn simplify_power(pool: &mut ExprPool, id: ExprId, base: ExprId, exp: ExprId) -> bool {
    if is_literal(pool, exp, 1.0) {
        pool.replace(id, base);
        return true;
    }
    if is_literal(pool, exp, 0.0) {
        pool.set_literal(id, 1.0);
        return true;
    }
    if is_literal(pool, exp, -1.0) {
        if let NodeKind::Pow(inner, inner_exp) = *pool.kind(base) {
            if is_literal(pool, inner_exp, -1.0) {
                pool.replace(id, inner);
                return true;
            }
        }
    }
    false
}

/// True if `candidate` is `x^-1` for a subtree equal to `x`.
fn is_reciprocal_of(pool: &ExprPool, candidate: ExprId, x: ExprId) -> bool {
    match *pool.kind(candidate) {
        NodeKind::Pow(base, exp) => is_literal(pool, exp, -1.0) && pool.same(base, x),
        _ => false,
    }
}

fn contains_infinity(pool: &ExprPool, id: ExprId) -> bool {
    pool.subtree(id)
        .into_iter()
        .any(|node| matches!(pool.kind(node), NodeKind::Infinity))
}

#[cfg(test)]
mod tests {
    use super::super::test_util::apply;
    use super::*;

    #[test]
    fn test_identities() {
        assert_eq!(apply(remove_useless_ops, "0 + a * 1"), "a");
        assert_eq!(apply(remove_useless_ops, "x^1 + y^0"), "x + 1");
        assert_eq!(apply(remove_useless_ops, "b + 0"), "b");
    }

    #[test]
    fn test_negations() {
        assert_eq!(apply(remove_useless_ops, "--a"), "a");
        assert_eq!(apply(remove_useless_ops, "-1 * a"), "-a");
        assert_eq!(apply(remove_useless_ops, "(-a) * (-b)"), "a * b");
    }

    #[test]
    fn test_reciprocals_cancel() {
        assert_eq!(apply(remove_useless_ops, "x / x"), "1");
        assert_eq!(apply(remove_useless_ops, "(a + b)^-1 * (a + b)"), "1");
        assert_eq!(apply(remove_useless_ops, "(a^-1)^-1"), "a");
    }

    #[test]
    fn test_zero_product() {
        assert_eq!(apply(remove_useless_ops, "0 * (a + b)"), "0");
        assert_eq!(apply(remove_useless_ops, "0 * oo"), "0 * oo");
        assert_eq!(apply(remove_useless_ops, "(a * oo) * 0"), "a * oo * 0");
    }
}

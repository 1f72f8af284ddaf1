//! Negation lowering and common-denominator factoring.

use super::bottom_up;
use super::chain::{self, ChainOp};
use crate::expr::{ExprId, ExprPool, NodeKind};

/// Push unary minus into its operand.
///
/// `-(a*b)` → `(-a)*b`, `-(x^a)` → `-1*x^a`, `-(a+b)` → `-a + -b`, and a
/// negated literal becomes a negative literal.
pub fn lower_negates(pool: &mut ExprPool, root: ExprId) -> bool {
    bottom_up(pool, root, |pool, id| {
        let x = match *pool.kind(id) {
            NodeKind::Negate(x) => x,
            _ => return false,
        };
        match *pool.kind(x) {
            NodeKind::Literal(v) => {
                pool.set_literal(id, -v);
                true
            }
            NodeKind::Mul(a, b) => {
                let negated = pool.neg(a);
                pool.set_kind(id, NodeKind::Mul(negated, b));
                true
            }
            NodeKind::Pow(..) => {
                let minus_one = pool.literal(-1.0);
                pool.set_kind(id, NodeKind::Mul(minus_one, x));
                true
            }
            NodeKind::Add(a, b) => {
                let (na, nb) = (pool.neg(a), pool.neg(b));
                pool.set_kind(id, NodeKind::Add(na, nb));
                true
            }
            _ => false,
        }
    })
}

/// Pull a reciprocal factor out of a sum.
///
/// `a + b*s^-c` with literal `c > 0` becomes `s^-c * (a*s^c + b)`. Either
/// operand of the sum may carry the reciprocal.
pub fn factor_common_denominator(pool: &mut ExprPool, root: ExprId) -> bool {
    bottom_up(pool, root, |pool, id| {
        let (l, r) = match *pool.kind(id) {
            NodeKind::Add(l, r) => (l, r),
            _ => return false,
        };
        for (other, term) in [(l, r), (r, l)] {
            if factor_out(pool, id, other, term) {
                return true;
            }
        }
        false
    })
}

fn factor_out(pool: &mut ExprPool, id: ExprId, other: ExprId, term: ExprId) -> bool {
    let factors = chain::operands(pool, term, ChainOp::Mul);
    let found = factors.iter().enumerate().find_map(|(i, &f)| match *pool.kind(f) {
        NodeKind::Pow(base, exp) => match pool.literal_value(exp) {
            Some(c) if c < 0.0 => Some((i, base, c)),
            _ => None,
        },
        _ => None,
    });
    let (index, base, c) = match found {
        Some(found) => found,
        None => return false,
    };
    let reciprocal = factors[index];
    let rest: Vec<ExprId> = factors
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, &f)| f)
        .collect();

    let base_copy = pool.dup(base);
    let power = pool.literal(-c);
    let inverse = pool.pow(base_copy, power);
    let scaled = pool.mul(other, inverse);
    let remainder = chain::build(pool, ChainOp::Mul, &rest);
    let sum = pool.add(scaled, remainder);
    pool.set_kind(id, NodeKind::Mul(reciprocal, sum));
    true
}

#[cfg(test)]
mod tests {
    use super::super::test_util::{apply, parse, sample_vars};
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_lower_negates() {
        assert_eq!(apply(lower_negates, "-(a * b)"), "-a * b");
        assert_eq!(apply(lower_negates, "-x^2"), "-1 * x^2");
        assert_eq!(apply(lower_negates, "-(a + b)"), "-a - b");
        assert_eq!(apply(lower_negates, "-(-(2))"), "2");
    }

    #[test]
    fn test_factor_single_reciprocal() {
        assert_eq!(apply(factor_common_denominator, "a + b * s^-1"), "s^-1 * (a * s^1 + b)");
        assert_eq!(apply(factor_common_denominator, "a + s^-2"), "s^-2 * (a * s^2 + 1)");
    }

    #[test]
    fn test_factor_nested_sums_keeps_value() {
        let vars = sample_vars();
        let text = "a + b / x + c / (x * s) + d";
        let (pool, root) = parse(text);
        let expected = vars.evaluate(&pool, root);

        let (mut pool, root) = parse(text);
        while factor_common_denominator(&mut pool, root) {}
        assert_relative_eq!(vars.evaluate(&pool, root), expected, max_relative = 1e-12);
        assert!(matches!(pool.kind(root), NodeKind::Mul(..)));
    }
}

//! Expansion passes: exponents into products, products over sums.

use super::chain::{self, ChainOp};
use super::{bottom_up, integer_literal};
use crate::expr::{ExprId, ExprPool, NodeKind};

/// `x^n` with integer `|n| >= 2` becomes `x * x * ...`; a negative `n`
/// leaves the product under `^-1`.
pub fn expand_constant_exponents(pool: &mut ExprPool, root: ExprId) -> bool {
    bottom_up(pool, root, |pool, id| {
        let (base, exp) = match *pool.kind(id) {
            NodeKind::Pow(base, exp) => (base, exp),
            _ => return false,
        };
        let n = match integer_literal(pool, exp) {
            Some(n) if n.abs() >= 2 => n,
            _ => return false,
        };

        let mut factors = vec![base];
        for _ in 1..n.abs() {
            factors.push(pool.dup(base));
        }
        let product = chain::build(pool, ChainOp::Mul, &factors);
        if n < 0 {
            let minus_one = pool.literal(-1.0);
            pool.set_kind(id, NodeKind::Pow(product, minus_one));
        } else {
            pool.replace(id, product);
        }
        true
    })
}

/// `x^(a+b)` becomes `x^a * x^b`.
pub fn expand_exponent_sums(pool: &mut ExprPool, root: ExprId) -> bool {
    bottom_up(pool, root, |pool, id| {
        let (base, exp) = match *pool.kind(id) {
            NodeKind::Pow(base, exp) => (base, exp),
            _ => return false,
        };
        let (a, b) = match *pool.kind(exp) {
            NodeKind::Add(a, b) => (a, b),
            _ => return false,
        };

        let first = pool.pow(base, a);
        let base_copy = pool.dup(base);
        let second = pool.pow(base_copy, b);
        pool.set_kind(id, NodeKind::Mul(first, second));
        true
    })
}

/// `(a*b)^x` becomes `a^x * b^x`.
pub fn expand_exponent_products(pool: &mut ExprPool, root: ExprId) -> bool {
    bottom_up(pool, root, |pool, id| {
        let (base, exp) = match *pool.kind(id) {
            NodeKind::Pow(base, exp) => (base, exp),
            _ => return false,
        };
        let (a, b) = match *pool.kind(base) {
            NodeKind::Mul(a, b) => (a, b),
            _ => return false,
        };

        let first = pool.pow(a, exp);
        let exp_copy = pool.dup(exp);
        let second = pool.pow(b, exp_copy);
        pool.set_kind(id, NodeKind::Mul(first, second));
        true
    })
}

/// `s*(a+b)` and `(a+b)*s` become `s*a + s*b`.
pub fn distribute_products(pool: &mut ExprPool, root: ExprId) -> bool {
    bottom_up(pool, root, |pool, id| {
        let (l, r) = match *pool.kind(id) {
            NodeKind::Mul(l, r) => (l, r),
            _ => return false,
        };
        let (factor, a, b) = match (pool.kind(l), pool.kind(r)) {
            (NodeKind::Add(a, b), _) => (r, *a, *b),
            (_, NodeKind::Add(a, b)) => (l, *a, *b),
            _ => return false,
        };

        let first = pool.mul(factor, a);
        let factor_copy = pool.dup(factor);
        let second = pool.mul(factor_copy, b);
        pool.set_kind(id, NodeKind::Add(first, second));
        true
    })
}

//! Helpers for treating nested binary sums and products as flat chains.

use crate::expr::{ExprId, ExprPool, NodeKind};

/// Associative operator whose nested uses form a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOp {
    Add,
    Mul,
}

impl ChainOp {
    /// Operands if `kind` is this operator.
    pub fn split(self, kind: &NodeKind) -> Option<(ExprId, ExprId)> {
        match (self, kind) {
            (ChainOp::Add, NodeKind::Add(l, r)) | (ChainOp::Mul, NodeKind::Mul(l, r)) => Some((*l, *r)),
            _ => None,
        }
    }

    pub fn identity(self) -> f64 {
        match self {
            ChainOp::Add => 0.0,
            ChainOp::Mul => 1.0,
        }
    }

    pub fn combine(self, a: f64, b: f64) -> f64 {
        match self {
            ChainOp::Add => a + b,
            ChainOp::Mul => a * b,
        }
    }

    pub fn kind(self, left: ExprId, right: ExprId) -> NodeKind {
        match self {
            ChainOp::Add => NodeKind::Add(left, right),
            ChainOp::Mul => NodeKind::Mul(left, right),
        }
    }
}

/// True if `id` is an `op` node whose parent is not.
pub fn is_chain_top(pool: &ExprPool, id: ExprId, op: ChainOp) -> bool {
    if op.split(pool.kind(id)).is_none() {
        return false;
    }
    match pool.parent(id) {
        Some(parent) => op.split(pool.kind(parent)).is_none(),
        None => true,
    }
}

/// Operands of the chain rooted at `id`, left to right.
///
/// A node that is not an `op` node is a chain of one.
pub fn operands(pool: &ExprPool, id: ExprId, op: ChainOp) -> Vec<ExprId> {
    let mut out = Vec::new();
    collect(pool, id, op, &mut out);
    out
}

fn collect(pool: &ExprPool, id: ExprId, op: ChainOp, out: &mut Vec<ExprId>) {
    match op.split(pool.kind(id)) {
        Some((l, r)) => {
            collect(pool, l, op, out);
            collect(pool, r, op, out);
        }
        None => out.push(id),
    }
}

/// Rewrite the node `top` into a left-leaning chain over `operands`.
///
/// An empty list becomes the identity literal.
pub fn rebuild(pool: &mut ExprPool, top: ExprId, op: ChainOp, operands: &[ExprId]) {
    match operands {
        [] => pool.set_literal(top, op.identity()),
        [single] => pool.replace(top, *single),
        [first, middle @ .., last] => {
            let mut acc = *first;
            for &operand in middle {
                acc = pool.insert(op.kind(acc, operand));
            }
            pool.set_kind(top, op.kind(acc, *last));
        }
    }
}

/// Build a fresh chain node over `operands`, or the identity literal.
pub fn build(pool: &mut ExprPool, op: ChainOp, operands: &[ExprId]) -> ExprId {
    match operands.split_first() {
        None => pool.literal(op.identity()),
        Some((&first, rest)) => rest
            .iter()
            .fold(first, |acc, &operand| pool.insert(op.kind(acc, operand))),
    }
}

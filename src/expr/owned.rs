//! Owned expression: a pool together with the root of its tree.

use std::fmt;

use super::pool::{ExprId, ExprPool, FlatExpr, NodeKind};
use super::{Lexer, Parser};
use crate::error::Result;
use crate::vars::VarTable;

/// An expression tree that owns its node pool.
///
/// Graph edges, variable-table entries and pipeline stages each hold one of
/// these; assigning a new value drops the previous pool.
#[derive(Debug)]
pub struct Expr {
    pool: ExprPool,
    root: ExprId,
}

impl Expr {
    /// Parse expression text.
    pub fn parse(text: &str) -> Result<Self> {
        let mut pool = ExprPool::new();
        let root = Parser::new(Lexer::new(text))?.parse(&mut pool)?;
        Ok(Self { pool, root })
    }

    /// Wrap an existing pool and root.
    pub fn from_parts(pool: ExprPool, root: ExprId) -> Self {
        Self { pool, root }
    }

    /// Copy a subtree of some pool into a fresh, compact expression.
    pub fn from_subtree(pool: &ExprPool, root: ExprId) -> Self {
        let mut own = ExprPool::new();
        let root = own.dup_from(pool, root);
        Self { pool: own, root }
    }

    pub fn literal(value: f64) -> Self {
        let mut pool = ExprPool::new();
        let root = pool.literal(value);
        Self { pool, root }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        let mut pool = ExprPool::new();
        let root = pool.variable(name);
        Self { pool, root }
    }

    pub fn infinity() -> Self {
        let mut pool = ExprPool::new();
        let root = pool.infinity();
        Self { pool, root }
    }

    /// Import a flat node list.
    pub fn from_flat(flat: &FlatExpr) -> Result<Self> {
        let mut pool = ExprPool::new();
        let root = pool.import_flat(flat)?;
        Ok(Self { pool, root })
    }

    /// Export as a flat node list.
    pub fn to_flat(&self) -> FlatExpr {
        self.pool.to_flat(self.root)
    }

    pub fn pool(&self) -> &ExprPool {
        &self.pool
    }

    pub fn root(&self) -> ExprId {
        self.root
    }

    /// Mutable access for rewrite passes. The root handle is stable across
    /// in-place rewrites.
    pub fn parts_mut(&mut self) -> (&mut ExprPool, ExprId) {
        (&mut self.pool, self.root)
    }

    pub fn into_parts(self) -> (ExprPool, ExprId) {
        (self.pool, self.root)
    }

    /// Collect nodes no longer reachable from the root.
    pub fn compact(&mut self) -> usize {
        self.pool.gc(&[self.root])
    }

    /// Literal value of the root, if the whole expression is a constant.
    pub fn literal_value(&self) -> Option<f64> {
        self.pool.literal_value(self.root)
    }

    pub fn is_infinity(&self) -> bool {
        matches!(self.pool.kind(self.root), NodeKind::Infinity)
    }

    pub fn contains_variable(&self, name: &str) -> bool {
        self.pool.contains_variable(self.root, name)
    }

    /// Evaluate numerically. Unbound or circular variables yield NaN.
    pub fn eval(&self, vars: &VarTable) -> f64 {
        vars.evaluate(&self.pool, self.root)
    }

    fn combine(&self, other: &Expr, op: fn(&mut ExprPool, ExprId, ExprId) -> ExprId) -> Expr {
        let mut pool = ExprPool::new();
        let left = pool.dup_from(&self.pool, self.root);
        let right = pool.dup_from(&other.pool, other.root);
        let root = op(&mut pool, left, right);
        Self { pool, root }
    }

    /// `self + other` as a new expression.
    pub fn add(&self, other: &Expr) -> Expr {
        self.combine(other, ExprPool::add)
    }

    /// `self * other` as a new expression.
    pub fn mul(&self, other: &Expr) -> Expr {
        self.combine(other, ExprPool::mul)
    }

    /// `self * other^-1` as a new expression.
    pub fn div(&self, other: &Expr) -> Expr {
        self.combine(other, ExprPool::div)
    }

    /// `-self` as a new expression.
    pub fn neg(&self) -> Expr {
        let mut pool = ExprPool::new();
        let x = pool.dup_from(&self.pool, self.root);
        let root = pool.neg(x);
        Self { pool, root }
    }
}

impl Clone for Expr {
    fn clone(&self) -> Self {
        Self::from_subtree(&self.pool, self.root)
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.pool.equal(self.root, &other.pool, other.root)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pool.display(self.root))
    }
}

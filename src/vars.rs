//! Variable table: symbol bindings, evaluation and substitution.
//!
//! A symbol is bound to an owned [`Expr`], which may be a plain literal, the
//! infinity marker `oo` or an arbitrary sub-expression referring to other
//! symbols. Evaluation and substitution both follow bindings recursively
//! and detect circular definitions.

use std::collections::BTreeMap;

use crate::error::{Result, SfgError};
use crate::expr::{Expr, ExprId, ExprPool, NodeKind};

#[derive(Debug, Clone)]
struct Entry {
    expr: Expr,
    visited: bool,
}

/// Mapping from symbol names to bound expressions.
///
/// Iteration order is sorted by name.
#[derive(Debug, Clone, Default)]
pub struct VarTable {
    entries: BTreeMap<String, Entry>,
}

impl VarTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Bind a symbol to a constant.
    pub fn set_literal(&mut self, name: impl Into<String>, value: f64) {
        self.set_expr(name, Expr::literal(value));
    }

    /// Bind a symbol to an expression, taking ownership of it.
    ///
    /// Any previous binding is dropped first.
    pub fn set_expr(&mut self, name: impl Into<String>, expr: Expr) {
        let name = name.into();
        self.entries.remove(&name);
        self.entries.insert(name, Entry { expr, visited: false });
    }

    /// Parse `text` and bind the result.
    pub fn set_parsed(&mut self, name: impl Into<String>, text: &str) -> Result<()> {
        let expr = Expr::parse(text)?;
        self.set_expr(name, expr);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Expr> {
        self.entries.remove(name).map(|e| e.expr)
    }

    pub fn get(&self, name: &str) -> Option<&Expr> {
        self.entries.get(name).map(|e| &e.expr)
    }

    /// Iterate over bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Expr)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), &e.expr))
    }

    /// Check whether a symbol is bound to `oo`.
    pub fn is_infinity(&self, name: &str) -> bool {
        self.get(name).map_or(false, Expr::is_infinity)
    }

    /// Names of all symbols bound to `oo`, in name order.
    pub fn infinite_names(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, expr)| expr.is_infinity())
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Evaluate a bound symbol. Unbound or circular symbols yield NaN.
    pub fn eval(&self, name: &str) -> f64 {
        self.eval_symbol(name, &mut Vec::new())
    }

    /// Evaluate a subtree of any pool against this table.
    pub fn evaluate(&self, pool: &ExprPool, id: ExprId) -> f64 {
        self.eval_node(pool, id, &mut Vec::new())
    }

    fn eval_symbol(&self, name: &str, active: &mut Vec<String>) -> f64 {
        let entry = match self.entries.get(name) {
            Some(entry) => entry,
            None => return f64::NAN,
        };
        if active.iter().any(|n| n == name) {
            log::debug!("circular binding while evaluating '{}'", name);
            return f64::NAN;
        }

        active.push(name.to_string());
        let value = self.eval_node(entry.expr.pool(), entry.expr.root(), active);
        active.pop();
        value
    }

    fn eval_node(&self, pool: &ExprPool, id: ExprId, active: &mut Vec<String>) -> f64 {
        match pool.kind(id) {
            NodeKind::Literal(v) => *v,
            NodeKind::Infinity => f64::INFINITY,
            NodeKind::Variable(name) => self.eval_symbol(name, active),
            NodeKind::Negate(x) => -self.eval_node(pool, *x, active),
            NodeKind::Add(l, r) => self.eval_node(pool, *l, active) + self.eval_node(pool, *r, active),
            NodeKind::Mul(l, r) => self.eval_node(pool, *l, active) * self.eval_node(pool, *r, active),
            NodeKind::Pow(b, e) => self.eval_node(pool, *b, active).powf(self.eval_node(pool, *e, active)),
        }
    }

    /// Replace every bound symbol in `expr` with a copy of its binding,
    /// recursively. Symbols bound to `oo` are left in place for limit
    /// evaluation.
    ///
    /// All-or-nothing: on a circular binding `expr` is left untouched.
    pub fn insert_substitutions(&self, expr: &mut Expr) -> Result<()> {
        let mut pool = expr.pool().clone();
        let root = expr.root();
        self.substitute(&mut pool, root, &mut Vec::new())?;
        pool.gc(&[root]);
        *expr = Expr::from_parts(pool, root);
        Ok(())
    }

    fn substitute(&self, pool: &mut ExprPool, id: ExprId, active: &mut Vec<String>) -> Result<()> {
        let kind = pool.kind(id).clone();
        if let NodeKind::Variable(name) = kind {
            let entry = match self.entries.get(&name) {
                Some(entry) if !entry.expr.is_infinity() => entry,
                _ => return Ok(()),
            };
            if active.contains(&name) {
                return Err(SfgError::CircularSubstitution { name });
            }

            let copy = pool.dup_from(entry.expr.pool(), entry.expr.root());
            active.push(name);
            self.substitute(pool, copy, active)?;
            active.pop();
            pool.replace(id, copy);
            return Ok(());
        }

        for child in kind.children().into_iter().flatten() {
            self.substitute(pool, child, active)?;
        }
        Ok(())
    }

    /// Clear the visited mark of every entry.
    pub fn reset_visited(&mut self) {
        for entry in self.entries.values_mut() {
            entry.visited = false;
        }
    }

    /// Make sure every symbol in the subtree has an entry and mark it visited.
    ///
    /// New symbols default to 1 when they are the right operand of a product
    /// or an exponent, and to 0 otherwise. Existing values are kept.
    pub fn populate(&mut self, pool: &ExprPool, id: ExprId) {
        for node in pool.subtree(id) {
            let name = match pool.kind(node) {
                NodeKind::Variable(name) => name,
                _ => continue,
            };
            if let Some(entry) = self.entries.get_mut(name) {
                entry.visited = true;
                continue;
            }

            let is_right_operand = pool.parent(node).map_or(false, |p| match pool.kind(p) {
                NodeKind::Mul(_, r) | NodeKind::Pow(_, r) => *r == node,
                _ => false,
            });
            let default = if is_right_operand { 1.0 } else { 0.0 };
            log::trace!("new parameter '{}' defaults to {}", name, default);
            self.entries.insert(
                name.clone(),
                Entry {
                    expr: Expr::literal(default),
                    visited: true,
                },
            );
        }
    }

    /// Drop every entry that was not visited since the last reset.
    pub fn erase_unvisited(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.visited);
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_eval_follows_bindings() {
        let mut vars = VarTable::new();
        vars.set_parsed("tau", "R * C").unwrap();
        vars.set_literal("R", 1000.0);
        vars.set_literal("C", 1e-6);
        assert_relative_eq!(vars.eval("tau"), 1e-3);

        let expr = Expr::parse("1 / (1 + tau)").unwrap();
        assert_relative_eq!(expr.eval(&vars), 1.0 / 1.001);
    }

    #[test]
    fn test_eval_cycle_is_nan() {
        let mut vars = VarTable::new();
        vars.set_parsed("a", "b + 1").unwrap();
        vars.set_parsed("b", "2 * a").unwrap();
        assert!(vars.eval("a").is_nan());
        assert!(vars.eval("missing").is_nan());
    }

    #[test]
    fn test_same_symbol_twice_is_not_a_cycle() {
        let mut vars = VarTable::new();
        vars.set_literal("x", 3.0);
        vars.set_parsed("y", "x * x").unwrap();
        assert_relative_eq!(vars.eval("y"), 9.0);
    }

    #[test]
    fn test_rebinding_replaces_value() {
        let mut vars = VarTable::new();
        vars.set_parsed("k", "a + b").unwrap();
        vars.set_literal("k", 5.0);
        assert_eq!(vars.len(), 1);
        assert_eq!(vars.get("k").and_then(Expr::literal_value), Some(5.0));
    }

    #[test]
    fn test_insert_substitutions_recursive() {
        let mut vars = VarTable::new();
        vars.set_parsed("G", "K * H").unwrap();
        vars.set_parsed("H", "1 / (1 + s * T)").unwrap();
        vars.set_literal("K", 2.0);
        vars.set_expr("A", Expr::infinity());

        let mut expr = Expr::parse("G / (1 + G * A)").unwrap();
        vars.insert_substitutions(&mut expr).unwrap();
        assert!(!expr.contains_variable("G"));
        assert!(!expr.contains_variable("H"));
        assert!(!expr.contains_variable("K"));
        assert!(expr.contains_variable("A"));
        assert!(expr.contains_variable("s"));
    }

    #[test]
    fn test_insert_substitutions_is_transactional() {
        let mut vars = VarTable::new();
        vars.set_parsed("a", "b + 1").unwrap();
        vars.set_parsed("b", "a * 2").unwrap();

        let mut expr = Expr::parse("a + c").unwrap();
        let before = expr.clone();
        let err = vars.insert_substitutions(&mut expr).unwrap_err();
        assert!(matches!(err, SfgError::CircularSubstitution { .. }));
        assert_eq!(expr, before);
    }

    #[test]
    fn test_populate_and_erase_unvisited() {
        let mut vars = VarTable::new();
        vars.set_literal("stale", 7.0);
        vars.set_literal("a", 4.0);

        let expr = Expr::parse("a + b * c + d^e").unwrap();
        vars.reset_visited();
        vars.populate(expr.pool(), expr.root());
        assert_eq!(vars.erase_unvisited(), 1);

        assert!(!vars.contains("stale"));
        assert_eq!(vars.get("a").and_then(Expr::literal_value), Some(4.0));
        assert_eq!(vars.get("b").and_then(Expr::literal_value), Some(0.0));
        assert_eq!(vars.get("c").and_then(Expr::literal_value), Some(1.0));
        assert_eq!(vars.get("d").and_then(Expr::literal_value), Some(0.0));
        assert_eq!(vars.get("e").and_then(Expr::literal_value), Some(1.0));
    }

    #[test]
    fn test_infinite_names() {
        let mut vars = VarTable::new();
        vars.set_expr("gain", Expr::infinity());
        vars.set_literal("x", 1.0);
        vars.set_expr("A", Expr::infinity());
        assert_eq!(vars.infinite_names(), vec!["A".to_string(), "gain".to_string()]);
        assert!(vars.is_infinity("A"));
        assert!(!vars.is_infinity("x"));
    }
}

//! Standard transfer-function form: explicit polynomials over polynomials.

use crate::error::{Result, SfgError};
use crate::expr::{Expr, ExprId, ExprPool, NodeKind};
use crate::rewrite::chain::{self, ChainOp};
use crate::rewrite::{
    integer_literal, RewriteConfig, EXPAND, EXPAND_EXPONENTS, FACTOR, LOWER, OPTIMIZE, SIMPLIFY,
};

/// Move reciprocal factors across the fraction bar.
///
/// Every factor `b^c` with literal `c < 0` in the top-level product of
/// either side is replaced by `1` and `b^(-c)` is multiplied into the other
/// side. Returns whether anything moved.
pub fn rebalance_fraction(num: &mut Expr, den: &mut Expr) -> Result<bool> {
    let to_den = take_reciprocals(num);
    for factor in &to_den {
        multiply_into(den, factor);
    }
    let to_num = take_reciprocals(den);
    for factor in &to_num {
        multiply_into(num, factor);
    }

    let moved = to_den.len() + to_num.len();
    if moved == 0 {
        return Ok(false);
    }
    log::trace!("moved {} reciprocal factors", moved);
    let config = RewriteConfig::default();
    OPTIMIZE.run_expr(num, &config)?;
    OPTIMIZE.run_expr(den, &config)?;
    Ok(true)
}

/// Neutralise the reciprocal factors of `expr`, returning them inverted.
fn take_reciprocals(expr: &mut Expr) -> Vec<Expr> {
    let (pool, root) = expr.parts_mut();
    let mut taken = Vec::new();
    for factor in chain::operands(pool, root, ChainOp::Mul) {
        let (base, c) = match *pool.kind(factor) {
            NodeKind::Pow(base, exp) => match pool.literal_value(exp) {
                Some(c) if c < 0.0 => (base, c),
                _ => continue,
            },
            _ => continue,
        };

        let mut inverted = ExprPool::new();
        let b = inverted.dup_from(pool, base);
        let e = inverted.literal(-c);
        let root = inverted.pow(b, e);
        taken.push(Expr::from_parts(inverted, root));
        pool.set_literal(factor, 1.0);
    }
    taken
}

/// `expr = expr * factor`, keeping the root handle.
fn multiply_into(expr: &mut Expr, factor: &Expr) {
    let (pool, root) = expr.parts_mut();
    let kind = pool.kind(root).clone();
    let previous = pool.insert(kind);
    let copy = pool.dup_from(factor.pool(), factor.root());
    pool.set_kind(root, NodeKind::Mul(previous, copy));
}

/// True if `id` only combines `var` through sums, products and
/// non-negative integer powers.
pub fn is_polynomial(pool: &ExprPool, id: ExprId, var: &str) -> bool {
    match *pool.kind(id) {
        NodeKind::Literal(_) | NodeKind::Infinity | NodeKind::Variable(_) => true,
        NodeKind::Negate(x) => is_polynomial(pool, x, var),
        NodeKind::Add(l, r) | NodeKind::Mul(l, r) => {
            is_polynomial(pool, l, var) && is_polynomial(pool, r, var)
        }
        NodeKind::Pow(base, exp) => {
            if !pool.contains_variable(id, var) {
                return true;
            }
            integer_literal(pool, exp).map_or(false, |k| k >= 0) && is_polynomial(pool, base, var)
        }
    }
}

/// Rewrite `expr` into `(numerator, denominator)`, both explicit
/// polynomials in `var`.
///
/// Alternates lowering, exponent expansion, common-denominator factoring
/// and reciprocal rebalancing until nothing moves, then expands and
/// simplifies each side. Fails with [`SfgError::NotPolynomial`] when `var`
/// is still reachable through something other than arithmetic.
pub fn to_standard_tf(expr: &Expr, var: &str, config: &RewriteConfig) -> Result<(Expr, Expr)> {
    let mut num = expr.clone();
    let mut den = Expr::literal(1.0);

    let mut rounds = 0;
    loop {
        for side in [&mut num, &mut den] {
            LOWER.run_expr(side, config)?;
            EXPAND_EXPONENTS.run_expr(side, config)?;
            FACTOR.run_expr(side, config)?;
            OPTIMIZE.run_expr(side, config)?;
        }
        if !rebalance_fraction(&mut num, &mut den)? {
            break;
        }
        rounds += 1;
        if rounds >= config.max_iterations {
            return Err(SfgError::RewriteDidNotConverge {
                group: "standardize",
                iterations: rounds,
            });
        }
    }
    log::debug!("standard form after {} rebalancing rounds", rounds);

    for side in [&mut num, &mut den] {
        EXPAND.run_expr(side, config)?;
        SIMPLIFY.run_expr(side, config)?;
    }

    let polynomial = |e: &Expr| is_polynomial(e.pool(), e.root(), var);
    if !polynomial(&num) || !polynomial(&den) {
        return Err(SfgError::not_polynomial(var));
    }
    Ok((num, den))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vars::VarTable;
    use approx::assert_relative_eq;

    fn vars() -> VarTable {
        let mut vars = VarTable::new();
        for (name, value) in [("a", 1.5), ("b", -2.0), ("c", 0.25), ("s", 0.8)] {
            vars.set_literal(name, value);
        }
        vars
    }

    fn assert_standard(text: &str) -> (Expr, Expr) {
        let expr = Expr::parse(text).unwrap();
        let (num, den) = to_standard_tf(&expr, "s", &RewriteConfig::default()).unwrap();
        let v = vars();
        assert_relative_eq!(num.eval(&v) / den.eval(&v), expr.eval(&v), max_relative = 1e-9);
        assert!(is_polynomial(num.pool(), num.root(), "s"), "{}", num);
        assert!(is_polynomial(den.pool(), den.root(), "s"), "{}", den);
        (num, den)
    }

    #[test]
    fn test_rebalance_moves_reciprocals() {
        let mut num = Expr::parse("a * s^-2").unwrap();
        let mut den = Expr::parse("b * c^-1").unwrap();
        assert!(rebalance_fraction(&mut num, &mut den).unwrap());
        assert_eq!(num.to_string(), "a * c");
        assert_eq!(den.to_string(), "b * s^2");
        assert!(!rebalance_fraction(&mut num, &mut den).unwrap());
    }

    #[test]
    fn test_sum_with_reciprocal() {
        let (_, den) = assert_standard("a + b / s");
        assert_eq!(den.to_string(), "s");
    }

    #[test]
    fn test_nested_fraction() {
        assert_standard("1 / (1 + 1 / s)");
        assert_standard("a / (s + c / (s + b))");
    }

    #[test]
    fn test_polynomial_is_unchanged_in_value() {
        let (_, den) = assert_standard("(a + s) * (b + s)");
        assert_eq!(den.literal_value(), Some(1.0));
    }

    #[test]
    fn test_non_polynomial_fails() {
        let expr = Expr::parse("s^a + 1").unwrap();
        let err = to_standard_tf(&expr, "s", &RewriteConfig::default()).unwrap_err();
        assert!(matches!(err, SfgError::NotPolynomial { .. }));
    }

    #[test]
    fn test_is_polynomial() {
        let expr = Expr::parse("a^0.5 * s * s + s^2").unwrap();
        assert!(is_polynomial(expr.pool(), expr.root(), "s"));
        let expr = Expr::parse("a + s^-1").unwrap();
        assert!(!is_polynomial(expr.pool(), expr.root(), "s"));
    }
}

//! Conversion of expressions into ratios of polynomials.

use super::poly::{degree, poly_add, poly_into, poly_mul, poly_negate, Coeff, Poly};
use crate::error::{Result, SfgError};
use crate::expr::{Expr, ExprId, ExprPool, NodeKind};
use crate::rewrite::integer_literal;
use crate::vars::VarTable;

/// `num(var) / den(var)` with symbolic coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct RationalExpr {
    pub num: Poly,
    pub den: Poly,
}

impl RationalExpr {
    pub fn new(num: Poly, den: Poly) -> Self {
        Self { num, den }
    }

    /// A constant `value / 1`.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![Coeff::constant(value)], vec![Coeff::constant(1.0)])
    }

    /// Highest non-zero degree of numerator and denominator.
    pub fn degree(&self) -> (Option<usize>, Option<usize>) {
        (degree(&self.num), degree(&self.den))
    }

    /// Every coefficient expression, numerator first.
    pub fn coefficient_exprs(&self) -> impl Iterator<Item = &Expr> {
        self.num.iter().chain(self.den.iter()).filter_map(|c| c.expr.as_ref())
    }

    pub fn coefficient_exprs_mut(&mut self) -> impl Iterator<Item = &mut Expr> {
        self.num
            .iter_mut()
            .chain(self.den.iter_mut())
            .filter_map(|c| c.expr.as_mut())
    }

    /// True for the symbolic `0/0` produced by an indeterminate limit.
    pub fn is_indeterminate(&self) -> bool {
        degree(&self.num).is_none() && degree(&self.den).is_none()
    }

    fn mul(&self, other: &Self) -> Self {
        Self::new(poly_mul(&self.num, &other.num), poly_mul(&self.den, &other.den))
    }

    fn reciprocal(self) -> Self {
        Self::new(self.den, self.num)
    }
}

/// Convert `expr` into a ratio of polynomials in `var`.
///
/// Every other symbol ends up inside a coefficient. Fails with
/// [`SfgError::NotPolynomial`] when `var` sits under an exponent that is not
/// an integer literal.
pub fn to_rational(expr: &Expr, var: &str) -> Result<RationalExpr> {
    convert(expr.pool(), expr.root(), var)
}

fn convert(pool: &ExprPool, id: ExprId, var: &str) -> Result<RationalExpr> {
    let one = || vec![Coeff::constant(1.0)];
    match pool.kind(id) {
        NodeKind::Literal(v) => Ok(RationalExpr::constant(*v)),
        NodeKind::Infinity => Ok(RationalExpr::new(vec![Coeff::symbolic(1.0, Expr::infinity())], one())),
        NodeKind::Variable(name) if name == var => {
            Ok(RationalExpr::new(vec![Coeff::zero(), Coeff::constant(1.0)], one()))
        }
        NodeKind::Variable(name) => Ok(RationalExpr::new(
            vec![Coeff::symbolic(1.0, Expr::variable(name.clone()))],
            one(),
        )),
        NodeKind::Negate(x) => {
            let mut r = convert(pool, *x, var)?;
            poly_negate(&mut r.num);
            Ok(r)
        }
        NodeKind::Add(l, r) => {
            // N1/D1 + N2/D2 = (N1*D2 + N2*D1) / (D1*D2)
            let a = convert(pool, *l, var)?;
            let b = convert(pool, *r, var)?;
            let num = poly_add(&poly_mul(&a.num, &b.den), &poly_mul(&b.num, &a.den));
            Ok(RationalExpr::new(num, poly_mul(&a.den, &b.den)))
        }
        NodeKind::Mul(l, r) => {
            let a = convert(pool, *l, var)?;
            let b = convert(pool, *r, var)?;
            Ok(a.mul(&b))
        }
        NodeKind::Pow(base, exp) => {
            let k = match integer_literal(pool, *exp) {
                Some(k) => k,
                // an exponent not involving `var` is just another coefficient
                None if !pool.contains_variable(id, var) => {
                    return Ok(RationalExpr::new(
                        vec![Coeff::symbolic(1.0, Expr::from_subtree(pool, id))],
                        one(),
                    ));
                }
                None => return Err(SfgError::not_polynomial(var)),
            };
            if k == 0 {
                return Ok(RationalExpr::constant(1.0));
            }

            let mut factor = convert(pool, *base, var)?;
            if k < 0 {
                factor = factor.reciprocal();
            }
            let mut result = factor.clone();
            for _ in 1..k.unsigned_abs() {
                result = result.mul(&factor);
            }
            Ok(result)
        }
    }
}

/// Convert and take the limit `var → ∞`.
///
/// Compares the highest non-zero coefficients of both sides: equal degrees
/// give their ratio, a higher numerator gives `±oo / 1`, a higher
/// denominator gives `0 / 1`. Two zero polynomials give the symbolic
/// `0 / 0`.
pub fn to_rational_limit(expr: &Expr, var: &str) -> Result<RationalExpr> {
    let r = to_rational(expr, var)?;
    let sign_of = |c: &Coeff| if c.factor < 0.0 { -1.0 } else { 1.0 };
    let infinite = |sign: f64| vec![Coeff::symbolic(sign, Expr::infinity())];

    let limit = match r.degree() {
        (None, None) => RationalExpr::new(vec![Coeff::zero()], vec![Coeff::zero()]),
        (Some(n), None) => RationalExpr::new(infinite(sign_of(&r.num[n])), vec![Coeff::zero()]),
        (None, Some(_)) => RationalExpr::constant(0.0),
        (Some(n), Some(d)) if n > d => {
            RationalExpr::new(infinite(sign_of(&r.num[n])), vec![Coeff::constant(1.0)])
        }
        (Some(n), Some(d)) if n < d => RationalExpr::constant(0.0),
        (Some(n), Some(d)) => RationalExpr::new(vec![r.num[n].clone()], vec![r.den[d].clone()]),
    };
    log::trace!("limit {} -> oo: degrees {:?}", var, r.degree());
    Ok(limit)
}

/// Take the limit `name → ∞` for every symbol bound to `oo` in `vars`, in
/// name order. Returns `None` when no symbol is bound to `oo`.
pub fn to_rational_limits(expr: &Expr, vars: &VarTable) -> Result<Option<RationalExpr>> {
    let mut result: Option<RationalExpr> = None;
    for name in vars.infinite_names() {
        let current = match &result {
            Some(r) => rational_to_expr(r, &name),
            None => expr.clone(),
        };
        result = Some(to_rational_limit(&current, &name)?);
    }
    Ok(result)
}

/// `expr` with all `oo`-bound symbols taken to their limits.
pub fn apply_limits(expr: &Expr, vars: &VarTable) -> Result<Expr> {
    // a limit leaves constant polynomials, so the variable name never shows
    Ok(match to_rational_limits(expr, vars)? {
        Some(r) => rational_to_expr(&r, "_"),
        None => expr.clone(),
    })
}

/// `num / den` as a single expression in `var`.
pub fn rational_to_expr(r: &RationalExpr, var: &str) -> Expr {
    let mut pool = ExprPool::new();
    let num = poly_into(&mut pool, &r.num, var);
    let den = poly_into(&mut pool, &r.den, var);
    let root = pool.div(num, den);
    Expr::from_parts(pool, root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn vars(values: &[(&str, f64)]) -> VarTable {
        let mut vars = VarTable::new();
        for &(name, value) in values {
            vars.set_literal(name, value);
        }
        vars
    }

    fn eval_poly(poly: &[Coeff], vars: &VarTable) -> Vec<f64> {
        poly.iter().map(|c| c.eval(vars)).collect()
    }

    #[test]
    fn test_product_of_sums() {
        let expr = Expr::parse("(a + b) * (c + s)").unwrap();
        let r = to_rational(&expr, "s").unwrap();
        let (a, b, c) = (2.0, 3.0, 5.0);
        let v = vars(&[("a", a), ("b", b), ("c", c)]);
        assert_eq!(eval_poly(&r.num, &v), vec![a * c + b * c, a + b]);
        assert_eq!(eval_poly(&r.den, &v), vec![1.0]);
    }

    #[test]
    fn test_reciprocal_swaps_sides() {
        let expr = Expr::parse("K / (1 + s * T)^2").unwrap();
        let r = to_rational(&expr, "s").unwrap();
        let v = vars(&[("K", 4.0), ("T", 0.5)]);
        assert_eq!(eval_poly(&r.num, &v), vec![4.0]);
        assert_eq!(eval_poly(&r.den, &v), vec![1.0, 1.0, 0.25]);
        assert_eq!(r.degree(), (Some(0), Some(2)));
    }

    #[test]
    fn test_not_polynomial() {
        let expr = Expr::parse("s^a").unwrap();
        assert!(matches!(
            to_rational(&expr, "s"),
            Err(SfgError::NotPolynomial { .. })
        ));

        // a fractional power of something without `s` is a coefficient
        let expr = Expr::parse("R^0.5 * s").unwrap();
        let r = to_rational(&expr, "s").unwrap();
        let v = vars(&[("R", 9.0)]);
        assert_eq!(eval_poly(&r.num, &v), vec![0.0, 3.0]);
    }

    #[test]
    fn test_limit_zero_over_zero() {
        let expr = Expr::parse("(0*x^2 + 0*x)/(0*x^2 + 0*x)").unwrap();
        let r = to_rational_limit(&expr, "x").unwrap();
        assert_eq!(r.num, vec![Coeff::zero()]);
        assert_eq!(r.den, vec![Coeff::zero()]);
        assert!(r.is_indeterminate());
    }

    #[test]
    fn test_limit_equal_degrees() {
        let expr = Expr::parse("(a*x^2 + b*x)/(c*x^2 + d*x)").unwrap();
        let r = to_rational_limit(&expr, "x").unwrap();
        assert_eq!(r.num, vec![Coeff::symbolic(1.0, Expr::variable("a"))]);
        assert_eq!(r.den, vec![Coeff::symbolic(1.0, Expr::variable("c"))]);
    }

    #[test]
    fn test_limit_diverging_and_vanishing() {
        let r = to_rational_limit(&Expr::parse("(0*x^2 + 0*x)/(c*x^2 + d*x)").unwrap(), "x").unwrap();
        assert_eq!(r, RationalExpr::constant(0.0));

        let r = to_rational_limit(&Expr::parse("-2*x^2 / (x + 1)").unwrap(), "x").unwrap();
        assert_eq!(r.num, vec![Coeff::symbolic(-1.0, Expr::infinity())]);
        assert_eq!(r.den, vec![Coeff::constant(1.0)]);

        let r = to_rational_limit(&Expr::parse("b / (c*x + d)").unwrap(), "x").unwrap();
        assert_eq!(r, RationalExpr::constant(0.0));
    }

    #[test]
    fn test_limits_from_table() {
        // ideal op-amp: A -> oo turns the closed loop into -R2/R1
        let expr = Expr::parse("-A * R2 / (R1 + R2 + A * R1)").unwrap();
        let mut v = vars(&[("R1", 1000.0), ("R2", 4700.0)]);
        v.set_expr("A", Expr::infinity());

        let limited = apply_limits(&expr, &v).unwrap();
        assert!(!limited.contains_variable("A"));
        assert_relative_eq!(limited.eval(&v), -4.7, max_relative = 1e-12);
    }

    #[test]
    fn test_no_infinite_symbols() {
        let expr = Expr::parse("a / b").unwrap();
        assert!(to_rational_limits(&expr, &vars(&[("a", 1.0)])).unwrap().is_none());
        assert_eq!(apply_limits(&expr, &VarTable::new()).unwrap(), expr);
    }

    #[test]
    fn test_rational_to_expr() {
        let expr = Expr::parse("(a + s) / (s^2 + b)").unwrap();
        let r = to_rational(&expr, "s").unwrap();
        let back = rational_to_expr(&r, "s");
        let v = vars(&[("a", 0.5), ("b", 2.0), ("s", 1.5)]);
        assert_relative_eq!(back.eval(&v), expr.eval(&v), max_relative = 1e-12);
    }
}

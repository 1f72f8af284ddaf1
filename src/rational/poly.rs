//! Polynomials with symbolic coefficients.
//!
//! A coefficient is a constant factor times an optional expression; index
//! `i` of a polynomial holds the coefficient of `var^i`.

use crate::expr::{Expr, ExprId, ExprPool};
use crate::vars::VarTable;

/// `factor * expr`, or just `factor` when there is no expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Coeff {
    pub factor: f64,
    pub expr: Option<Expr>,
}

impl Coeff {
    pub fn constant(factor: f64) -> Self {
        Self { factor, expr: None }
    }

    pub fn symbolic(factor: f64, expr: Expr) -> Self {
        Self {
            factor,
            expr: Some(expr),
        }
    }

    pub fn zero() -> Self {
        Self::constant(0.0)
    }

    /// A coefficient is zero when its factor is, whatever its expression.
    pub fn is_zero(&self) -> bool {
        self.factor == 0.0
    }

    /// The coefficient as a single expression.
    pub fn to_expr(&self) -> Expr {
        match &self.expr {
            Some(e) if self.factor == 1.0 => e.clone(),
            Some(e) => Expr::literal(self.factor).mul(e),
            None => Expr::literal(self.factor),
        }
    }

    /// Numeric value under `vars`.
    pub fn eval(&self, vars: &VarTable) -> f64 {
        match &self.expr {
            Some(e) if self.factor != 0.0 => self.factor * e.eval(vars),
            _ => self.factor,
        }
    }
}

/// Polynomial in one variable, lowest degree first.
pub type Poly = Vec<Coeff>;

/// Sum of two coefficients.
pub fn add_coeffs(a: &Coeff, b: &Coeff) -> Coeff {
    if a.is_zero() {
        return if b.is_zero() { Coeff::zero() } else { b.clone() };
    }
    if b.is_zero() {
        return a.clone();
    }
    match (&a.expr, &b.expr) {
        (None, None) => Coeff::constant(a.factor + b.factor),
        (Some(x), Some(y)) if a.factor == b.factor && x == y => Coeff::symbolic(a.factor * 2.0, x.clone()),
        _ => Coeff::symbolic(1.0, a.to_expr().add(&b.to_expr())),
    }
}

/// Product of two coefficients.
pub fn mul_coeffs(a: &Coeff, b: &Coeff) -> Coeff {
    let factor = a.factor * b.factor;
    if factor == 0.0 {
        return Coeff::zero();
    }
    let expr = match (&a.expr, &b.expr) {
        (Some(x), Some(y)) => Some(x.mul(y)),
        (Some(x), None) | (None, Some(x)) => Some(x.clone()),
        (None, None) => None,
    };
    Coeff { factor, expr }
}

/// `p1 + p2`.
pub fn poly_add(p1: &[Coeff], p2: &[Coeff]) -> Poly {
    let len = p1.len().max(p2.len());
    (0..len)
        .map(|i| match (p1.get(i), p2.get(i)) {
            (Some(a), Some(b)) => add_coeffs(a, b),
            (Some(c), None) | (None, Some(c)) => c.clone(),
            (None, None) => Coeff::zero(),
        })
        .collect()
}

/// `p1 * p2`.
pub fn poly_mul(p1: &[Coeff], p2: &[Coeff]) -> Poly {
    if p1.is_empty() || p2.is_empty() {
        return Vec::new();
    }
    let mut out = vec![Coeff::zero(); p1.len() + p2.len() - 1];
    for (i, a) in p1.iter().enumerate() {
        for (j, b) in p2.iter().enumerate() {
            let product = mul_coeffs(a, b);
            if !product.is_zero() {
                out[i + j] = add_coeffs(&out[i + j], &product);
            }
        }
    }
    out
}

/// Negate every coefficient in place.
pub fn poly_negate(poly: &mut [Coeff]) {
    for c in poly.iter_mut() {
        c.factor = -c.factor;
    }
}

/// Highest index with a non-zero coefficient.
pub fn degree(poly: &[Coeff]) -> Option<usize> {
    poly.iter().rposition(|c| !c.is_zero())
}

/// Build `Σ c_i * var^i` into `pool`, skipping zero coefficients.
pub(crate) fn poly_into(pool: &mut ExprPool, poly: &[Coeff], var: &str) -> ExprId {
    let mut sum = None;
    for (i, c) in poly.iter().enumerate().filter(|(_, c)| !c.is_zero()) {
        let power = match i {
            0 => None,
            1 => Some(pool.variable(var)),
            _ => {
                let base = pool.variable(var);
                let exponent = pool.literal(i as f64);
                Some(pool.pow(base, exponent))
            }
        };
        let term = match power {
            Some(power) if c.expr.is_none() && c.factor == 1.0 => power,
            Some(power) => {
                let coeff = c.to_expr();
                let coeff = pool.dup_from(coeff.pool(), coeff.root());
                pool.mul(coeff, power)
            }
            None => {
                let coeff = c.to_expr();
                pool.dup_from(coeff.pool(), coeff.root())
            }
        };
        sum = Some(match sum {
            Some(acc) => pool.add(acc, term),
            None => term,
        });
    }
    sum.unwrap_or_else(|| pool.literal(0.0))
}

/// The polynomial as an expression in `var`.
pub fn poly_to_expr(poly: &[Coeff], var: &str) -> Expr {
    let mut pool = ExprPool::new();
    let root = poly_into(&mut pool, poly, var);
    Expr::from_parts(pool, root)
}

//! Rational functions: polynomials with symbolic coefficients.
//!
//! [`to_rational`] turns any arithmetic expression into a numerator and a
//! denominator polynomial in one variable, with every other symbol folded
//! into the coefficients. [`to_rational_limit`] additionally takes the limit
//! of that variable towards infinity, which is how ideal components (an
//! op-amp gain bound to `oo`, say) are eliminated.
//!
//! [`to_standard_tf`] reaches a polynomial-over-polynomial form through the
//! rewrite engine instead, keeping the expressions readable.

mod convert;
mod poly;
mod standard;

pub use convert::{
    apply_limits, rational_to_expr, to_rational, to_rational_limit, to_rational_limits, RationalExpr,
};
pub use poly::{add_coeffs, degree, mul_coeffs, poly_add, poly_mul, poly_negate, poly_to_expr, Coeff, Poly};
pub use standard::{is_polynomial, rebalance_fraction, to_standard_tf};

/// Variable of the Laplace domain.
pub const DEFAULT_TF_VARIABLE: &str = "s";

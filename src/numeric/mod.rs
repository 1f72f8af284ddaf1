//! Numeric backend: roots, linear algebra, partial fractions and transfer
//! functions with concrete parameter values.

mod matrix;
mod pfd;
mod poly;
mod tf;

pub use matrix::{CMatrix, LuDecomposition};
pub use pfd::{Pfd, PfdTerm};
pub use poly::{eval, eval_complex, find_roots, from_roots, make_monic, mul_complex, trim};
pub use tf::TransferFunction;

/// Smallest pivot magnitude accepted without a row swap.
pub const PIVOT_THRESHOLD: f64 = 1e-6;

/// Default convergence tolerance of the root finder.
pub const DEFAULT_ROOT_TOLERANCE: f64 = 1e-6;

/// Root finder iterations granted per polynomial coefficient.
pub const ROOT_ITERATIONS_PER_COEFF: usize = 100;

/// Configuration for the polynomial root finder.
#[derive(Debug, Clone)]
pub struct RootFinderConfig {
    /// Largest correction step still counted as converged.
    pub tolerance: f64,
    /// Fixed iteration budget. `None` scales the budget with the number of
    /// coefficients.
    pub max_iterations: Option<usize>,
}

impl Default for RootFinderConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_ROOT_TOLERANCE,
            max_iterations: None,
        }
    }
}

impl RootFinderConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set a fixed iteration budget.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Iteration budget for a polynomial with `coeff_count` coefficients.
    pub fn iterations_for(&self, coeff_count: usize) -> usize {
        self.max_iterations
            .unwrap_or(ROOT_ITERATIONS_PER_COEFF * coeff_count)
    }
}

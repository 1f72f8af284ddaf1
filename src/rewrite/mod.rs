//! Rewrite engine for symbolic expressions.
//!
//! A pass is a plain function over a pool and a root that rewrites nodes in
//! place and reports whether it changed anything. Passes are bundled into
//! named [`PassGroup`]s which are re-run until no pass reports a change.
//!
//! | Pass | Rule |
//! |------|------|
//! | `fold_constants` | evaluate operators on literals, combine literals in `+`/`*` chains |
//! | `remove_useless_ops` | `-(-x)=x`, `0+x=x`, `1*x=x`, `-1*x=-x`, `0*x=0`, `x^1=x`, `x^0=1`, `(-a)*(-b)=a*b`, `x*x^-1=1`, `(x^-1)^-1=x` |
//! | `expand_constant_exponents` | `x^n` → `x*x*...`, negative `n` keeps a `^-1` |
//! | `expand_exponent_sums` | `x^(a+b)` → `x^a * x^b` |
//! | `expand_exponent_products` | `(a*b)^x` → `a^x * b^x` |
//! | `distribute_products` | `s*(a+b)` → `s*a + s*b` |
//! | `lower_negates` | `-(a*b)` → `(-a)*b`, `-(x^a)` → `-1*x^a`, `-(a+b)` → `-a + -b` |
//! | `factor_common_denominator` | `a + b*s^-c` → `s^-c*(a*s^c + b)` |
//! | `simplify_products` | `x*x` → `x^2`, `x^a*x^b` → `x^(a+b)` |
//! | `simplify_sums` | `x+x` → `2*x`, `a*x + b*x` → `(a+b)*x` |
//!
//! Rewrites leave dead nodes in the pool; callers compact once the group
//! has finished.

pub(crate) mod chain;
mod expand;
mod factor;
mod fold;
mod simplify;
mod useless;

pub use expand::{
    distribute_products, expand_constant_exponents, expand_exponent_products, expand_exponent_sums,
};
pub use factor::{factor_common_denominator, lower_negates};
pub use fold::fold_constants;
pub use simplify::{simplify_products, simplify_sums};
pub use useless::remove_useless_ops;

use crate::error::{Result, SfgError};
use crate::expr::{Expr, ExprId, ExprPool};

/// Tolerance used when comparing literals against special values.
pub const LITERAL_TOLERANCE: f64 = 1e-7;

/// Default cap on fixpoint iterations per group run.
pub const DEFAULT_MAX_REWRITE_ITERATIONS: usize = 1000;

/// A rewrite pass. Returns true if the tree was modified.
pub type Pass = fn(&mut ExprPool, ExprId) -> bool;

/// Configuration for running pass groups.
#[derive(Debug, Clone)]
pub struct RewriteConfig {
    /// Maximum number of sweeps before a group is considered divergent.
    pub max_iterations: usize,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_REWRITE_ITERATIONS,
        }
    }
}

impl RewriteConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Named list of passes run together to a fixpoint.
#[derive(Debug, Clone, Copy)]
pub struct PassGroup {
    pub name: &'static str,
    pub passes: &'static [Pass],
}

/// Constant folding and removal of identity operations.
pub const OPTIMIZE: PassGroup = PassGroup {
    name: "optimize",
    passes: &[fold_constants as Pass, remove_useless_ops as Pass],
};

/// Exponent expansion without distribution.
pub const EXPAND_EXPONENTS: PassGroup = PassGroup {
    name: "expand-exponents",
    passes: &[
        expand_constant_exponents as Pass,
        expand_exponent_sums as Pass,
        expand_exponent_products as Pass,
    ],
};

/// Full expansion into a sum of products.
pub const EXPAND: PassGroup = PassGroup {
    name: "expand",
    passes: &[
        expand_constant_exponents as Pass,
        expand_exponent_sums as Pass,
        expand_exponent_products as Pass,
        distribute_products as Pass,
    ],
};

/// Pull reciprocals out of sums.
pub const FACTOR: PassGroup = PassGroup {
    name: "factor",
    passes: &[factor_common_denominator as Pass],
};

/// Push negations down onto factors.
pub const LOWER: PassGroup = PassGroup {
    name: "lower",
    passes: &[lower_negates as Pass],
};

/// Folding plus merging of repeated factors and summands.
pub const SIMPLIFY: PassGroup = PassGroup {
    name: "simplify",
    passes: &[
        fold_constants as Pass,
        remove_useless_ops as Pass,
        simplify_products as Pass,
        simplify_sums as Pass,
    ],
};

impl PassGroup {
    /// Run every pass repeatedly until none reports a change.
    ///
    /// Returns whether anything was modified.
    pub fn run(&self, pool: &mut ExprPool, root: ExprId, config: &RewriteConfig) -> Result<bool> {
        let mut modified = false;
        for iteration in 0..config.max_iterations {
            let mut changed = false;
            for pass in self.passes {
                changed |= pass(pool, root);
            }
            if !changed {
                log::trace!("group '{}' reached fixpoint after {} sweeps", self.name, iteration);
                return Ok(modified);
            }
            modified = true;
        }

        log::warn!(
            "group '{}' still changing after {} sweeps",
            self.name,
            config.max_iterations
        );
        Err(SfgError::RewriteDidNotConverge {
            group: self.name,
            iterations: config.max_iterations,
        })
    }

    /// Run on an owned expression and compact it afterwards.
    pub fn run_expr(&self, expr: &mut Expr, config: &RewriteConfig) -> Result<bool> {
        let (pool, root) = expr.parts_mut();
        let modified = self.run(pool, root, config)?;
        expr.compact();
        Ok(modified)
    }
}

/// Fold constants and drop identity operations with the default config.
pub fn optimize(expr: &mut Expr) -> Result<bool> {
    OPTIMIZE.run_expr(expr, &RewriteConfig::default())
}

/// Apply `rule` to every node below `root`, children before parents.
///
/// Rules may rewrite the node they are given and its subtree, never its
/// ancestors.
pub(crate) fn bottom_up(
    pool: &mut ExprPool,
    root: ExprId,
    mut rule: impl FnMut(&mut ExprPool, ExprId) -> bool,
) -> bool {
    let order: Vec<ExprId> = pool.subtree(root).into_iter().rev().collect();
    let mut changed = false;
    for id in order {
        if pool.contains(id) && rule(pool, id) {
            changed = true;
        }
    }
    changed
}

/// Literal test with [`LITERAL_TOLERANCE`].
pub(crate) fn is_literal(pool: &ExprPool, id: ExprId, value: f64) -> bool {
    pool.literal_value(id)
        .map_or(false, |v| (v - value).abs() < LITERAL_TOLERANCE)
}

/// Integer value of a literal, within [`LITERAL_TOLERANCE`].
pub(crate) fn integer_literal(pool: &ExprPool, id: ExprId) -> Option<i64> {
    let v = pool.literal_value(id)?;
    let rounded = v.round();
    if (v - rounded).abs() < LITERAL_TOLERANCE && rounded.abs() < i64::MAX as f64 {
        Some(rounded as i64)
    } else {
        None
    }
}

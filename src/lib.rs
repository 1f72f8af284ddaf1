//! # SFG Core
//!
//! Symbolic transfer functions from signal-flow graphs.
//!
//! This library provides:
//! - An arena-backed symbolic expression engine with a small text grammar
//! - Rewrite passes for folding, expansion, factoring and simplification
//! - A signal-flow graph model with Mason's gain formula
//! - Conversion to rational functions, including limits of ideal components
//! - A numeric backend: roots, LU solving, partial fractions, responses
//!
//! ## Architecture
//!
//! - [`expr`] - Expression pool, parser and owned expression handles
//! - [`rewrite`] - Rewrite passes and pass groups
//! - [`vars`] - Variable table for bindings, evaluation and substitution
//! - [`graph`] - Graph model, path and loop search, Mason's formula
//! - [`rational`] - Rational functions with symbolic coefficients
//! - [`numeric`] - Numeric transfer functions
//! - [`pipeline`] - Cached stages from graph to transfer function
//!
//! ## Usage
//!
//! ```bash
//! sfg --edge in:x:1 --edge x:out:"1/(s*T)" --edge out:x:-1 \
//!     --input in --output out --param T=0.5 --eval 1
//! ```
//!
//! ## Method
//!
//! For a selected input and output node:
//!
//! 1. Enumerate forward paths and loops by depth-first search
//! 2. Apply Mason's gain formula symbolically
//! 3. Insert substitutions and take limits of symbols bound to `oo`
//! 4. Collect numerator and denominator polynomials in `s`
//! 5. Evaluate coefficients with the parameter table and find poles/zeros

pub mod error;
pub mod expr;
pub mod graph;
pub mod numeric;
pub mod pipeline;
pub mod rational;
pub mod rewrite;
pub mod vars;

// Re-export main types for convenience
pub use error::{Result, SfgError};
pub use expr::{Expr, ExprId, ExprPool};
pub use graph::{EdgeId, Graph, NodeId};
pub use numeric::TransferFunction;
pub use pipeline::{Pipeline, PipelineChange, PipelineConfig};
pub use rational::RationalExpr;
pub use vars::VarTable;

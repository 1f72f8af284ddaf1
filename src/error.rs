//! Error types for the signal-flow graph engine.
//!
//! This module provides a unified error type [`SfgError`] that covers
//! every failure that can occur while parsing expressions, rewriting them,
//! analysing graphs, converting to rational form and running the numeric
//! backend.

use thiserror::Error;

/// Result type alias using [`SfgError`].
pub type Result<T> = std::result::Result<T, SfgError>;

/// Unified error type for all SFG operations.
#[derive(Error, Debug)]
pub enum SfgError {
    // ============ Expression Parsing Errors ============
    /// Syntax error, located by the byte span of the offending token
    #[error("Parse error at offset {offset} (length {length}): {message}")]
    ParseError {
        offset: usize,
        length: usize,
        message: String,
    },

    // ============ Expression Errors ============
    /// Imported node list does not describe a tree
    #[error("Malformed expression: {message}")]
    MalformedExpression { message: String },

    // ============ Rewrite Errors ============
    /// A pass group kept reporting changes past its iteration cap
    #[error("Rewrite group '{group}' did not reach a fixpoint after {iterations} iterations")]
    RewriteDidNotConverge {
        group: &'static str,
        iterations: usize,
    },

    // ============ Variable Table Errors ============
    /// A substitution chain refers back to itself
    #[error("Circular substitution detected while expanding '{name}'")]
    CircularSubstitution { name: String },

    // ============ Graph Errors ============
    /// Node lookup failed
    #[error("Node '{node}' not found in graph")]
    NodeNotFound { node: String },

    /// Edge index is out of range or refers to a deleted edge
    #[error("Edge {edge} not found in graph")]
    EdgeNotFound { edge: usize },

    /// Input/output selection the gain formula cannot work with
    #[error("Invalid topology: {message}")]
    InvalidTopology { message: String },

    // ============ Rational Conversion Errors ============
    /// The expression cannot be written as a ratio of polynomials
    #[error("Expression is not reducible to a polynomial in '{variable}'")]
    NotPolynomial { variable: String },

    // ============ Numeric Errors ============
    /// LU decomposition found no usable pivot
    #[error("Singular matrix - no usable pivot above threshold")]
    SingularMatrix,

    /// Durand-Kerner iterates became non-finite
    #[error("Root finder diverged within {iterations} iterations")]
    RootsDidNotConverge { iterations: usize },

    /// Partial fractions require a strictly proper rational function
    #[error("Partial fraction decomposition needs a proper fraction (numerator degree {num_degree}, denominator degree {den_degree})")]
    ImproperFraction {
        num_degree: usize,
        den_degree: usize,
    },

    /// Coefficients do not describe a usable transfer function
    #[error("Degenerate transfer function: {message}")]
    DegenerateTransferFunction { message: String },

    /// Dimensions of a matrix or vector do not fit the operation
    #[error("Dimension mismatch: {message}")]
    DimensionMismatch { message: String },

    // ============ CLI Errors ============
    /// Malformed command-line definition
    #[error("Invalid argument '{argument}': {message}")]
    InvalidArgument { argument: String, message: String },
}

impl SfgError {
    /// Create a parse error
    pub fn parse(offset: usize, length: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            offset,
            length,
            message: message.into(),
        }
    }

    /// Create a malformed expression error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedExpression {
            message: message.into(),
        }
    }

    /// Create a not-a-polynomial error
    pub fn not_polynomial(variable: impl Into<String>) -> Self {
        Self::NotPolynomial {
            variable: variable.into(),
        }
    }

    /// Create a node lookup error
    pub fn node_not_found(node: impl Into<String>) -> Self {
        Self::NodeNotFound { node: node.into() }
    }

    /// Create an invalid topology error
    pub fn invalid_topology(message: impl Into<String>) -> Self {
        Self::InvalidTopology {
            message: message.into(),
        }
    }

    /// Create a degenerate transfer function error
    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateTransferFunction {
            message: message.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch(message: impl Into<String>) -> Self {
        Self::DimensionMismatch {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(argument: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
            message: message.into(),
        }
    }
}

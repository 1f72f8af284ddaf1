//! Symbolic expressions: arena, parser and owned expression handles.
//!
//! Expressions are trees of literals, variables, symbolic infinity and the
//! four operators negate, add, multiply and power. Subtraction and division
//! are not separate node types: `a - b` is stored as `a + -b` and `a / b` as
//! `a * b^-1`.
//!
//! # Grammar
//!
//! ```text
//! expr    = term { ('+' | '-') term }
//! term    = unary { ('*' | '/') unary }
//! unary   = { '+' | '-' } factor
//! factor  = base [ '^' unary ]          (right-associative)
//! base    = number | "oo" | identifier | '(' expr ')'
//!
//! number     = digit+ ['.' digit*] [('e'|'E') ['+'|'-'] digit+] ['f']
//! identifier = (letter | '_') { letter | digit | '_' }
//! ```
//!
//! Unary minus binds weaker than power: `-x^2` is `-(x^2)`, while `x^-2`
//! negates the exponent. Parse errors carry the byte offset and length of
//! the offending token.

mod lexer;
mod owned;
mod parser;
mod pool;

pub use lexer::{Lexer, Token, TokenKind};
pub use owned::Expr;
pub use parser::Parser;
pub use pool::{DisplayExpr, ExprId, ExprNode, ExprPool, FlatExpr, FlatNode, NodeKind};

use crate::error::Result;

/// Parse expression text into an existing pool, returning the root.
///
/// On failure the pool is left exactly as it was.
pub fn parse_into(pool: &mut ExprPool, text: &str) -> Result<ExprId> {
    let mut scratch = ExprPool::new();
    let root = Parser::new(Lexer::new(text))?.parse(&mut scratch)?;
    Ok(pool.dup_from(&scratch, root))
}

//! Recursive-descent parser for the expression grammar.

use super::lexer::{parse_number, Lexer, Token, TokenKind};
use super::pool::{ExprId, ExprPool};
use crate::error::{Result, SfgError};

/// Parser building expression trees into a pool.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Create a new parser with the given lexer.
    pub fn new(mut lexer: Lexer<'a>) -> Result<Self> {
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    /// Parse a complete expression; trailing input is an error.
    pub fn parse(&mut self, pool: &mut ExprPool) -> Result<ExprId> {
        let root = self.parse_expr(pool)?;
        if self.current.kind != TokenKind::Eof {
            return Err(self.unexpected("expected operator or end of input"));
        }
        Ok(root)
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.current.kind == kind {
            let tok = self.current.clone();
            self.advance()?;
            Ok(tok)
        } else {
            Err(self.unexpected(format!("expected {:?}, got {:?}", kind, self.current.kind)))
        }
    }

    fn unexpected(&self, message: impl Into<String>) -> SfgError {
        SfgError::parse(self.current.offset, self.current.length(), message)
    }

    // expr := term (('+'|'-') term)*
    fn parse_expr(&mut self, pool: &mut ExprPool) -> Result<ExprId> {
        let mut left = self.parse_term(pool)?;
        loop {
            match self.current.kind {
                TokenKind::Plus => {
                    self.advance()?;
                    let right = self.parse_term(pool)?;
                    left = pool.add(left, right);
                }
                TokenKind::Minus => {
                    self.advance()?;
                    let right = self.parse_term(pool)?;
                    left = pool.sub(left, right);
                }
                _ => return Ok(left),
            }
        }
    }

    // term := unary (('*'|'/') unary)*
    fn parse_term(&mut self, pool: &mut ExprPool) -> Result<ExprId> {
        let mut left = self.parse_unary(pool)?;
        loop {
            match self.current.kind {
                TokenKind::Star => {
                    self.advance()?;
                    let right = self.parse_unary(pool)?;
                    left = pool.mul(left, right);
                }
                TokenKind::Slash => {
                    self.advance()?;
                    let right = self.parse_unary(pool)?;
                    left = pool.div(left, right);
                }
                _ => return Ok(left),
            }
        }
    }

    // unary := ('+'|'-')* factor
    fn parse_unary(&mut self, pool: &mut ExprPool) -> Result<ExprId> {
        let mut negations = 0;
        while matches!(self.current.kind, TokenKind::Plus | TokenKind::Minus) {
            if self.current.kind == TokenKind::Minus {
                negations += 1;
            }
            self.advance()?;
        }

        let mut operand = self.parse_factor(pool)?;
        for _ in 0..negations {
            // A minus directly on a number is part of the literal
            operand = match pool.literal_value(operand) {
                Some(v) if v.is_sign_positive() => {
                    pool.set_literal(operand, -v);
                    operand
                }
                _ => pool.neg(operand),
            };
        }
        Ok(operand)
    }

    // factor := base ('^' unary)*, right-associative
    fn parse_factor(&mut self, pool: &mut ExprPool) -> Result<ExprId> {
        let base = self.parse_base(pool)?;
        if self.current.kind == TokenKind::Caret {
            self.advance()?;
            let exponent = self.parse_unary(pool)?;
            return Ok(pool.pow(base, exponent));
        }
        Ok(base)
    }

    // base := literal | "oo" | identifier | '(' expr ')'
    fn parse_base(&mut self, pool: &mut ExprPool) -> Result<ExprId> {
        match self.current.kind {
            TokenKind::Number => {
                let value = parse_number(&self.current.text)
                    .ok_or_else(|| self.unexpected(format!("invalid number '{}'", self.current.text)))?;
                self.advance()?;
                Ok(pool.literal(value))
            }
            TokenKind::Infinity => {
                self.advance()?;
                Ok(pool.infinity())
            }
            TokenKind::Identifier => {
                let name = self.current.text.clone();
                self.advance()?;
                Ok(pool.variable(name))
            }
            TokenKind::OpenParen => {
                self.advance()?;
                let inner = self.parse_expr(pool)?;
                self.expect(TokenKind::CloseParen)?;
                Ok(inner)
            }
            TokenKind::Eof => Err(self.unexpected("unexpected end of input")),
            kind => Err(self.unexpected(format!("unexpected {:?}", kind))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::NodeKind;

    fn parse(text: &str) -> (ExprPool, ExprId) {
        let mut pool = ExprPool::new();
        let root = Parser::new(Lexer::new(text)).unwrap().parse(&mut pool).unwrap();
        (pool, root)
    }

    fn render(text: &str) -> String {
        let (pool, root) = parse(text);
        pool.display(root).to_string()
    }

    fn error_span(text: &str) -> (usize, usize) {
        let mut pool = ExprPool::new();
        let result = Parser::new(Lexer::new(text)).and_then(|mut p| p.parse(&mut pool));
        match result {
            Err(SfgError::ParseError { offset, length, .. }) => (offset, length),
            other => panic!("expected parse error for {:?}, got {:?}", text, other),
        }
    }

    #[test]
    fn test_parse_precedence() {
        assert_eq!(render("a + b * c"), "a + b * c");
        assert_eq!(render("(a + b) * c"), "(a + b) * c");
        assert_eq!(render("a - b - c"), "a - b - c");
        assert_eq!(render("a / b"), "a / b");
    }

    #[test]
    fn test_parse_power_right_associative() {
        let (pool, root) = parse("a^b^c");
        match pool.kind(root) {
            NodeKind::Pow(base, exp) => {
                assert_eq!(pool.kind(*base), &NodeKind::Variable("a".into()));
                assert!(matches!(pool.kind(*exp), NodeKind::Pow(..)));
            }
            other => panic!("expected power, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unary_minus() {
        let (pool, root) = parse("-3");
        assert_eq!(pool.literal_value(root), Some(-3.0));

        let (pool, root) = parse("-x^2");
        assert!(matches!(pool.kind(root), NodeKind::Negate(_)));

        let (pool, root) = parse("--x");
        match pool.kind(root) {
            NodeKind::Negate(inner) => assert!(matches!(pool.kind(*inner), NodeKind::Negate(_))),
            other => panic!("expected negate, got {:?}", other),
        }

        assert_eq!(render("s^-1"), "s^-1");
        assert_eq!(render("+a"), "a");
    }

    #[test]
    fn test_parse_infinity() {
        let (pool, root) = parse("1/oo");
        match pool.kind(root) {
            NodeKind::Mul(_, r) => match pool.kind(*r) {
                NodeKind::Pow(base, _) => assert_eq!(pool.kind(*base), &NodeKind::Infinity),
                other => panic!("expected reciprocal, got {:?}", other),
            },
            other => panic!("expected product, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_errors_report_span() {
        assert_eq!(error_span("a +"), (3, 0));
        assert_eq!(error_span("a + )"), (4, 1));
        assert_eq!(error_span("(a + b"), (6, 0));
        assert_eq!(error_span("a b"), (2, 1));
        assert_eq!(error_span("a # b"), (2, 1));
    }
}

//! Lexer (tokenizer) for the expression grammar.

use crate::error::{Result, SfgError};

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The token's text
    pub text: String,
    /// Byte offset of the first character
    pub offset: usize,
}

impl Token {
    /// Length of the token in bytes.
    pub fn length(&self) -> usize {
        self.text.len()
    }
}

/// Token types in the expression grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A decimal number, optionally with exponent and `f` suffix
    Number,
    /// A symbol name
    Identifier,
    /// The `oo` keyword
    Infinity,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    OpenParen,
    CloseParen,
    /// End of input
    Eof,
}

/// Lexer for tokenizing expression text.
pub struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        let (start, ch) = match self.chars.peek().copied() {
            Some(pair) => pair,
            None => {
                return Ok(Token {
                    kind: TokenKind::Eof,
                    text: String::new(),
                    offset: self.input.len(),
                });
            }
        };

        let kind = match ch {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '^' => TokenKind::Caret,
            '(' => TokenKind::OpenParen,
            ')' => TokenKind::CloseParen,
            '0'..='9' | '.' => {
                let end = self.read_number(start)?;
                return Ok(self.token(TokenKind::Number, start, end));
            }
            _ if ch.is_ascii_alphabetic() || ch == '_' => {
                let end = self.read_identifier();
                let kind = if &self.input[start..end] == "oo" {
                    TokenKind::Infinity
                } else {
                    TokenKind::Identifier
                };
                return Ok(self.token(kind, start, end));
            }
            _ => {
                return Err(SfgError::parse(
                    start,
                    ch.len_utf8(),
                    format!("unexpected character '{}'", ch),
                ));
            }
        };

        self.chars.next();
        Ok(self.token(kind, start, start + 1))
    }

    fn token(&self, kind: TokenKind, start: usize, end: usize) -> Token {
        Token {
            kind,
            text: self.input[start..end].to_string(),
            offset: start,
        }
    }

    fn position(&mut self) -> usize {
        self.chars.peek().map(|(pos, _)| *pos).unwrap_or(self.input.len())
    }

    fn skip_whitespace(&mut self) {
        while let Some(&(_, ch)) = self.chars.peek() {
            if ch.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    fn skip_digits(&mut self) -> usize {
        let mut count = 0;
        while let Some(&(_, ch)) = self.chars.peek() {
            if ch.is_ascii_digit() {
                self.chars.next();
                count += 1;
            } else {
                break;
            }
        }
        count
    }

    fn read_identifier(&mut self) -> usize {
        while let Some(&(_, ch)) = self.chars.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.chars.next();
            } else {
                break;
            }
        }
        self.position()
    }

    fn read_number(&mut self, start: usize) -> Result<usize> {
        let mut digits = self.skip_digits();

        if let Some(&(_, '.')) = self.chars.peek() {
            self.chars.next();
            digits += self.skip_digits();
        }
        if digits == 0 {
            let end = self.position();
            return Err(SfgError::parse(start, end - start, "expected digits"));
        }

        if let Some(&(_, 'e' | 'E')) = self.chars.peek() {
            self.chars.next();
            if let Some(&(_, '+' | '-')) = self.chars.peek() {
                self.chars.next();
            }
            if self.skip_digits() == 0 {
                let end = self.position();
                return Err(SfgError::parse(start, end - start, "malformed exponent"));
            }
        }

        // Single-precision suffix is accepted and ignored
        if let Some(&(_, 'f')) = self.chars.peek() {
            self.chars.next();
        }

        Ok(self.position())
    }
}

/// Parse the text of a number token.
pub fn parse_number(text: &str) -> Option<f64> {
    text.strip_suffix('f').unwrap_or(text).parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().unwrap();
            out.push(tok.kind);
            if tok.kind == TokenKind::Eof {
                return out;
            }
        }
    }

    #[test]
    fn test_operators_and_atoms() {
        assert_eq!(
            kinds("a1 + 2.5*(oo - _b)^x / y"),
            vec![
                TokenKind::Identifier,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::Star,
                TokenKind::OpenParen,
                TokenKind::Infinity,
                TokenKind::Minus,
                TokenKind::Identifier,
                TokenKind::CloseParen,
                TokenKind::Caret,
                TokenKind::Identifier,
                TokenKind::Slash,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_number_forms() {
        for (text, value) in [("3", 3.0), ("0.25", 0.25), ("1e-3", 1e-3), ("2.5E2", 250.0), ("1.5f", 1.5)] {
            let tok = Lexer::new(text).next_token().unwrap();
            assert_eq!(tok.kind, TokenKind::Number);
            assert_eq!(parse_number(&tok.text), Some(value));
        }
    }

    #[test]
    fn test_token_offsets() {
        let mut lexer = Lexer::new("  ab +  7");
        let a = lexer.next_token().unwrap();
        assert_eq!((a.offset, a.length()), (2, 2));
        let plus = lexer.next_token().unwrap();
        assert_eq!(plus.offset, 5);
        let seven = lexer.next_token().unwrap();
        assert_eq!(seven.offset, 8);
        assert_eq!(lexer.next_token().unwrap().offset, 9);
    }

    #[test]
    fn test_unexpected_character() {
        let mut lexer = Lexer::new("a $ b");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Identifier);
        match lexer.next_token() {
            Err(SfgError::ParseError { offset, length, .. }) => assert_eq!((offset, length), (2, 1)),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_oo_prefix_is_identifier() {
        let tok = Lexer::new("oops").next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::Identifier);
    }
}

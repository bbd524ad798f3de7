//! Token stream wrapper for the hand-written parser.

use std::ops::Range;

use crate::expr::parser::ParseError;
use crate::expr::token::Token;

/// Token stream with lookahead and byte-offset tracking.
pub struct TokenStream<'t> {
    tokens: &'t [(Token, Range<usize>)],
    pos: usize,
    /// Source length, used as the offset for end-of-input errors.
    end: usize,
}

impl<'t> TokenStream<'t> {
    /// Create a stream over `tokens` from a source of `source_len` bytes.
    pub fn new(tokens: &'t [(Token, Range<usize>)], source_len: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            end: source_len,
        }
    }

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    /// Peek at the nth token ahead without consuming.
    pub fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|(t, _)| t)
    }

    /// Advance to the next token and return the current one.
    pub fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Byte offset of the current token, or end-of-input.
    pub fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, span)| span.start)
            .unwrap_or(self.end)
    }

    /// Expect a specific token kind and consume it.
    pub fn expect(&mut self, expected: &Token, what: &'static str) -> Result<(), ParseError> {
        match self.peek() {
            Some(token) if std::mem::discriminant(token) == std::mem::discriminant(expected) => {
                self.advance();
                Ok(())
            }
            Some(token) => Err(ParseError::Unexpected {
                expected: what,
                found: token.to_string(),
                offset: self.offset(),
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: what,
                offset: self.end,
            }),
        }
    }

    /// Check if the stream is exhausted.
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// An error describing the current token as unexpected.
    pub fn unexpected(&self, expected: &'static str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::Unexpected {
                expected,
                found: token.to_string(),
                offset: self.offset(),
            },
            None => ParseError::UnexpectedEof {
                expected,
                offset: self.end,
            },
        }
    }
}

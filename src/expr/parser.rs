//! Recursive descent parser for the expression language.
//!
//! Grammar (tightest binding first): unary sign, `**` (right-associative),
//! `* /`, `+ -`, comparisons (non-chaining), `not`, `and`, `or`. Statements
//! are either a bare expression or `IDENT = expr`, separated by newlines or
//! semicolons.

use thiserror::Error;

use crate::expr::ast::{BinaryOp, Expr, UnaryOp};
use crate::expr::stream::TokenStream;
use crate::expr::token::{lex, Token};

/// Errors produced while tokenising or parsing expression source.
///
/// Every variant carries the byte offset of the offending input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unrecognised input {found:?} at byte {offset}")]
    Unrecognised { found: String, offset: usize },

    #[error("expected {expected}, found {found:?} at byte {offset}")]
    Unexpected {
        expected: &'static str,
        found: String,
        offset: usize,
    },

    #[error("unexpected end of input, expected {expected} at byte {offset}")]
    UnexpectedEof { expected: &'static str, offset: usize },

    #[error("trailing input {found:?} after expression at byte {offset}")]
    Trailing { found: String, offset: usize },
}

impl ParseError {
    /// Byte offset of the offending token.
    pub fn offset(&self) -> usize {
        match self {
            ParseError::Unrecognised { offset, .. }
            | ParseError::Unexpected { offset, .. }
            | ParseError::UnexpectedEof { offset, .. }
            | ParseError::Trailing { offset, .. } => *offset,
        }
    }
}

/// Parse a single expression.
///
/// Newlines inside the source are treated as ordinary whitespace here; a
/// condition or preprocess entry is one expression, never a statement list.
pub fn parse_expression(source: &str) -> Result<Expr, ParseError> {
    let tokens: Vec<_> = lex(source)?
        .into_iter()
        .filter(|(token, _)| !matches!(token, Token::Newline))
        .collect();
    let mut stream = TokenStream::new(&tokens, source.len());
    let expr = parse_expr(&mut stream)?;
    if !stream.at_end() {
        return Err(ParseError::Trailing {
            found: stream.peek().map(|t| t.to_string()).unwrap_or_default(),
            offset: stream.offset(),
        });
    }
    Ok(expr)
}

/// Parse a statement list, separated by newlines or semicolons.
///
/// Each statement is a bare expression (value discarded) or an assignment.
pub fn parse_statements(source: &str) -> Result<Vec<Expr>, ParseError> {
    let tokens = lex(source)?;
    let mut stream = TokenStream::new(&tokens, source.len());
    let mut statements = Vec::new();

    loop {
        while matches!(stream.peek(), Some(Token::Newline) | Some(Token::Semi)) {
            stream.advance();
        }
        if stream.at_end() {
            break;
        }
        statements.push(parse_stmt(&mut stream)?);
        match stream.peek() {
            None | Some(Token::Newline) | Some(Token::Semi) => {}
            Some(token) => {
                return Err(ParseError::Trailing {
                    found: token.to_string(),
                    offset: stream.offset(),
                })
            }
        }
    }

    Ok(statements)
}

fn parse_stmt(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    // Assignment needs two tokens of lookahead: `x = ...` but not `x == ...`
    if let (Some(Token::Ident(name)), Some(Token::Assign)) = (stream.peek(), stream.peek_nth(1)) {
        let name = name.clone();
        stream.advance();
        stream.advance();
        let value = parse_expr(stream)?;
        return Ok(Expr::Assign {
            name,
            value: Box::new(value),
        });
    }
    parse_expr(stream)
}

fn parse_expr(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    parse_or(stream)
}

fn parse_or(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let mut left = parse_and(stream)?;
    while matches!(stream.peek(), Some(Token::Or)) {
        stream.advance();
        let right = parse_and(stream)?;
        left = Expr::Binary {
            op: BinaryOp::Or,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
    Ok(left)
}

fn parse_and(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let mut left = parse_not(stream)?;
    while matches!(stream.peek(), Some(Token::And)) {
        stream.advance();
        let right = parse_not(stream)?;
        left = Expr::Binary {
            op: BinaryOp::And,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
    Ok(left)
}

fn parse_not(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    if matches!(stream.peek(), Some(Token::Not)) {
        stream.advance();
        let operand = parse_not(stream)?;
        return Ok(Expr::Not(Box::new(operand)));
    }
    parse_cmp(stream)
}

fn comparison_op(token: &Token) -> Option<BinaryOp> {
    match token {
        Token::EqEq => Some(BinaryOp::Eq),
        Token::BangEq => Some(BinaryOp::Ne),
        Token::Lt => Some(BinaryOp::Lt),
        Token::LtEq => Some(BinaryOp::Le),
        Token::Gt => Some(BinaryOp::Gt),
        Token::GtEq => Some(BinaryOp::Ge),
        _ => None,
    }
}

fn parse_cmp(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let left = parse_sum(stream)?;
    // Comparisons do not chain: at most one comparison per level
    if let Some(op) = stream.peek().and_then(comparison_op) {
        stream.advance();
        let right = parse_sum(stream)?;
        return Ok(Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        });
    }
    Ok(left)
}

fn parse_sum(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let mut left = parse_mul(stream)?;
    loop {
        let op = match stream.peek() {
            Some(Token::Plus) => BinaryOp::Add,
            Some(Token::Minus) => BinaryOp::Sub,
            _ => break,
        };
        stream.advance();
        let right = parse_mul(stream)?;
        left = Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
    Ok(left)
}

fn parse_mul(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let mut left = parse_pow(stream)?;
    loop {
        let op = match stream.peek() {
            Some(Token::Star) => BinaryOp::Mul,
            Some(Token::Slash) => BinaryOp::Div,
            _ => break,
        };
        stream.advance();
        let right = parse_pow(stream)?;
        left = Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
    Ok(left)
}

fn parse_pow(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let left = parse_unary(stream)?;
    if matches!(stream.peek(), Some(Token::StarStar)) {
        stream.advance();
        // Right-associative: recurse at the same level
        let right = parse_pow(stream)?;
        return Ok(Expr::Binary {
            op: BinaryOp::Pow,
            left: Box::new(left),
            right: Box::new(right),
        });
    }
    Ok(left)
}

fn parse_unary(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let op = match stream.peek() {
        Some(Token::Minus) => Some(UnaryOp::Neg),
        Some(Token::Plus) => Some(UnaryOp::Pos),
        _ => None,
    };
    if let Some(op) = op {
        stream.advance();
        let operand = parse_unary(stream)?;
        return Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        });
    }
    parse_primary(stream)
}

fn parse_primary(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    match stream.peek() {
        Some(Token::Number(value)) => {
            let value = *value;
            stream.advance();
            Ok(Expr::Number(value))
        }
        Some(Token::Ident(name)) => {
            let name = name.clone();
            stream.advance();
            Ok(Expr::Name(name))
        }
        Some(Token::Qualified(qualified)) => {
            let offset = stream.offset();
            let qualified = qualified.clone();
            stream.advance();
            match qualified.split_once('.') {
                Some(("global", rest)) => Ok(Expr::Global(rest.to_string())),
                _ => Err(ParseError::Unexpected {
                    expected: "the `global.` namespace",
                    found: qualified,
                    offset,
                }),
            }
        }
        Some(Token::Sigil(name)) => {
            let name = name.clone();
            stream.advance();
            let args = parse_call_args(stream)?;
            Ok(Expr::Call { name, args })
        }
        Some(Token::LParen) => {
            stream.advance();
            let inner = parse_expr(stream)?;
            stream.expect(&Token::RParen, "`)`")?;
            Ok(inner)
        }
        _ => Err(stream.unexpected("an expression")),
    }
}

fn parse_call_args(stream: &mut TokenStream) -> Result<Vec<Expr>, ParseError> {
    stream.expect(&Token::LParen, "`(` after builtin name")?;
    let mut args = vec![parse_expr(stream)?];
    while matches!(stream.peek(), Some(Token::Comma)) {
        stream.advance();
        args.push(parse_expr(stream)?);
    }
    stream.expect(&Token::RParen, "`)`")?;
    Ok(args)
}

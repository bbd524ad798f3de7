//! Lexical analysis for the expression language.
//!
//! Tokenisation uses logos. Whitespace separates tokens and is skipped,
//! except for newlines, which act as statement separators in exec blocks.
//! There are no comments.

use logos::{Lexer, Logos};
use std::fmt;
use std::ops::Range;

use crate::expr::parser::ParseError;

fn number(lex: &mut Lexer<Token>) -> Option<f64> {
    // Reject literals that overflow to infinity so they surface as lex errors
    lex.slice().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn ident(lex: &mut Lexer<Token>) -> String {
    lex.slice().to_string()
}

fn sigil(lex: &mut Lexer<Token>) -> String {
    lex.slice()[1..].to_string()
}

/// Expression language token.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")]
pub enum Token {
    // Logical keywords
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,

    /// Dotted identifier, e.g. `global.users`
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*\.[A-Za-z_][A-Za-z0-9_]*", ident)]
    Qualified(String),

    /// Plain identifier
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", ident)]
    Ident(String),

    /// `$`-prefixed builtin name, stored without the sigil
    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*", sigil)]
    Sigil(String),

    /// Integer or float literal, scientific notation permitted (`1e-8`)
    #[regex(r"[0-9]+\.?[0-9]*([eE][+-]?[0-9]+)?", number)]
    Number(f64),

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token("=")]
    Assign,
    #[token(";")]
    Semi,
    #[token("\n")]
    Newline,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("**")]
    StarStar,

    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Not => write!(f, "not"),
            Token::Qualified(name) => write!(f, "{}", name),
            Token::Ident(name) => write!(f, "{}", name),
            Token::Sigil(name) => write!(f, "${}", name),
            Token::Number(value) => write!(f, "{}", value),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Assign => write!(f, "="),
            Token::Semi => write!(f, ";"),
            Token::Newline => write!(f, "newline"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::StarStar => write!(f, "**"),
            Token::EqEq => write!(f, "=="),
            Token::BangEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::LtEq => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::GtEq => write!(f, ">="),
        }
    }
}

/// Tokenise `source`, keeping the byte span of every token.
///
/// An unrecognised character or a non-finite numeric literal is a
/// [`ParseError::Unrecognised`] carrying its byte offset.
pub fn lex(source: &str) -> Result<Vec<(Token, Range<usize>)>, ParseError> {
    let mut tokens = Vec::new();
    for (result, span) in Token::lexer(source).spanned() {
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                return Err(ParseError::Unrecognised {
                    found: source[span.clone()].to_string(),
                    offset: span.start,
                })
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        lex(source).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_lex_numbers() {
        assert_eq!(kinds("42"), vec![Token::Number(42.0)]);
        assert_eq!(kinds("2.5"), vec![Token::Number(2.5)]);
        assert_eq!(kinds("1e-8"), vec![Token::Number(1e-8)]);
        assert_eq!(kinds("1.5E3"), vec![Token::Number(1500.0)]);
    }

    #[test]
    fn test_lex_identifiers_and_keywords() {
        assert_eq!(
            kinds("users and x_1 or not _tmp"),
            vec![
                Token::Ident("users".to_string()),
                Token::And,
                Token::Ident("x_1".to_string()),
                Token::Or,
                Token::Not,
                Token::Ident("_tmp".to_string()),
            ]
        );
    }

    #[test]
    fn test_lex_qualified_name() {
        assert_eq!(
            kinds("global.users + 1"),
            vec![
                Token::Qualified("global.users".to_string()),
                Token::Plus,
                Token::Number(1.0),
            ]
        );
    }

    #[test]
    fn test_lex_sigil_call() {
        assert_eq!(
            kinds("$random(1, 2, 1.5)"),
            vec![
                Token::Sigil("random".to_string()),
                Token::LParen,
                Token::Number(1.0),
                Token::Comma,
                Token::Number(2.0),
                Token::Comma,
                Token::Number(1.5),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_lex_operators_longest_match() {
        assert_eq!(
            kinds("a ** b == c <= d"),
            vec![
                Token::Ident("a".to_string()),
                Token::StarStar,
                Token::Ident("b".to_string()),
                Token::EqEq,
                Token::Ident("c".to_string()),
                Token::LtEq,
                Token::Ident("d".to_string()),
            ]
        );
    }

    #[test]
    fn test_lex_newline_is_a_token() {
        assert_eq!(
            kinds("a = 1\nb = 2"),
            vec![
                Token::Ident("a".to_string()),
                Token::Assign,
                Token::Number(1.0),
                Token::Newline,
                Token::Ident("b".to_string()),
                Token::Assign,
                Token::Number(2.0),
            ]
        );
    }

    #[test]
    fn test_lex_rejects_unknown_character() {
        let err = lex("1 + #").unwrap_err();
        match err {
            ParseError::Unrecognised { found, offset } => {
                assert_eq!(found, "#");
                assert_eq!(offset, 4);
            }
            other => panic!("expected Unrecognised, got {:?}", other),
        }
    }

    #[test]
    fn test_lex_rejects_overflowing_literal() {
        assert!(lex("1e999").is_err());
    }
}

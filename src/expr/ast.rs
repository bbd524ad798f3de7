//! Abstract syntax tree for the expression language.
//!
//! A single tagged variant covers both expressions and statements: an
//! assignment is just an `Assign` node, so exec blocks are plain `Vec<Expr>`.

use serde::{Deserialize, Serialize};

/// Binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Unary operator. `Pos` is a parsed no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Pos,
}

/// Expression / statement node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Numeric literal
    Number(f64),
    /// Plain name, resolved through the scope stack
    Name(String),
    /// `global.x` qualified name, resolved against the globals layer only.
    /// Stores the part after the qualifier.
    Global(String),
    /// Unary sign
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// Binary arithmetic, comparison, or logical operator
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Logical negation
    Not(Box<Expr>),
    /// `$name(args...)` builtin call, name stored without the sigil
    Call { name: String, args: Vec<Expr> },
    /// `name = value`, writes into the innermost scope frame
    Assign { name: String, value: Box<Expr> },
}

impl Expr {
    /// True for nodes that may appear as a bare statement target check.
    pub fn is_assign(&self) -> bool {
        matches!(self, Expr::Assign { .. })
    }
}

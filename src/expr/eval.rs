//! Expression evaluator.
//!
//! Interprets an AST against a [`Scope`] and the engine's [`RandomSource`].
//! Every value is f64; comparisons and logical operators produce exactly
//! 1.0 or 0.0, and truthiness is `v != 0.0`. Evaluation is a pure function of
//! (AST, scope, random-source state), so a fixed seed reproduces results.

use thiserror::Error;

use crate::expr::ast::{BinaryOp, Expr, UnaryOp};
use crate::expr::scope::Scope;
use crate::rng::RandomSource;

/// Divisors below this magnitude are treated as zero.
const DIV_EPSILON: f64 = 1e-300;

/// Errors raised during expression evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("undefined name: {0}")]
    UndefinedName(String),

    #[error("cannot bind reserved name: {0}")]
    ReservedName(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("domain error: negative base {base} raised to non-integer exponent {exponent}")]
    Domain { base: f64, exponent: f64 },

    #[error("numeric overflow: expression produced a non-finite value")]
    NumericOverflow,

    #[error("no case condition matched")]
    NoMatchingCase,

    #[error("$random expects exactly 3 arguments, got {0}")]
    RandomArity(usize),

    #[error("$random arguments must satisfy min < max and min <= mean <= max, got min={min}, max={max}, mean={mean}")]
    RandomArguments { min: f64, max: f64, mean: f64 },
}

/// Coerce a value to a boolean.
pub fn truthy(value: f64) -> bool {
    value != 0.0
}

/// Evaluate `expr` against `scope`, drawing from `random` for `$random`.
pub fn evaluate(
    expr: &Expr,
    scope: &mut Scope,
    random: &mut RandomSource,
) -> Result<f64, EvalError> {
    match expr {
        Expr::Number(value) => Ok(*value),

        Expr::Name(name) => scope
            .lookup(name)
            .ok_or_else(|| EvalError::UndefinedName(name.clone())),

        Expr::Global(name) => scope
            .lookup_global(name)
            .ok_or_else(|| EvalError::UndefinedName(format!("global.{}", name))),

        Expr::Unary { op, operand } => {
            let value = evaluate(operand, scope, random)?;
            match op {
                UnaryOp::Neg => Ok(-value),
                UnaryOp::Pos => Ok(value),
            }
        }

        Expr::Binary { op, left, right } => evaluate_binary(*op, left, right, scope, random),

        Expr::Not(operand) => {
            let value = evaluate(operand, scope, random)?;
            Ok(if truthy(value) { 0.0 } else { 1.0 })
        }

        Expr::Call { name, args } => evaluate_call(name, args, scope, random),

        Expr::Assign { name, value } => {
            if name == "global" || name == "random" {
                return Err(EvalError::ReservedName(name.clone()));
            }
            let value = evaluate(value, scope, random)?;
            scope.assign(name, value);
            Ok(value)
        }
    }
}

fn evaluate_binary(
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    scope: &mut Scope,
    random: &mut RandomSource,
) -> Result<f64, EvalError> {
    // Logical operators short-circuit: the right operand is only evaluated
    // when the left one does not decide the result.
    match op {
        BinaryOp::And => {
            let lhs = evaluate(left, scope, random)?;
            if !truthy(lhs) {
                return Ok(0.0);
            }
            let rhs = evaluate(right, scope, random)?;
            return Ok(if truthy(rhs) { 1.0 } else { 0.0 });
        }
        BinaryOp::Or => {
            let lhs = evaluate(left, scope, random)?;
            if truthy(lhs) {
                return Ok(1.0);
            }
            let rhs = evaluate(right, scope, random)?;
            return Ok(if truthy(rhs) { 1.0 } else { 0.0 });
        }
        _ => {}
    }

    let lhs = evaluate(left, scope, random)?;
    let rhs = evaluate(right, scope, random)?;

    match op {
        BinaryOp::Add => finite(lhs + rhs),
        BinaryOp::Sub => finite(lhs - rhs),
        BinaryOp::Mul => finite(lhs * rhs),
        BinaryOp::Div => {
            if rhs.abs() < DIV_EPSILON {
                return Err(EvalError::DivisionByZero);
            }
            finite(lhs / rhs)
        }
        BinaryOp::Pow => {
            if lhs < 0.0 && rhs.fract() != 0.0 {
                return Err(EvalError::Domain {
                    base: lhs,
                    exponent: rhs,
                });
            }
            finite(lhs.powf(rhs))
        }
        // Equality is bit-exact, no epsilon
        BinaryOp::Eq => Ok(bool_value(lhs == rhs)),
        BinaryOp::Ne => Ok(bool_value(lhs != rhs)),
        BinaryOp::Lt => Ok(bool_value(lhs < rhs)),
        BinaryOp::Le => Ok(bool_value(lhs <= rhs)),
        BinaryOp::Gt => Ok(bool_value(lhs > rhs)),
        BinaryOp::Ge => Ok(bool_value(lhs >= rhs)),
        BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
    }
}

fn evaluate_call(
    name: &str,
    args: &[Expr],
    scope: &mut Scope,
    random: &mut RandomSource,
) -> Result<f64, EvalError> {
    if name != "random" {
        return Err(EvalError::UndefinedName(format!("${}", name)));
    }

    // Arguments evaluate left-to-right before the call
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(evaluate(arg, scope, random)?);
    }
    if values.len() != 3 {
        return Err(EvalError::RandomArity(values.len()));
    }

    let (min, max, mean) = (values[0], values[1], values[2]);
    if !(min < max) || !(min <= mean && mean <= max) {
        return Err(EvalError::RandomArguments { min, max, mean });
    }

    Ok(random.skewed(min, max, mean))
}

fn bool_value(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

fn finite(value: f64) -> Result<f64, EvalError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::NumericOverflow)
    }
}

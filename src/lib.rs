//! Cost Simulator Core - Rust Engine
//!
//! Deterministic cost/income simulation engine. A declarative model describes
//! global constants, time-evolving variables with growth laws, and a tree of
//! cost and income resources whose contribution is a small program in an
//! embedded expression language. The engine evaluates the tree per period and
//! produces structured reports.
//!
//! # Architecture
//!
//! - **expr**: expression language (lexer, parser, scope, evaluator)
//! - **model**: configuration document types and the validated Model
//! - **engine**: calculation engine, growth laws, simulation driver
//! - **rng**: deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. Every runtime value is f64; booleans are exactly 1.0 / 0.0
//! 2. All randomness is deterministic (seeded RNG, default seed 42)
//! 3. A failed resource aborts the whole report; no partial reports

pub mod engine;
pub mod expr;
pub mod model;
pub mod rng;

// Re-exports for convenience
pub use engine::{
    report::Report,
    Engine, EngineConfig, EngineError,
};
pub use expr::{
    ast::{BinaryOp, Expr, UnaryOp},
    eval::{evaluate, EvalError},
    parser::{parse_expression, parse_statements, ParseError},
    scope::Scope,
};
pub use model::{
    build_model,
    document::{Document, GrowthRateDoc},
    Aggregation, GrowthLaw, Model, ModelError, VariableSpec,
};
pub use rng::{RandomSource, SimRng, SkewedSampler};

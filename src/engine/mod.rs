//! Calculation engine and simulation driver.
//!
//! The calculation engine evaluates every resource of a model against the
//! current global scope and assembles a [`report::Report`]. The driver owns
//! the seeded random source, advances global variables through their growth
//! laws, and re-runs the engine once per period.

pub mod calc;
pub mod driver;
pub mod growth;
pub mod report;

use thiserror::Error;

use crate::expr::eval::EvalError;
use crate::model::ModelError;

pub use driver::{Engine, EngineConfig, DEFAULT_SEED};

/// Errors surfaced by report generation and simulation.
///
/// Any error inside a resource aborts the whole period: a report is never
/// partially computed. The failing resource path is recorded on the error.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to evaluate {category}/{resource}: {source}")]
    Resource {
        category: String,
        resource: String,
        #[source]
        source: EvalError,
    },

    #[error(transparent)]
    Model(#[from] ModelError),
}

//! Configuration document types.
//!
//! These structs mirror the JSON document shape exactly and are designed to
//! deserialize safely with validation deferred to model build. Mapping order
//! is significant (categories, resources, variables, preprocess entries all
//! evaluate in declared order), so every mapping is an `IndexMap`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Root configuration document: `global`, `cost`, `income`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub global: GlobalDoc,
    pub cost: IndexMap<String, CategoryDoc>,
    pub income: IncomeDoc,
}

impl Document {
    /// Parse a document from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// The `global` section: constants plus time-evolving variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalDoc {
    #[serde(rename = "const")]
    pub constants: IndexMap<String, f64>,
    pub variable: IndexMap<String, VariableDoc>,
}

/// One time-evolving global variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDoc {
    pub start: f64,

    /// Upper clamp applied after growth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Lower clamp applied after growth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// Growth applies every `period`-th simulation period (default 1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_rate: Option<GrowthRateDoc>,

    /// Additive step; on its own it is the growth law, next to a
    /// `growth_rate` it contributes on top of it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub increment: Option<f64>,
}

/// Named growth law with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum GrowthRateDoc {
    /// Multiplicative per period: `v(t) = start * (1 + rate)^t`
    Linear(f64),
    /// `v(t) = sum(c_i * t^i)` over the coefficient list
    Polynomial(Vec<f64>),
    /// `v(t) = k / (1 + ((k - n0) / n0) * e^(-r t))`
    Logistic { k: f64, r: f64 },
}

/// The `income` section accepts a single category or a bare resource list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IncomeDoc {
    Category(CategoryDoc),
    Resources(Vec<ResourceDoc>),
}

/// A named group of resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDoc {
    pub description: String,
    pub resource: Vec<ResourceDoc>,
}

/// One cost or income resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDoc {
    pub name: String,
    pub use_case: String,
    pub calculation_method: String,
    pub billing_method: String,
    pub unit: String,
    pub calculation_function: CalcFnDoc,
}

/// A calculation function: either a bare expression string or a structured
/// object carrying exactly one of `result | cases | for | exec`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CalcFnDoc {
    Direct(String),
    Structured(StructuredFnDoc),
}

/// Structured calculation function body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredFnDoc {
    /// Local bindings evaluated before the body, in declared order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preprocess: Option<IndexMap<String, String>>,

    /// Direct-result expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    /// Ordered condition/result pairs; first truthy condition wins
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cases: Option<Vec<CaseDoc>>,

    /// Counted loop with an aggregation over per-iteration results
    #[serde(default, rename = "for", skip_serializing_if = "Option::is_none")]
    pub for_loop: Option<ForDoc>,

    /// Statement list; the final `result` binding is the value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<Vec<String>>,
}

/// One `cases` arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseDoc {
    pub case: String,
    pub result: String,
}

/// A `for` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForDoc {
    pub iterator: String,
    pub aggregation: String,
    pub exec: Vec<String>,
}

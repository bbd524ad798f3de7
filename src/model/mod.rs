//! Model types and validation.
//!
//! A [`Model`] is the validated, immutable form of a configuration
//! [`Document`]: every expression string is parsed exactly once here and the
//! AST is kept alongside its resource, so evaluation never re-parses. The
//! original document is retained for re-serialisation.

pub mod document;

use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

use crate::expr::ast::Expr;
use crate::expr::parser::{parse_expression, parse_statements, ParseError};
use document::{CalcFnDoc, CategoryDoc, Document, GrowthRateDoc, IncomeDoc, StructuredFnDoc};

/// Names that user variables may not take.
///
/// `result` and `i` are engine-provided inside exec and for-loop bodies;
/// everywhere else they are off limits like the rest.
pub const RESERVED_NAMES: &[&str] = &["global", "result", "i", "random", "and", "or", "not"];

/// Structural violations detected while building a model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("duplicate global name: {0}")]
    DuplicateGlobal(String),

    #[error("reserved name used as {what}: {name}")]
    ReservedName { what: &'static str, name: String },

    #[error("invalid name for {what}: {name:?}")]
    InvalidName { what: &'static str, name: String },

    #[error("invalid aggregation {found:?} in {context} (expected sum, average, max, or min)")]
    InvalidAggregation { context: String, found: String },

    #[error("{context} must contain exactly one of result, cases, for, exec")]
    AmbiguousBody { context: String },

    #[error("invalid variable {name}: {reason}")]
    InvalidVariable { name: String, reason: String },

    #[error("invalid expression in {context}: {source}")]
    Expression {
        context: String,
        #[source]
        source: ParseError,
    },

    #[error("unknown override name: {0}")]
    UnknownOverride(String),
}

/// Reduction applied to per-iteration `result` values of a for-loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Sum,
    Average,
    Max,
    Min,
}

impl Aggregation {
    fn parse(text: &str) -> Option<Self> {
        match text {
            "sum" => Some(Aggregation::Sum),
            "average" => Some(Aggregation::Average),
            "max" => Some(Aggregation::Max),
            "min" => Some(Aggregation::Min),
            _ => None,
        }
    }
}

/// Growth law for a global variable, parameters inline.
#[derive(Debug, Clone, PartialEq)]
pub enum GrowthLaw {
    /// `v(t) = start * (1 + rate)^t`
    Linear { rate: f64 },
    /// `v(t) = sum(c_i * t^i)`
    Polynomial { coefficients: Vec<f64> },
    /// `v(t) = k / (1 + ((k - n0) / n0) * e^(-r t))`, `n0 = start` floored at
    /// `k * 0.001` when start is zero
    Logistic { k: f64, r: f64 },
    /// `v(t) = start + step * t`
    Increment { step: f64 },
}

/// Validated variable specification.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSpec {
    pub start: f64,
    pub max: Option<f64>,
    pub min: Option<f64>,
    /// The law advances once every `period` simulation periods
    pub period: u32,
    pub growth: GrowthLaw,
    /// Additive step applied on top of a growth-rate law
    pub extra_increment: Option<f64>,
}

/// One arm of a `cases` body.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseArm {
    pub condition: Expr,
    pub result: Expr,
}

/// A compiled `for` body.
#[derive(Debug, Clone, PartialEq)]
pub struct ForLoop {
    pub iterator: Expr,
    pub aggregation: Aggregation,
    pub body: Vec<Expr>,
}

/// The body of a calculation function.
#[derive(Debug, Clone, PartialEq)]
pub enum CalcBody {
    Direct(Expr),
    Cases(Vec<CaseArm>),
    For(ForLoop),
    Exec(Vec<Expr>),
}

/// A compiled calculation function: ordered preprocess bindings plus a body.
#[derive(Debug, Clone, PartialEq)]
pub struct CalcFn {
    pub preprocess: Vec<(String, Expr)>,
    pub body: CalcBody,
}

/// A compiled resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub name: String,
    pub use_case: String,
    pub calculation_method: String,
    pub billing_method: String,
    pub unit: String,
    pub function: CalcFn,
}

/// A compiled category: ordered resources under one name.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub description: String,
    pub resources: Vec<Resource>,
}

/// The parsed, immutable representation of a configuration document.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    document: Document,
    constants: IndexMap<String, f64>,
    variables: IndexMap<String, VariableSpec>,
    cost: Vec<Category>,
    income: Vec<Category>,
}

/// Build a [`Model`] from a configuration document.
pub fn build_model(document: Document) -> Result<Model, ModelError> {
    Model::build(document)
}

impl Model {
    /// Validate and compile a configuration document.
    pub fn build(document: Document) -> Result<Model, ModelError> {
        debug!(
            constants = document.global.constants.len(),
            variables = document.global.variable.len(),
            cost_categories = document.cost.len(),
            "building model"
        );

        let mut constants = IndexMap::new();
        for (name, value) in &document.global.constants {
            check_name(name, "global constant")?;
            constants.insert(name.clone(), *value);
        }

        let mut variables = IndexMap::new();
        for (name, var) in &document.global.variable {
            check_name(name, "global variable")?;
            if constants.contains_key(name) {
                return Err(ModelError::DuplicateGlobal(name.clone()));
            }
            variables.insert(name.clone(), compile_variable(name, var)?);
        }

        let mut cost = Vec::with_capacity(document.cost.len());
        for (name, category) in &document.cost {
            cost.push(compile_category("cost", name, category)?);
        }

        let income = match &document.income {
            IncomeDoc::Category(category) => {
                vec![compile_category("income", "income", category)?]
            }
            IncomeDoc::Resources(resources) => {
                let category = CategoryDoc {
                    description: "income".to_string(),
                    resource: resources.clone(),
                };
                vec![compile_category("income", "income", &category)?]
            }
        };

        Ok(Model {
            document,
            constants,
            variables,
            cost,
            income,
        })
    }

    /// The document this model was built from.
    pub fn to_document(&self) -> Document {
        self.document.clone()
    }

    /// Global constants in declared order.
    pub fn constants(&self) -> &IndexMap<String, f64> {
        &self.constants
    }

    /// Global variables in declared order.
    pub fn variables(&self) -> &IndexMap<String, VariableSpec> {
        &self.variables
    }

    /// Cost categories in declared order.
    pub fn cost(&self) -> &[Category] {
        &self.cost
    }

    /// Income categories (a single normalised category).
    pub fn income(&self) -> &[Category] {
        &self.income
    }

    /// Initial global values: constants plus each variable's start.
    pub fn initial_globals(&self) -> IndexMap<String, f64> {
        let mut globals = self.constants.clone();
        for (name, spec) in &self.variables {
            globals.insert(name.clone(), spec.start);
        }
        globals
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_name(name: &str, what: &'static str) -> Result<(), ModelError> {
    if !is_valid_name(name) {
        return Err(ModelError::InvalidName {
            what,
            name: name.to_string(),
        });
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(ModelError::ReservedName {
            what,
            name: name.to_string(),
        });
    }
    Ok(())
}

fn compile_variable(
    name: &str,
    var: &document::VariableDoc,
) -> Result<VariableSpec, ModelError> {
    let period = var.period.unwrap_or(1);
    if period == 0 {
        return Err(ModelError::InvalidVariable {
            name: name.to_string(),
            reason: "period must be at least 1".to_string(),
        });
    }

    let (growth, extra_increment) = match (&var.growth_rate, var.increment) {
        (Some(GrowthRateDoc::Linear(rate)), inc) => (GrowthLaw::Linear { rate: *rate }, inc),
        (Some(GrowthRateDoc::Polynomial(coefficients)), inc) => (
            GrowthLaw::Polynomial {
                coefficients: coefficients.clone(),
            },
            inc,
        ),
        (Some(GrowthRateDoc::Logistic { k, r }), inc) => {
            if *k <= 0.0 {
                return Err(ModelError::InvalidVariable {
                    name: name.to_string(),
                    reason: "logistic capacity k must be positive".to_string(),
                });
            }
            (GrowthLaw::Logistic { k: *k, r: *r }, inc)
        }
        (None, Some(step)) => (GrowthLaw::Increment { step }, None),
        (None, None) => {
            return Err(ModelError::InvalidVariable {
                name: name.to_string(),
                reason: "needs a growth_rate or an increment".to_string(),
            })
        }
    };

    Ok(VariableSpec {
        start: var.start,
        max: var.max,
        min: var.min,
        period,
        growth,
        extra_increment,
    })
}

fn compile_category(
    branch: &str,
    name: &str,
    category: &CategoryDoc,
) -> Result<Category, ModelError> {
    let mut resources = Vec::with_capacity(category.resource.len());
    for resource in &category.resource {
        let context = format!("{}/{}/{}", branch, name, resource.name);
        debug!(resource = %context, "compiling calculation function");
        resources.push(Resource {
            name: resource.name.clone(),
            use_case: resource.use_case.clone(),
            calculation_method: resource.calculation_method.clone(),
            billing_method: resource.billing_method.clone(),
            unit: resource.unit.clone(),
            function: compile_function(&context, &resource.calculation_function)?,
        });
    }
    Ok(Category {
        name: name.to_string(),
        description: category.description.clone(),
        resources,
    })
}

fn compile_function(context: &str, function: &CalcFnDoc) -> Result<CalcFn, ModelError> {
    match function {
        CalcFnDoc::Direct(source) => Ok(CalcFn {
            preprocess: Vec::new(),
            body: CalcBody::Direct(parse_in(context, "expression", source)?),
        }),
        CalcFnDoc::Structured(structured) => compile_structured(context, structured),
    }
}

fn compile_structured(context: &str, f: &StructuredFnDoc) -> Result<CalcFn, ModelError> {
    let mut preprocess = Vec::new();
    if let Some(entries) = &f.preprocess {
        for (name, source) in entries {
            check_name(name, "preprocess binding")?;
            preprocess.push((name.clone(), parse_in(context, "preprocess", source)?));
        }
    }

    let present = [
        f.result.is_some(),
        f.cases.is_some(),
        f.for_loop.is_some(),
        f.exec.is_some(),
    ]
    .iter()
    .filter(|p| **p)
    .count();
    if present != 1 {
        return Err(ModelError::AmbiguousBody {
            context: context.to_string(),
        });
    }

    let body = if let Some(source) = &f.result {
        CalcBody::Direct(parse_in(context, "result", source)?)
    } else if let Some(cases) = &f.cases {
        let mut arms = Vec::with_capacity(cases.len());
        for case in cases {
            arms.push(CaseArm {
                condition: parse_in(context, "case condition", &case.case)?,
                result: parse_in(context, "case result", &case.result)?,
            });
        }
        CalcBody::Cases(arms)
    } else if let Some(for_loop) = &f.for_loop {
        let aggregation = Aggregation::parse(&for_loop.aggregation).ok_or_else(|| {
            ModelError::InvalidAggregation {
                context: context.to_string(),
                found: for_loop.aggregation.clone(),
            }
        })?;
        CalcBody::For(ForLoop {
            iterator: parse_in(context, "iterator", &for_loop.iterator)?,
            aggregation,
            body: parse_block(context, &for_loop.exec)?,
        })
    } else if let Some(exec) = &f.exec {
        CalcBody::Exec(parse_block(context, exec)?)
    } else {
        unreachable!("exactly-one check above")
    };

    Ok(CalcFn { preprocess, body })
}

fn parse_in(context: &str, what: &str, source: &str) -> Result<Expr, ModelError> {
    parse_expression(source).map_err(|source| ModelError::Expression {
        context: format!("{} {}", context, what),
        source,
    })
}

fn parse_block(context: &str, sources: &[String]) -> Result<Vec<Expr>, ModelError> {
    let mut statements = Vec::new();
    for source in sources {
        let parsed = parse_statements(source).map_err(|source| ModelError::Expression {
            context: format!("{} exec", context),
            source,
        })?;
        statements.extend(parsed);
    }
    Ok(statements)
}

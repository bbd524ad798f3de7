//! Calculation engine: per-resource evaluation and report assembly.
//!
//! Every resource is evaluated in a fresh local frame layered on the current
//! globals. Preprocess bindings run first in declared order and are visible
//! to later bindings and to the body; the body then dispatches on its form
//! (direct, cases, for-loop, exec).

use tracing::{debug, warn};

use crate::engine::report::{BranchTotals, Report};
use crate::engine::EngineError;
use crate::expr::eval::{evaluate, truthy, EvalError};
use crate::expr::scope::Scope;
use crate::model::{Aggregation, CalcBody, CalcFn, Category, ForLoop, Model};
use crate::rng::RandomSource;

/// Evaluate every resource of `model` against `scope` and assemble a report.
pub(crate) fn generate_report(
    model: &Model,
    scope: &mut Scope,
    random: &mut RandomSource,
    period: u32,
) -> Result<Report, EngineError> {
    let (costs, total_cost) = evaluate_branch(model.cost(), scope, random)?;
    let (income, total_income) = evaluate_branch(model.income(), scope, random)?;

    Ok(Report {
        period,
        timestamp: None,
        globals: scope.globals_snapshot(),
        costs,
        income,
        total_cost,
        total_income,
        net_result: total_income - total_cost,
    })
}

fn evaluate_branch(
    categories: &[Category],
    scope: &mut Scope,
    random: &mut RandomSource,
) -> Result<(BranchTotals, f64), EngineError> {
    let mut totals = BranchTotals::new();
    let mut branch_total = 0.0;

    for category in categories {
        let mut by_resource = indexmap::IndexMap::new();
        for resource in &category.resources {
            scope.push_frame();
            let outcome = evaluate_resource(&resource.function, scope, random);
            scope.pop_frame();

            let value = outcome.map_err(|source| EngineError::Resource {
                category: category.name.clone(),
                resource: resource.name.clone(),
                source,
            })?;
            debug!(
                category = %category.name,
                resource = %resource.name,
                value,
                "resource evaluated"
            );
            branch_total += value;
            by_resource.insert(resource.name.clone(), value);
        }
        totals.insert(category.name.clone(), by_resource);
    }

    Ok((totals, branch_total))
}

/// Evaluate one calculation function in the current local frame.
pub(crate) fn evaluate_resource(
    function: &CalcFn,
    scope: &mut Scope,
    random: &mut RandomSource,
) -> Result<f64, EvalError> {
    for (name, expr) in &function.preprocess {
        let value = evaluate(expr, scope, random)?;
        scope.assign(name, value);
    }

    match &function.body {
        CalcBody::Direct(expr) => evaluate(expr, scope, random),

        CalcBody::Cases(arms) => {
            // Declared order is binding: the first truthy condition wins
            for arm in arms {
                if truthy(evaluate(&arm.condition, scope, random)?) {
                    return evaluate(&arm.result, scope, random);
                }
            }
            Err(EvalError::NoMatchingCase)
        }

        CalcBody::Exec(statements) => {
            for statement in statements {
                evaluate(statement, scope, random)?;
            }
            scope
                .lookup_innermost("result")
                .ok_or_else(|| EvalError::UndefinedName("result".to_string()))
        }

        CalcBody::For(for_loop) => evaluate_for(for_loop, scope, random),
    }
}

fn evaluate_for(
    for_loop: &ForLoop,
    scope: &mut Scope,
    random: &mut RandomSource,
) -> Result<f64, EvalError> {
    let raw = evaluate(&for_loop.iterator, scope, random)?;
    // Round toward zero
    let count = raw.trunc() as i64;
    if count <= 0 {
        // Degenerate policy: every aggregation of zero iterations is 0.0
        warn!(iterator = raw, "for-loop iterator not positive");
        return Ok(0.0);
    }

    let mut accumulator = match for_loop.aggregation {
        Aggregation::Sum | Aggregation::Average => 0.0,
        Aggregation::Max => f64::NEG_INFINITY,
        Aggregation::Min => f64::INFINITY,
    };

    for i in 1..=count {
        // Fresh frame per iteration: inherits preprocess bindings by
        // fall-through, shadows them on write, and isolates `result`
        scope.push_frame();
        scope.assign("i", i as f64);
        let iteration = run_iteration(&for_loop.body, scope, random);
        scope.pop_frame();
        let value = iteration?;

        match for_loop.aggregation {
            Aggregation::Sum | Aggregation::Average => accumulator += value,
            Aggregation::Max => accumulator = accumulator.max(value),
            Aggregation::Min => accumulator = accumulator.min(value),
        }
    }

    Ok(match for_loop.aggregation {
        Aggregation::Average => accumulator / count as f64,
        _ => accumulator,
    })
}

fn run_iteration(
    body: &[crate::expr::ast::Expr],
    scope: &mut Scope,
    random: &mut RandomSource,
) -> Result<f64, EvalError> {
    for statement in body {
        evaluate(statement, scope, random)?;
    }
    scope
        .lookup_innermost("result")
        .ok_or_else(|| EvalError::UndefinedName("result".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::parser::{parse_expression, parse_statements};
    use indexmap::IndexMap;

    fn scope_with(globals: &[(&str, f64)]) -> Scope {
        let globals: IndexMap<String, f64> =
            globals.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        let mut scope = Scope::new(globals);
        scope.push_frame();
        scope
    }

    fn direct(source: &str) -> CalcFn {
        CalcFn {
            preprocess: Vec::new(),
            body: CalcBody::Direct(parse_expression(source).unwrap()),
        }
    }

    fn for_loop(iterator: &str, aggregation: Aggregation, body: &[&str]) -> CalcFn {
        CalcFn {
            preprocess: Vec::new(),
            body: CalcBody::For(ForLoop {
                iterator: parse_expression(iterator).unwrap(),
                aggregation,
                body: body
                    .iter()
                    .flat_map(|s| parse_statements(s).unwrap())
                    .collect(),
            }),
        }
    }

    #[test]
    fn test_direct_body() {
        let mut scope = scope_with(&[("users", 10.0)]);
        let mut random = RandomSource::new(42);
        let value = evaluate_resource(&direct("users * 3"), &mut scope, &mut random).unwrap();
        assert_eq!(value, 30.0);
    }

    #[test]
    fn test_preprocess_visible_to_body() {
        let mut scope = scope_with(&[("users", 10.0)]);
        let mut random = RandomSource::new(42);
        let function = CalcFn {
            preprocess: vec![(
                "r".to_string(),
                parse_expression("global.users * 2").unwrap(),
            )],
            body: CalcBody::Direct(parse_expression("r + 1").unwrap()),
        };
        let value = evaluate_resource(&function, &mut scope, &mut random).unwrap();
        assert_eq!(value, 21.0);
    }

    #[test]
    fn test_preprocess_entries_see_earlier_entries() {
        let mut scope = scope_with(&[]);
        let mut random = RandomSource::new(42);
        let function = CalcFn {
            preprocess: vec![
                ("a".to_string(), parse_expression("2").unwrap()),
                ("b".to_string(), parse_expression("a * 5").unwrap()),
            ],
            body: CalcBody::Direct(parse_expression("b").unwrap()),
        };
        assert_eq!(
            evaluate_resource(&function, &mut scope, &mut random).unwrap(),
            10.0
        );
    }

    #[test]
    fn test_cases_first_truthy_wins() {
        let mut scope = scope_with(&[("x", 5.0)]);
        let mut random = RandomSource::new(42);
        let function = CalcFn {
            preprocess: Vec::new(),
            body: CalcBody::Cases(vec![
                crate::model::CaseArm {
                    condition: parse_expression("x < 0").unwrap(),
                    result: parse_expression("1").unwrap(),
                },
                crate::model::CaseArm {
                    condition: parse_expression("x < 10").unwrap(),
                    result: parse_expression("2").unwrap(),
                },
                crate::model::CaseArm {
                    condition: parse_expression("x >= 10").unwrap(),
                    result: parse_expression("3").unwrap(),
                },
            ]),
        };
        assert_eq!(
            evaluate_resource(&function, &mut scope, &mut random).unwrap(),
            2.0
        );
    }

    #[test]
    fn test_cases_exhausted_is_an_error() {
        let mut scope = scope_with(&[("x", 5.0)]);
        let mut random = RandomSource::new(42);
        let function = CalcFn {
            preprocess: Vec::new(),
            body: CalcBody::Cases(vec![crate::model::CaseArm {
                condition: parse_expression("x < 0").unwrap(),
                result: parse_expression("1").unwrap(),
            }]),
        };
        assert_eq!(
            evaluate_resource(&function, &mut scope, &mut random).unwrap_err(),
            EvalError::NoMatchingCase
        );
    }

    #[test]
    fn test_for_sum_of_constant() {
        let mut scope = scope_with(&[]);
        let mut random = RandomSource::new(42);
        let function = for_loop("5", Aggregation::Sum, &["result = 7"]);
        assert_eq!(
            evaluate_resource(&function, &mut scope, &mut random).unwrap(),
            35.0
        );
    }

    #[test]
    fn test_for_average_of_counter() {
        let mut scope = scope_with(&[]);
        let mut random = RandomSource::new(42);
        let function = for_loop("4", Aggregation::Average, &["result = i"]);
        assert_eq!(
            evaluate_resource(&function, &mut scope, &mut random).unwrap(),
            2.5
        );
    }

    #[test]
    fn test_for_max_and_min_of_counter() {
        let mut random = RandomSource::new(42);
        let mut scope = scope_with(&[]);
        let max = for_loop("4", Aggregation::Max, &["result = i"]);
        assert_eq!(
            evaluate_resource(&max, &mut scope, &mut random).unwrap(),
            4.0
        );
        let min = for_loop("4", Aggregation::Min, &["result = i"]);
        assert_eq!(
            evaluate_resource(&min, &mut scope, &mut random).unwrap(),
            1.0
        );
    }

    #[test]
    fn test_for_iterator_rounds_toward_zero() {
        let mut scope = scope_with(&[]);
        let mut random = RandomSource::new(42);
        let function = for_loop("3.9", Aggregation::Sum, &["result = 1"]);
        assert_eq!(
            evaluate_resource(&function, &mut scope, &mut random).unwrap(),
            3.0
        );
    }

    #[test]
    fn test_for_nonpositive_iterator_degenerates_to_zero() {
        let mut scope = scope_with(&[]);
        let mut random = RandomSource::new(42);
        for aggregation in [
            Aggregation::Sum,
            Aggregation::Average,
            Aggregation::Max,
            Aggregation::Min,
        ] {
            let function = for_loop("0 - 2", aggregation, &["result = 1"]);
            assert_eq!(
                evaluate_resource(&function, &mut scope, &mut random).unwrap(),
                0.0
            );
        }
    }

    #[test]
    fn test_for_body_without_result_fails() {
        let mut scope = scope_with(&[]);
        let mut random = RandomSource::new(42);
        let function = for_loop("3", Aggregation::Sum, &["x = i * 2"]);
        assert_eq!(
            evaluate_resource(&function, &mut scope, &mut random).unwrap_err(),
            EvalError::UndefinedName("result".to_string())
        );
    }

    #[test]
    fn test_for_iterations_inherit_preprocess_but_not_each_other() {
        let mut scope = scope_with(&[]);
        let mut random = RandomSource::new(42);
        let function = CalcFn {
            preprocess: vec![("base".to_string(), parse_expression("10").unwrap())],
            body: CalcBody::For(ForLoop {
                iterator: parse_expression("3").unwrap(),
                aggregation: Aggregation::Sum,
                // `base` is readable; writes shadow it per iteration
                body: parse_statements("base = base + 1\nresult = base").unwrap(),
            }),
        };
        // Each iteration starts from base = 10, so result is 11 every time
        assert_eq!(
            evaluate_resource(&function, &mut scope, &mut random).unwrap(),
            33.0
        );
    }

    #[test]
    fn test_exec_final_result_is_the_value() {
        let mut scope = scope_with(&[("users", 4.0)]);
        let mut random = RandomSource::new(42);
        let function = CalcFn {
            preprocess: Vec::new(),
            body: CalcBody::Exec(
                parse_statements("base = users * 10\nresult = base + 2").unwrap(),
            ),
        };
        assert_eq!(
            evaluate_resource(&function, &mut scope, &mut random).unwrap(),
            42.0
        );
    }

    #[test]
    fn test_exec_without_result_fails() {
        let mut scope = scope_with(&[]);
        let mut random = RandomSource::new(42);
        let function = CalcFn {
            preprocess: Vec::new(),
            body: CalcBody::Exec(parse_statements("x = 1").unwrap()),
        };
        assert_eq!(
            evaluate_resource(&function, &mut scope, &mut random).unwrap_err(),
            EvalError::UndefinedName("result".to_string())
        );
    }
}

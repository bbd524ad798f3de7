//! Simulation driver.
//!
//! The [`Engine`] owns the model and the seeded random source, so every
//! simulation run with the same model, seed and period count reproduces the
//! same reports.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::calc::generate_report;
use crate::engine::growth::variable_value;
use crate::engine::report::Report;
use crate::engine::EngineError;
use crate::expr::scope::Scope;
use crate::model::{Model, ModelError};
use crate::rng::RandomSource;

/// Default random seed; override through [`EngineConfig`].
pub const DEFAULT_SEED: u64 = 42;

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seed for the random source
    pub seed: u64,

    /// When true (the default), a simulation of N periods yields N reports
    /// where the first reflects the unadvanced initial snapshot (t = 0).
    /// When false, variables advance before the first report, yielding N
    /// reports for t = 1..=N.
    pub include_initial: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            include_initial: true,
        }
    }
}

/// Simulation engine: a model plus the deterministic random source.
#[derive(Debug, Clone)]
pub struct Engine {
    model: Model,
    config: EngineConfig,
    random: RandomSource,
}

impl Engine {
    /// Create an engine with the default configuration (seed 42).
    pub fn new(model: Model) -> Self {
        Self::with_config(model, EngineConfig::default())
    }

    /// Create an engine with an explicit configuration.
    pub fn with_config(model: Model, config: EngineConfig) -> Self {
        let random = RandomSource::new(config.seed);
        Self {
            model,
            config,
            random,
        }
    }

    /// The engine's model.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Generate one report from the initial snapshot plus `overrides`.
    pub fn single_report(
        &mut self,
        overrides: &HashMap<String, f64>,
    ) -> Result<Report, EngineError> {
        let (globals, _) = self.initial_state(overrides)?;
        let mut scope = Scope::new(globals);
        generate_report(&self.model, &mut scope, &mut self.random, 0)
    }

    /// Run a simulation over `periods` periods.
    ///
    /// Variables advance through their growth laws before each evaluated
    /// period except the initial snapshot (see [`EngineConfig`]).
    pub fn simulate(
        &mut self,
        periods: u32,
        overrides: &HashMap<String, f64>,
    ) -> Result<Vec<Report>, EngineError> {
        if periods == 0 {
            return Ok(Vec::new());
        }

        let (globals, starts) = self.initial_state(overrides)?;
        let mut scope = Scope::new(globals);
        info!(periods, include_initial = self.config.include_initial, "starting simulation");

        let (first, last) = if self.config.include_initial {
            (0, periods - 1)
        } else {
            (1, periods)
        };

        let mut reports = Vec::with_capacity(periods as usize);
        for t in first..=last {
            if t > 0 {
                self.advance_variables(&starts, &mut scope, t);
            }
            reports.push(generate_report(
                &self.model,
                &mut scope,
                &mut self.random,
                t,
            )?);
        }

        info!(reports = reports.len(), "simulation finished");
        Ok(reports)
    }

    /// Initial globals and effective per-variable start values.
    ///
    /// An override of a constant replaces the constant; an override of a
    /// variable replaces its start, and growth proceeds from there.
    fn initial_state(
        &self,
        overrides: &HashMap<String, f64>,
    ) -> Result<(IndexMap<String, f64>, IndexMap<String, f64>), EngineError> {
        for name in overrides.keys() {
            if !self.model.constants().contains_key(name)
                && !self.model.variables().contains_key(name)
            {
                return Err(ModelError::UnknownOverride(name.clone()).into());
            }
        }

        let mut globals = self.model.initial_globals();
        let mut starts = IndexMap::new();
        for (name, spec) in self.model.variables() {
            starts.insert(name.clone(), spec.start);
        }
        for (name, value) in overrides {
            globals.insert(name.clone(), *value);
            if starts.contains_key(name) {
                starts.insert(name.clone(), *value);
            }
        }
        Ok((globals, starts))
    }

    /// Advance every variable to its value at period `t`.
    fn advance_variables(&self, starts: &IndexMap<String, f64>, scope: &mut Scope, t: u32) {
        for (name, spec) in self.model.variables() {
            // A variable with period p advances its law every p-th period
            let steps = t / spec.period;
            let value = variable_value(spec, starts[name], steps);
            scope.set_global(name, value);
        }
    }
}

//! Layered variable scope.
//!
//! A scope is a stack of local frames over a segregated globals mapping. The
//! `global.*` qualifier is an access path into the globals mapping, not a
//! lexical parent: qualified lookups never consult local frames.

use indexmap::IndexMap;
use std::collections::HashMap;

/// Stack of name→value frames over the globals mapping.
///
/// Lookup walks frames inner-to-outer and falls through to globals. Writes
/// from expression code always target the innermost frame; the simulation
/// driver writes globals directly via [`Scope::set_global`].
#[derive(Debug, Clone)]
pub struct Scope {
    globals: IndexMap<String, f64>,
    frames: Vec<HashMap<String, f64>>,
}

impl Scope {
    /// Create a scope over the given globals, with no local frames.
    pub fn new(globals: IndexMap<String, f64>) -> Self {
        Self {
            globals,
            frames: Vec::new(),
        }
    }

    /// Push a fresh local frame.
    pub fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Pop the innermost local frame.
    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Look up a plain name: frames inner-to-outer, then globals.
    pub fn lookup(&self, name: &str) -> Option<f64> {
        for frame in self.frames.iter().rev() {
            if let Some(value) = frame.get(name) {
                return Some(*value);
            }
        }
        self.globals.get(name).copied()
    }

    /// Look up a name in the globals mapping only (`global.x`).
    pub fn lookup_global(&self, name: &str) -> Option<f64> {
        self.globals.get(name).copied()
    }

    /// Look up a name in the innermost frame only.
    ///
    /// Used to read `result` after an exec block or a loop iteration, where
    /// fall-through to an outer binding would mask a missing assignment.
    pub fn lookup_innermost(&self, name: &str) -> Option<f64> {
        self.frames.last().and_then(|frame| frame.get(name)).copied()
    }

    /// Bind a name in the innermost frame (or in globals when no frame is
    /// active).
    pub fn assign(&mut self, name: &str, value: f64) {
        match self.frames.last_mut() {
            Some(frame) => {
                frame.insert(name.to_string(), value);
            }
            None => {
                self.globals.insert(name.to_string(), value);
            }
        }
    }

    /// Write a global directly, bypassing local frames.
    pub fn set_global(&mut self, name: &str, value: f64) {
        self.globals.insert(name.to_string(), value);
    }

    /// Snapshot of the globals mapping in insertion order.
    pub fn globals_snapshot(&self) -> IndexMap<String, f64> {
        self.globals.clone()
    }
}

//! Growth laws for global variables.
//!
//! Each law is a closed form of the variable's start value and the number of
//! elapsed growth steps, so advancing to period `t` never depends on the
//! previous period's (possibly clamped) value.

use crate::model::{GrowthLaw, VariableSpec};

/// Value of a variable after `steps` applications of its growth law.
///
/// `start` is passed in separately because an override may replace the
/// spec's start value. Bounds clamp after growth: `max` caps, `min` floors.
pub(crate) fn variable_value(spec: &VariableSpec, start: f64, steps: u32) -> f64 {
    let t = steps as f64;
    let mut value = match &spec.growth {
        GrowthLaw::Linear { rate } => start * (1.0 + rate).powf(t),

        GrowthLaw::Polynomial { coefficients } => coefficients
            .iter()
            .enumerate()
            .map(|(i, c)| c * t.powi(i as i32))
            .sum(),

        GrowthLaw::Logistic { k, r } => {
            // A zero start would pin the curve at zero forever
            let n0 = if start == 0.0 { k * 0.001 } else { start };
            k / (1.0 + ((k - n0) / n0) * (-r * t).exp())
        }

        GrowthLaw::Increment { step } => start + step * t,
    };

    if let Some(extra) = spec.extra_increment {
        value += extra * t;
    }
    if let Some(max) = spec.max {
        value = value.min(max);
    }
    if let Some(min) = spec.min {
        value = value.max(min);
    }
    value
}

//! Report produced per evaluated period.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Per-category, per-resource totals.
pub type BranchTotals = IndexMap<String, IndexMap<String, f64>>;

/// One period's computed costs, income and net result.
///
/// Categories and resources appear in declared model order. Values are stored
/// as computed, without rounding. The `timestamp` is left for the host to
/// fill before serialisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Period index this report was computed for (0 = initial snapshot)
    pub period: u32,

    /// Host-set wall-clock stamp; the engine never fills this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Exact global values used for this evaluation
    pub globals: IndexMap<String, f64>,

    pub costs: BranchTotals,
    pub income: BranchTotals,

    pub total_cost: f64,
    pub total_income: f64,
    pub net_result: f64,
}

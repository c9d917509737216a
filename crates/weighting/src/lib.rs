//! Confidence Weighter: scales `revenue_per_employee` by the readiness score
//! to produce one defensible, risk-adjusted output value per row.

use core_types::{FinalRow, FinalTable, FlaggedTable};
use tracing::debug;

/// Computes `confidence_weighted_rpe = revenue_per_employee * (score / 100)`
/// for every row. Pure and stateless; absent ratios stay absent.
pub fn apply_confidence_weighting(flagged: &FlaggedTable) -> FinalTable {
    let rows: Vec<FinalRow> = flagged
        .rows
        .iter()
        .map(|row| {
            let confidence_weighted_rpe = row
                .kpi
                .revenue_per_employee
                .map(|rpe| rpe * (row.data_readiness_score as f64 / 100.0))
                .filter(|value| !value.is_nan());
            FinalRow {
                flagged: row.clone(),
                confidence_weighted_rpe,
            }
        })
        .collect();

    debug!(rows = rows.len(), "applied confidence weighting");

    FinalTable {
        metric_names: flagged.metric_names.clone(),
        rows,
    }
}

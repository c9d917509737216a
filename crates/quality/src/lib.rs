//! Anomaly Flagger & Readiness Scorer: applies validity rules to KPI rows and
//! grades each one with a transparent additive score.

use crate::error::QualityError;
use configuration::QualitySettings;
use core_types::schema::{METRIC_EMPLOYEES, METRIC_REVENUE};
use core_types::{FlaggedRow, FlaggedTable, KpiRow, KpiTable, QualityFlags};
use tracing::debug;

pub mod error;

/// The flagging and scoring engine.
///
/// Every flag is an independent predicate over the row's own fields. The
/// readiness score starts at 100, subtracts the penalty of each triggered
/// flag, and clamps the total to `[0, 100]`. It is a coarse, human-auditable
/// proxy for trustworthiness, not a statistical estimate.
pub struct QualityEngine {
    policy: QualitySettings,
}

impl QualityEngine {
    pub fn new(policy: QualitySettings) -> Self {
        Self { policy }
    }

    /// Flags and scores every row of the KPI table. The `revenue` and
    /// `employees` metric columns are part of this stage's input contract;
    /// their absence is structural and aborts before any output exists.
    pub fn run(&self, kpis: &KpiTable) -> Result<FlaggedTable, QualityError> {
        let missing: Vec<String> = [METRIC_REVENUE, METRIC_EMPLOYEES]
            .iter()
            .filter(|name| !kpis.metric_names.iter().any(|metric| metric == *name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(QualityError::MissingColumns(missing));
        }

        let rows: Vec<FlaggedRow> = kpis.rows.iter().map(|row| self.flag_row(row)).collect();
        debug!(
            rows = rows.len(),
            flagged = rows
                .iter()
                .filter(|row| row.data_readiness_score < 100)
                .count(),
            "flagged KPI rows"
        );
        Ok(FlaggedTable {
            metric_names: kpis.metric_names.clone(),
            rows,
        })
    }

    fn flag_row(&self, row: &KpiRow) -> FlaggedRow {
        let revenue = row.fact.metric(METRIC_REVENUE);
        let employees = row.fact.metric(METRIC_EMPLOYEES);
        let policy = &self.policy;

        let flags = QualityFlags {
            missing_revenue: revenue.is_none(),
            missing_employees: employees.is_none(),
            negative_revenue: revenue.unwrap_or(0.0) < 0.0,
            negative_employees: employees.unwrap_or(0.0) < 0.0,
            rpe_extreme: row
                .revenue_per_employee
                .is_some_and(|rpe| rpe < policy.rpe_lower || rpe > policy.rpe_upper),
            yoy_extreme: row
                .revenue_yoy_growth
                .is_some_and(|yoy| yoy < policy.yoy_lower || yoy > policy.yoy_upper),
        };

        // Penalties are additive; overlapping issues all apply.
        let mut score = 100i64;
        if flags.missing_revenue {
            score -= policy.penalty_missing_revenue;
        }
        if flags.missing_employees {
            score -= policy.penalty_missing_employees;
        }
        if flags.negative_revenue {
            score -= policy.penalty_negative_revenue;
        }
        if flags.negative_employees {
            score -= policy.penalty_negative_employees;
        }
        if flags.rpe_extreme {
            score -= policy.penalty_rpe_extreme;
        }
        if flags.yoy_extreme {
            score -= policy.penalty_yoy_extreme;
        }

        FlaggedRow {
            kpi: row.clone(),
            flags,
            data_readiness_score: score.clamp(0, 100),
        }
    }
}

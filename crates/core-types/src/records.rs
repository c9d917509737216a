use crate::schema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One raw manually-collected row: a single metric reported for one
/// company-year. Every field is optional text exactly as collected;
/// normalization and numeric parsing happen in the fact table builder.
///
/// Identity is NOT unique per row. Multiple observations may share
/// `(company_id, year, metric_name)` and are resolved deterministically
/// during the pivot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub company_id: Option<String>,
    pub company_name: Option<String>,
    pub year: Option<String>,
    pub metric_name: Option<String>,
    pub metric_value: Option<String>,
    pub currency: Option<String>,
    pub notes: Option<String>,
    pub source_url: Option<String>,
    pub source_type: Option<String>,
    pub last_updated: Option<String>,
}

/// One wide retailer-year row: the key tuple, one entry per metric column,
/// and the per-key metadata stamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactRow {
    pub company_id: String,
    pub company_name: String,
    /// Kept as the normalized int-like string; the KPI stage coerces it.
    pub year: String,
    /// One entry per metric column of the table. `None` means the metric was
    /// never observed (or never parsed) for this key.
    pub metrics: BTreeMap<String, Option<f64>>,
    /// Latest observation timestamp for this key (lexicographic max of the
    /// ISO `YYYY-MM-DD` stamps).
    pub last_updated: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl FactRow {
    /// Looks up a metric value, flattening "column absent" and "value absent"
    /// into one `None`.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied().flatten()
    }
}

/// The wide retailer-year fact table. Invariants: the key tuple
/// `(company_id, company_name, year)` is unique across rows, every row
/// carries every metric column, and rows are ordered by `(company_id, year)`
/// ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactTable {
    /// The metric column set, in column order.
    pub metric_names: Vec<String>,
    pub rows: Vec<FactRow>,
}

impl FactTable {
    /// The full column order of the persisted snapshot.
    pub fn column_names(&self) -> Vec<String> {
        let mut columns = vec![
            schema::COL_COMPANY_ID.to_string(),
            schema::COL_COMPANY_NAME.to_string(),
            schema::COL_YEAR.to_string(),
        ];
        columns.extend(self.metric_names.iter().cloned());
        columns.push(schema::COL_LAST_UPDATED.to_string());
        columns.push(schema::COL_CREATED_AT.to_string());
        columns.push(schema::COL_UPDATED_AT.to_string());
        columns
    }
}

/// A fact row extended with the derived KPIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiRow {
    pub fact: FactRow,
    /// `revenue / employees`. Absent when either operand is absent or both
    /// are zero; a signed infinity when only `employees` is zero, so a
    /// division-by-zero stays distinguishable from any real ratio.
    pub revenue_per_employee: Option<f64>,
    /// Percent change against the previous available year of the same
    /// company. Absent on a company's first row or when either revenue is
    /// absent or the previous one is zero.
    pub revenue_yoy_growth: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiTable {
    pub metric_names: Vec<String>,
    pub rows: Vec<KpiRow>,
}

impl KpiTable {
    pub fn column_names(&self) -> Vec<String> {
        let mut columns = FactTable {
            metric_names: self.metric_names.clone(),
            rows: Vec::new(),
        }
        .column_names();
        columns.push(schema::COL_REVENUE_PER_EMPLOYEE.to_string());
        columns.push(schema::COL_REVENUE_YOY_GROWTH.to_string());
        columns
    }
}

/// The six independent data-quality flags. Each is a pure predicate over the
/// row's own fields; none depends on evaluation order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityFlags {
    pub missing_revenue: bool,
    pub missing_employees: bool,
    pub negative_revenue: bool,
    pub negative_employees: bool,
    pub rpe_extreme: bool,
    pub yoy_extreme: bool,
}

/// A KPI row extended with quality flags and the readiness score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedRow {
    pub kpi: KpiRow,
    pub flags: QualityFlags,
    /// Additive-penalty trustworthiness proxy, clamped to `[0, 100]`.
    pub data_readiness_score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedTable {
    pub metric_names: Vec<String>,
    pub rows: Vec<FlaggedRow>,
}

impl FlaggedTable {
    pub fn column_names(&self) -> Vec<String> {
        let mut columns = KpiTable {
            metric_names: self.metric_names.clone(),
            rows: Vec::new(),
        }
        .column_names();
        columns.push(schema::COL_FLAG_MISSING_REVENUE.to_string());
        columns.push(schema::COL_FLAG_MISSING_EMPLOYEES.to_string());
        columns.push(schema::COL_FLAG_NEGATIVE_REVENUE.to_string());
        columns.push(schema::COL_FLAG_NEGATIVE_EMPLOYEES.to_string());
        columns.push(schema::COL_FLAG_RPE_EXTREME.to_string());
        columns.push(schema::COL_FLAG_YOY_EXTREME.to_string());
        columns.push(schema::COL_DATA_READINESS_SCORE.to_string());
        columns
    }
}

/// A flagged row extended with the confidence-weighted KPI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalRow {
    pub flagged: FlaggedRow,
    /// `revenue_per_employee * (data_readiness_score / 100)`; absent when the
    /// ratio is absent.
    pub confidence_weighted_rpe: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalTable {
    pub metric_names: Vec<String>,
    pub rows: Vec<FinalRow>,
}

impl FinalTable {
    pub fn column_names(&self) -> Vec<String> {
        let mut columns = FlaggedTable {
            metric_names: self.metric_names.clone(),
            rows: Vec::new(),
        }
        .column_names();
        columns.push(schema::COL_CONFIDENCE_WEIGHTED_RPE.to_string());
        columns
    }
}

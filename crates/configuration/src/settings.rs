use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the whole pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub paths: Paths,
    /// Flagging thresholds and score penalties. Optional in the file; the
    /// defaults are the documented policy constants.
    #[serde(default)]
    pub quality: QualitySettings,
}

/// Every file the pipeline reads or writes, named explicitly so no stage ever
/// resolves a path relative to ambient process state.
#[derive(Debug, Clone, Deserialize)]
pub struct Paths {
    /// The raw long-format manual-collection CSV.
    pub observations: PathBuf,
    /// The wide retailer-year fact table snapshot.
    pub facts: PathBuf,
    /// The fact table extended with derived KPIs.
    pub kpis: PathBuf,
    /// The KPI table extended with flags and the readiness score.
    pub flagged_kpis: PathBuf,
    /// The final confidence-weighted KPI table.
    pub final_kpis: PathBuf,
    /// Directory the companion run reports are written into.
    pub reports: PathBuf,
}

/// Anomaly thresholds and readiness-score penalties.
///
/// A `revenue_per_employee` outside `(rpe_lower, rpe_upper)` or a
/// `revenue_yoy_growth` outside `(yoy_lower, yoy_upper)` is flagged extreme.
/// Penalties are additive and the resulting score is clamped to `[0, 100]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QualitySettings {
    pub rpe_lower: f64,
    pub rpe_upper: f64,
    pub yoy_lower: f64,
    pub yoy_upper: f64,
    pub penalty_missing_revenue: i64,
    pub penalty_missing_employees: i64,
    pub penalty_negative_revenue: i64,
    pub penalty_negative_employees: i64,
    pub penalty_rpe_extreme: i64,
    pub penalty_yoy_extreme: i64,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            rpe_lower: 0.0,
            rpe_upper: 1000.0,
            yoy_lower: -0.5,
            yoy_upper: 2.0,
            penalty_missing_revenue: 40,
            penalty_missing_employees: 20,
            penalty_negative_revenue: 40,
            penalty_negative_employees: 40,
            penalty_rpe_extreme: 10,
            penalty_yoy_extreme: 10,
        }
    }
}

//! Canonical column names shared by every pipeline stage.

/// The columns a raw observation file must carry. Extra columns are ignored;
/// any missing one is a fatal structural error.
pub const OBSERVATION_COLUMNS: [&str; 10] = [
    "company_id",
    "company_name",
    "year",
    "metric_name",
    "metric_value",
    "currency",
    "notes",
    "source_url",
    "source_type",
    "last_updated",
];

pub const COL_COMPANY_ID: &str = "company_id";
pub const COL_COMPANY_NAME: &str = "company_name";
pub const COL_YEAR: &str = "year";
pub const COL_LAST_UPDATED: &str = "last_updated";
pub const COL_CREATED_AT: &str = "created_at";
pub const COL_UPDATED_AT: &str = "updated_at";

/// Metric columns the KPI calculator depends on.
pub const METRIC_REVENUE: &str = "revenue";
pub const METRIC_EMPLOYEES: &str = "employees";

pub const COL_REVENUE_PER_EMPLOYEE: &str = "revenue_per_employee";
pub const COL_REVENUE_YOY_GROWTH: &str = "revenue_yoy_growth";

pub const COL_FLAG_MISSING_REVENUE: &str = "flag_missing_revenue";
pub const COL_FLAG_MISSING_EMPLOYEES: &str = "flag_missing_employees";
pub const COL_FLAG_NEGATIVE_REVENUE: &str = "flag_negative_revenue";
pub const COL_FLAG_NEGATIVE_EMPLOYEES: &str = "flag_negative_employees";
pub const COL_FLAG_RPE_EXTREME: &str = "flag_rpe_extreme";
pub const COL_FLAG_YOY_EXTREME: &str = "flag_yoy_extreme";
pub const COL_DATA_READINESS_SCORE: &str = "data_readiness_score";
pub const COL_CONFIDENCE_WEIGHTED_RPE: &str = "confidence_weighted_rpe";

use crate::report::{CheckResult, SummaryMetric};
use core_types::schema::{METRIC_EMPLOYEES, METRIC_REVENUE};
use core_types::{FactTable, FlaggedTable};
use std::collections::HashSet;

/// Year bounds this project accepts as plausible collection targets.
const YEAR_MIN: f64 = 2000.0;
const YEAR_MAX: f64 = 2026.0;

/// The row-count and column-count lines every stage report starts with.
pub fn stage_overview(rows: usize, columns: &[String]) -> Vec<CheckResult> {
    vec![
        CheckResult::new("rows_processed", true, format!("rows={rows}")),
        CheckResult::new("columns_produced", true, format!("columns={}", columns.len())),
    ]
}

/// Structural checks over the freshly built fact table: identifier coverage,
/// key uniqueness, year plausibility, and KPI-critical metric coverage.
pub fn fact_table_checks(facts: &FactTable) -> Vec<CheckResult> {
    let mut checks = Vec::new();
    let rows = facts.rows.len();

    checks.push(CheckResult::new(
        "rows_gt_0",
        rows > 0,
        format!("rows={rows}"),
    ));

    // Required identifier fields
    let identifier_columns: [(&str, fn(&core_types::FactRow) -> &str); 3] = [
        ("company_id", |row| row.company_id.as_str()),
        ("company_name", |row| row.company_name.as_str()),
        ("year", |row| row.year.as_str()),
    ];
    for (name, accessor) in identifier_columns {
        let missing = facts
            .rows
            .iter()
            .filter(|row| accessor(row).trim().is_empty())
            .count();
        checks.push(CheckResult::new(
            format!("missing_{name}"),
            missing == 0,
            format!("missing={missing}"),
        ));
    }

    // Uniqueness on (company_id, year)
    let mut seen = HashSet::new();
    let duplicates = facts
        .rows
        .iter()
        .filter(|row| !seen.insert((row.company_id.clone(), row.year.clone())))
        .count();
    checks.push(CheckResult::new(
        "unique_company_year",
        duplicates == 0,
        format!("duplicates={duplicates}"),
    ));

    // Year validity check
    let invalid_years = facts
        .rows
        .iter()
        .filter(|row| {
            !matches!(row.year.parse::<f64>(), Ok(year) if (YEAR_MIN..=YEAR_MAX).contains(&year))
        })
        .count();
    checks.push(CheckResult::new(
        "year_valid_range_2000_2026",
        invalid_years == 0,
        format!("invalid_years={invalid_years}"),
    ));

    // KPI-critical metrics: not all must exist this early, but we measure coverage.
    for metric in [METRIC_REVENUE, METRIC_EMPLOYEES] {
        if !facts.metric_names.iter().any(|name| name == metric) {
            checks.push(CheckResult::new(
                format!("column_exists_{metric}"),
                false,
                "missing_column",
            ));
            continue;
        }

        let missing = facts
            .rows
            .iter()
            .filter(|row| row.metric(metric).is_none())
            .count();
        let negative = facts
            .rows
            .iter()
            .filter(|row| row.metric(metric).is_some_and(|value| value < 0.0))
            .count();

        checks.push(CheckResult::new(
            format!("coverage_{metric}"),
            missing < rows,
            format!("missing={missing} of {rows}"),
        ));
        checks.push(CheckResult::new(
            format!("no_negative_{metric}"),
            negative == 0,
            format!("negative={negative}"),
        ));
    }

    checks
}

/// The readiness summary the flagger stage publishes alongside its snapshot.
pub fn readiness_summary(flagged: &FlaggedTable) -> Vec<SummaryMetric> {
    let rows = flagged.rows.len();
    let missing_revenue = flagged
        .rows
        .iter()
        .filter(|row| row.flags.missing_revenue)
        .count();
    let missing_employees = flagged
        .rows
        .iter()
        .filter(|row| row.flags.missing_employees)
        .count();
    let yoy_available = flagged
        .rows
        .iter()
        .filter(|row| row.kpi.revenue_yoy_growth.is_some())
        .count();
    let avg_score = if rows == 0 {
        0.0
    } else {
        flagged
            .rows
            .iter()
            .map(|row| row.data_readiness_score as f64)
            .sum::<f64>()
            / rows as f64
    };

    vec![
        SummaryMetric::new("rows", rows),
        SummaryMetric::new("missing_revenue_rows", missing_revenue),
        SummaryMetric::new("missing_employees_rows", missing_employees),
        SummaryMetric::new("yoy_available_rows", yoy_available),
        SummaryMetric::new("avg_readiness_score", avg_score),
    ]
}

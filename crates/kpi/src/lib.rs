//! KPI Calculator: derives `revenue_per_employee` and `revenue_yoy_growth`
//! from the retailer-year fact table.

use crate::error::KpiError;
use core_types::schema::{METRIC_EMPLOYEES, METRIC_REVENUE};
use core_types::{FactRow, FactTable, KpiRow, KpiTable};
use std::cmp::Ordering;
use tracing::debug;

pub mod error;

/// Derives the per-row and per-company KPIs.
///
/// Rows are sorted by `(company_id, year)` first; the growth computation
/// depends on that ordering, it is not cosmetic. Growth compares each row
/// against the previous available year of the same company, so a company
/// reporting {2019, 2022} computes 2022 growth directly against 2019.
pub fn compute_kpis(facts: &FactTable) -> Result<KpiTable, KpiError> {
    let missing: Vec<String> = [METRIC_REVENUE, METRIC_EMPLOYEES]
        .iter()
        .filter(|name| !facts.metric_names.iter().any(|metric| metric == *name))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(KpiError::MissingColumns(missing));
    }

    let mut sorted: Vec<FactRow> = facts.rows.clone();
    sorted.sort_by(compare_company_year);

    let mut rows = Vec::with_capacity(sorted.len());
    let mut previous: Option<(String, Option<f64>)> = None;

    for fact in sorted {
        let revenue = fact.metric(METRIC_REVENUE);
        let employees = fact.metric(METRIC_EMPLOYEES);

        let revenue_per_employee = ratio(revenue, employees);
        let revenue_yoy_growth = match &previous {
            Some((company_id, Some(prior))) if *company_id == fact.company_id && *prior != 0.0 => {
                revenue.map(|current| current / prior - 1.0)
            }
            _ => None,
        };

        previous = Some((fact.company_id.clone(), revenue));
        rows.push(KpiRow {
            fact,
            revenue_per_employee,
            revenue_yoy_growth,
        });
    }

    debug!(rows = rows.len(), "derived revenue KPIs");

    Ok(KpiTable {
        metric_names: facts.metric_names.clone(),
        rows,
    })
}

/// `revenue / employees` with explicit absence semantics: absent when either
/// operand is absent; a signed infinity when only the denominator is zero
/// (distinguishable from any real ratio); absent for `0 / 0`.
fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(numerator), Some(denominator)) => {
            let value = numerator / denominator;
            if value.is_nan() { None } else { Some(value) }
        }
        _ => None,
    }
}

/// Orders by company, then numeric year; rows with an unparseable year sort
/// after their company's parseable ones.
fn compare_company_year(a: &FactRow, b: &FactRow) -> Ordering {
    a.company_id.cmp(&b.company_id).then_with(|| {
        match (parse_year(&a.year), parse_year(&b.year)) {
            (Some(left), Some(right)) => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    })
}

fn parse_year(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|year| !year.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn fact_table(rows: Vec<(&str, &str, Option<f64>, Option<f64>)>) -> FactTable {
        let rows = rows
            .into_iter()
            .map(|(company_id, year, revenue, employees)| {
                let mut metrics = BTreeMap::new();
                metrics.insert(METRIC_EMPLOYEES.to_string(), employees);
                metrics.insert(METRIC_REVENUE.to_string(), revenue);
                FactRow {
                    company_id: company_id.to_string(),
                    company_name: format!("{company_id} Retail"),
                    year: year.to_string(),
                    metrics,
                    last_updated: None,
                    created_at: "2024-06-01".to_string(),
                    updated_at: "2024-06-01".to_string(),
                }
            })
            .collect();
        FactTable {
            metric_names: vec![METRIC_EMPLOYEES.to_string(), METRIC_REVENUE.to_string()],
            rows,
        }
    }

    #[test]
    fn missing_metric_columns_abort_with_every_name() {
        let facts = FactTable {
            metric_names: vec!["store_count".to_string()],
            rows: Vec::new(),
        };
        let err = compute_kpis(&facts).unwrap_err();
        let KpiError::MissingColumns(columns) = err;
        assert_eq!(columns, vec!["revenue", "employees"]);
    }

    #[test]
    fn revenue_per_employee_is_a_plain_ratio() {
        let kpis = compute_kpis(&fact_table(vec![(
            "AMZ",
            "2020",
            Some(500.0),
            Some(10.0),
        )]))
        .unwrap();
        assert_eq!(kpis.rows[0].revenue_per_employee, Some(50.0));
    }

    #[test]
    fn rpe_is_absent_when_employees_is_absent() {
        let kpis =
            compute_kpis(&fact_table(vec![("AMZ", "2020", Some(500.0), None)])).unwrap();
        assert_eq!(kpis.rows[0].revenue_per_employee, None);
    }

    #[test]
    fn zero_employees_yields_the_infinity_sentinel() {
        let kpis = compute_kpis(&fact_table(vec![
            ("AMZ", "2020", Some(500.0), Some(0.0)),
            ("TGT", "2020", Some(0.0), Some(0.0)),
        ]))
        .unwrap();
        assert_eq!(kpis.rows[0].revenue_per_employee, Some(f64::INFINITY));
        // 0 / 0 carries no information.
        assert_eq!(kpis.rows[1].revenue_per_employee, None);
    }

    #[test]
    fn growth_follows_the_previous_available_year() {
        let kpis = compute_kpis(&fact_table(vec![
            ("AMZ", "2020", Some(100.0), Some(1.0)),
            ("AMZ", "2021", Some(150.0), Some(1.0)),
            ("AMZ", "2023", Some(300.0), Some(1.0)),
        ]))
        .unwrap();
        assert_eq!(kpis.rows[0].revenue_yoy_growth, None);
        assert_eq!(kpis.rows[1].revenue_yoy_growth, Some(0.5));
        // 2023 compares against 2021, not a missing 2022.
        assert_eq!(kpis.rows[2].revenue_yoy_growth, Some(1.0));
    }

    #[test]
    fn growth_never_crosses_companies() {
        let kpis = compute_kpis(&fact_table(vec![
            ("AMZ", "2020", Some(100.0), Some(1.0)),
            ("TGT", "2021", Some(200.0), Some(1.0)),
        ]))
        .unwrap();
        assert_eq!(kpis.rows[1].revenue_yoy_growth, None);
    }

    #[test]
    fn growth_requires_both_revenues_present_and_prior_nonzero() {
        let kpis = compute_kpis(&fact_table(vec![
            ("AMZ", "2019", None, Some(1.0)),
            ("AMZ", "2020", Some(100.0), Some(1.0)),
            ("AMZ", "2021", Some(0.0), Some(1.0)),
            ("AMZ", "2022", Some(50.0), Some(1.0)),
        ]))
        .unwrap();
        // 2020: prior revenue absent. 2021: fine. 2022: prior revenue zero.
        assert_eq!(kpis.rows[1].revenue_yoy_growth, None);
        assert_eq!(kpis.rows[2].revenue_yoy_growth, Some(-1.0));
        assert_eq!(kpis.rows[3].revenue_yoy_growth, None);
    }

    #[test]
    fn unsorted_input_is_sorted_before_growth() {
        let kpis = compute_kpis(&fact_table(vec![
            ("AMZ", "2021", Some(150.0), Some(1.0)),
            ("AMZ", "2020", Some(100.0), Some(1.0)),
        ]))
        .unwrap();
        assert_eq!(kpis.rows[0].fact.year, "2020");
        assert_eq!(kpis.rows[1].revenue_yoy_growth, Some(0.5));
    }

    #[test]
    fn unparseable_years_sort_after_parseable_ones() {
        let kpis = compute_kpis(&fact_table(vec![
            ("AMZ", "unknown", Some(300.0), Some(1.0)),
            ("AMZ", "2020", Some(100.0), Some(1.0)),
            ("AMZ", "2021", Some(150.0), Some(1.0)),
        ]))
        .unwrap();
        assert_eq!(kpis.rows[2].fact.year, "unknown");
        assert_eq!(kpis.rows[1].revenue_yoy_growth, Some(0.5));
        // The malformed-year row still trails its company and compares
        // against the last parseable year.
        assert_eq!(kpis.rows[2].revenue_yoy_growth, Some(1.0));
    }
}

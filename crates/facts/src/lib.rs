//! Fact Table Builder: pivots sparse long-format observations into one wide
//! row per retailer-year with deterministic conflict resolution.

use chrono::NaiveDate;
use core_types::{FactRow, FactTable, Observation};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Per-key accumulator while folding observations into the pivot.
struct KeyGroup {
    metrics: BTreeMap<String, Option<f64>>,
    last_updated: Option<String>,
}

/// Builds the wide retailer-year fact table from the full observation set.
///
/// Grouping key is the normalized `(company_id, company_name, year)` tuple.
/// When duplicate observations exist for the same key and metric, the
/// numerically largest non-absent value wins; all-absent stays absent. The
/// tie-break is max, never "latest wins" or a mean.
///
/// `run_date` stamps `created_at`/`updated_at`.
pub fn build_fact_table(observations: &[Observation], run_date: NaiveDate) -> FactTable {
    let mut metric_names: BTreeSet<String> = BTreeSet::new();
    let mut groups: BTreeMap<(String, String, String), KeyGroup> = BTreeMap::new();

    for observation in observations {
        let company_id = normalize_text(observation.company_id.as_deref()).to_uppercase();
        let company_name = normalize_text(observation.company_name.as_deref());
        let year = normalize_text(observation.year.as_deref());
        let metric_name = normalize_text(observation.metric_name.as_deref()).to_lowercase();
        let value = parse_metric_value(observation.metric_value.as_deref());

        let group = groups
            .entry((company_id, company_name, year))
            .or_insert_with(|| KeyGroup {
                metrics: BTreeMap::new(),
                last_updated: None,
            });

        if !metric_name.is_empty() {
            metric_names.insert(metric_name.clone());
            let slot = group.metrics.entry(metric_name).or_insert(None);
            *slot = resolve_conflict(*slot, value);
        }

        // Latest observation timestamp per key: lexicographic max works
        // because the stamps are ISO `YYYY-MM-DD` strings.
        if let Some(stamp) = observation.last_updated.as_deref() {
            if !stamp.is_empty()
                && group
                    .last_updated
                    .as_deref()
                    .is_none_or(|current| stamp > current)
            {
                group.last_updated = Some(stamp.to_string());
            }
        }
    }

    let metric_names: Vec<String> = metric_names.into_iter().collect();
    let stamp = run_date.format("%Y-%m-%d").to_string();

    let mut rows: Vec<FactRow> = groups
        .into_iter()
        .map(|((company_id, company_name, year), group)| {
            // Every row carries every metric column, absent where unobserved.
            let mut metrics = group.metrics;
            for name in &metric_names {
                metrics.entry(name.clone()).or_insert(None);
            }
            FactRow {
                company_id,
                company_name,
                year,
                metrics,
                last_updated: group.last_updated,
                created_at: stamp.clone(),
                updated_at: stamp.clone(),
            }
        })
        .collect();

    // Stable sort on (company_id, year); the grouping map already ordered
    // equal keys by company_name.
    rows.sort_by(|a, b| {
        a.company_id
            .cmp(&b.company_id)
            .then_with(|| a.year.cmp(&b.year))
    });

    debug!(
        rows = rows.len(),
        metrics = metric_names.len(),
        "pivoted observations into retailer-year facts"
    );

    FactTable { metric_names, rows }
}

/// Max-wins merge of two possibly-absent values.
fn resolve_conflict(current: Option<f64>, incoming: Option<f64>) -> Option<f64> {
    match (current, incoming) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (Some(a), None) => Some(a),
        (None, incoming) => incoming,
    }
}

/// Trims the ends and collapses internal whitespace runs to single spaces.
fn normalize_text(raw: Option<&str>) -> String {
    raw.unwrap_or("")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strips thousands separators and parses; anything unparseable is absent
/// rather than an error.
fn parse_metric_value(raw: Option<&str>) -> Option<f64> {
    let cleaned = raw.unwrap_or("").replace(',', "");
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| !value.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn observation(
        company_id: &str,
        year: &str,
        metric_name: &str,
        metric_value: &str,
        last_updated: &str,
    ) -> Observation {
        Observation {
            company_id: Some(company_id.to_string()),
            company_name: Some("Acme Retail".to_string()),
            year: Some(year.to_string()),
            metric_name: Some(metric_name.to_string()),
            metric_value: Some(metric_value.to_string()),
            currency: Some("USD".to_string()),
            notes: None,
            source_url: None,
            source_type: Some("annual_report".to_string()),
            last_updated: Some(last_updated.to_string()),
        }
    }

    #[test]
    fn one_row_per_distinct_company_year() {
        let observations = vec![
            observation("acme", "2020", "revenue", "100", "2024-01-01"),
            observation("acme", "2020", "employees", "10", "2024-01-02"),
            observation("acme", "2021", "revenue", "150", "2024-01-03"),
        ];
        let facts = build_fact_table(&observations, run_date());
        assert_eq!(facts.rows.len(), 2);
        assert_eq!(facts.rows[0].company_id, "ACME");
        assert_eq!(facts.rows[0].year, "2020");
        assert_eq!(facts.rows[1].year, "2021");
    }

    #[test]
    fn duplicate_metric_resolves_to_max() {
        let observations = vec![
            observation("acme", "2020", "revenue", "10", "2024-01-01"),
            observation("acme", "2020", "revenue", "25", "2024-01-01"),
        ];
        let facts = build_fact_table(&observations, run_date());
        assert_eq!(facts.rows[0].metric("revenue"), Some(25.0));
    }

    #[test]
    fn all_absent_duplicates_stay_absent() {
        let observations = vec![
            observation("acme", "2020", "revenue", "n/a", "2024-01-01"),
            observation("acme", "2020", "revenue", "", "2024-01-01"),
        ];
        let facts = build_fact_table(&observations, run_date());
        assert_eq!(facts.rows[0].metric("revenue"), None);
    }

    #[test]
    fn unparseable_value_does_not_beat_a_real_one() {
        let observations = vec![
            observation("acme", "2020", "revenue", "pending", "2024-01-01"),
            observation("acme", "2020", "revenue", "42", "2024-01-01"),
        ];
        let facts = build_fact_table(&observations, run_date());
        assert_eq!(facts.rows[0].metric("revenue"), Some(42.0));
    }

    #[test]
    fn thousands_separators_are_stripped() {
        let observations = vec![observation(
            "acme",
            "2020",
            "revenue",
            "1,250,000",
            "2024-01-01",
        )];
        let facts = build_fact_table(&observations, run_date());
        assert_eq!(facts.rows[0].metric("revenue"), Some(1_250_000.0));
    }

    #[test]
    fn text_fields_are_normalized() {
        let mut first = observation("  acme ", "2020", "  Revenue ", "5", "2024-01-01");
        first.company_name = Some("  Acme   Retail ".to_string());
        let facts = build_fact_table(&[first], run_date());
        assert_eq!(facts.rows[0].company_id, "ACME");
        assert_eq!(facts.rows[0].company_name, "Acme Retail");
        assert_eq!(facts.metric_names, vec!["revenue"]);
        assert_eq!(facts.rows[0].metric("revenue"), Some(5.0));
    }

    #[test]
    fn last_updated_is_the_latest_stamp_for_the_key() {
        let observations = vec![
            observation("acme", "2020", "revenue", "100", "2024-03-05"),
            observation("acme", "2020", "employees", "10", "2024-01-20"),
        ];
        let facts = build_fact_table(&observations, run_date());
        assert_eq!(facts.rows[0].last_updated.as_deref(), Some("2024-03-05"));
    }

    #[test]
    fn every_row_carries_every_metric_column() {
        let observations = vec![
            observation("acme", "2020", "revenue", "100", "2024-01-01"),
            observation("zeta", "2020", "employees", "10", "2024-01-01"),
        ];
        let facts = build_fact_table(&observations, run_date());
        assert_eq!(facts.metric_names, vec!["employees", "revenue"]);
        for row in &facts.rows {
            assert_eq!(row.metrics.len(), 2);
        }
        assert_eq!(facts.rows[0].metric("employees"), None);
        assert_eq!(facts.rows[1].metric("revenue"), None);
    }

    #[test]
    fn rows_are_sorted_by_company_then_year() {
        let observations = vec![
            observation("zeta", "2020", "revenue", "1", "2024-01-01"),
            observation("acme", "2021", "revenue", "2", "2024-01-01"),
            observation("acme", "2019", "revenue", "3", "2024-01-01"),
        ];
        let facts = build_fact_table(&observations, run_date());
        let keys: Vec<(&str, &str)> = facts
            .rows
            .iter()
            .map(|row| (row.company_id.as_str(), row.year.as_str()))
            .collect();
        assert_eq!(keys, vec![("ACME", "2019"), ("ACME", "2021"), ("ZETA", "2020")]);
    }

    #[test]
    fn run_date_stamps_both_pipeline_timestamps() {
        let observations = vec![observation("acme", "2020", "revenue", "1", "2024-01-01")];
        let facts = build_fact_table(&observations, run_date());
        assert_eq!(facts.rows[0].created_at, "2024-06-01");
        assert_eq!(facts.rows[0].updated_at, "2024-06-01");
    }
}

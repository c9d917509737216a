use crate::error::StoreError;
use core_types::schema::{
    COL_COMPANY_ID, COL_COMPANY_NAME, COL_CREATED_AT, COL_DATA_READINESS_SCORE,
    COL_FLAG_MISSING_EMPLOYEES, COL_FLAG_MISSING_REVENUE, COL_FLAG_NEGATIVE_EMPLOYEES,
    COL_FLAG_NEGATIVE_REVENUE, COL_FLAG_RPE_EXTREME, COL_FLAG_YOY_EXTREME, COL_LAST_UPDATED,
    COL_REVENUE_PER_EMPLOYEE, COL_REVENUE_YOY_GROWTH, COL_UPDATED_AT, COL_YEAR,
    OBSERVATION_COLUMNS,
};
use core_types::{
    FactRow, FactTable, FinalTable, FlaggedRow, FlaggedTable, KpiRow, KpiTable, Observation,
    QualityFlags,
};
use reporting::{CheckResult, SummaryMetric};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The non-metric columns of a fact table snapshot.
const FACT_FIXED_COLUMNS: [&str; 6] = [
    COL_COMPANY_ID,
    COL_COMPANY_NAME,
    COL_YEAR,
    COL_LAST_UPDATED,
    COL_CREATED_AT,
    COL_UPDATED_AT,
];

/// The derived columns the KPI stage appends to a fact table.
const KPI_COLUMNS: [&str; 2] = [COL_REVENUE_PER_EMPLOYEE, COL_REVENUE_YOY_GROWTH];

/// The columns the flagger stage appends to a KPI table.
const FLAG_COLUMNS: [&str; 7] = [
    COL_FLAG_MISSING_REVENUE,
    COL_FLAG_MISSING_EMPLOYEES,
    COL_FLAG_NEGATIVE_REVENUE,
    COL_FLAG_NEGATIVE_EMPLOYEES,
    COL_FLAG_RPE_EXTREME,
    COL_FLAG_YOY_EXTREME,
    COL_DATA_READINESS_SCORE,
];

// ==============================================================================
// Readers
// ==============================================================================

/// Loads the raw long-format observation file.
///
/// The full required column set is validated before any row is read; every
/// missing name is reported in one error. Extra columns are ignored.
pub fn read_observations(path: &Path) -> Result<Vec<Observation>, StoreError> {
    let mut reader = open_reader(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    ensure_columns(path, &headers, &OBSERVATION_COLUMNS)?;

    let mut observations = Vec::new();
    for result in reader.deserialize() {
        let observation: Observation = result?;
        observations.push(observation);
    }
    Ok(observations)
}

/// Loads a fact table snapshot. Metric columns are whatever headers remain
/// after the fixed key and metadata columns.
pub fn read_fact_table(path: &Path) -> Result<FactTable, StoreError> {
    let mut reader = open_reader(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    ensure_columns(path, &headers, &FACT_FIXED_COLUMNS)?;

    let metric_names: Vec<String> = headers
        .iter()
        .filter(|header| !FACT_FIXED_COLUMNS.contains(&header.as_str()))
        .cloned()
        .collect();
    let index = header_index(&headers);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(fact_row_from_record(&record, &metric_names, &index));
    }
    Ok(FactTable { metric_names, rows })
}

/// Loads a KPI table snapshot (a fact table plus the two derived columns).
pub fn read_kpi_table(path: &Path) -> Result<KpiTable, StoreError> {
    let mut reader = open_reader(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut required: Vec<&str> = FACT_FIXED_COLUMNS.to_vec();
    required.extend(KPI_COLUMNS);
    ensure_columns(path, &headers, &required)?;

    let metric_names: Vec<String> = headers
        .iter()
        .filter(|header| !required.contains(&header.as_str()))
        .cloned()
        .collect();
    let index = header_index(&headers);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(kpi_row_from_record(&record, &metric_names, &index));
    }
    Ok(KpiTable { metric_names, rows })
}

/// Loads a flagged KPI table snapshot (KPI columns plus flags and score).
pub fn read_flagged_table(path: &Path) -> Result<FlaggedTable, StoreError> {
    let mut reader = open_reader(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut required: Vec<&str> = FACT_FIXED_COLUMNS.to_vec();
    required.extend(KPI_COLUMNS);
    required.extend(FLAG_COLUMNS);
    ensure_columns(path, &headers, &required)?;

    let metric_names: Vec<String> = headers
        .iter()
        .filter(|header| !required.contains(&header.as_str()))
        .cloned()
        .collect();
    let index = header_index(&headers);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let kpi = kpi_row_from_record(&record, &metric_names, &index);
        let cell = |name: &str| record.get(index[name]).unwrap_or("");
        let flags = QualityFlags {
            missing_revenue: parse_bool_cell(cell(COL_FLAG_MISSING_REVENUE)),
            missing_employees: parse_bool_cell(cell(COL_FLAG_MISSING_EMPLOYEES)),
            negative_revenue: parse_bool_cell(cell(COL_FLAG_NEGATIVE_REVENUE)),
            negative_employees: parse_bool_cell(cell(COL_FLAG_NEGATIVE_EMPLOYEES)),
            rpe_extreme: parse_bool_cell(cell(COL_FLAG_RPE_EXTREME)),
            yoy_extreme: parse_bool_cell(cell(COL_FLAG_YOY_EXTREME)),
        };
        let data_readiness_score = parse_numeric_cell(cell(COL_DATA_READINESS_SCORE))
            .map(|value| value as i64)
            .unwrap_or(0);
        rows.push(FlaggedRow {
            kpi,
            flags,
            data_readiness_score,
        });
    }
    Ok(FlaggedTable { metric_names, rows })
}

// ==============================================================================
// Writers
// ==============================================================================

pub fn write_fact_table(path: &Path, facts: &FactTable) -> Result<(), StoreError> {
    let mut buffer = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        writer.write_record(&facts.column_names())?;
        for row in &facts.rows {
            writer.write_record(&fact_cells(row, &facts.metric_names))?;
        }
        writer.flush()?;
    }
    replace_file(path, &buffer)
}

pub fn write_kpi_table(path: &Path, kpis: &KpiTable) -> Result<(), StoreError> {
    let mut buffer = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        writer.write_record(&kpis.column_names())?;
        for row in &kpis.rows {
            writer.write_record(&kpi_cells(row, &kpis.metric_names))?;
        }
        writer.flush()?;
    }
    replace_file(path, &buffer)
}

pub fn write_flagged_table(path: &Path, flagged: &FlaggedTable) -> Result<(), StoreError> {
    let mut buffer = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        writer.write_record(&flagged.column_names())?;
        for row in &flagged.rows {
            writer.write_record(&flagged_cells(row, &flagged.metric_names))?;
        }
        writer.flush()?;
    }
    replace_file(path, &buffer)
}

pub fn write_final_table(path: &Path, table: &FinalTable) -> Result<(), StoreError> {
    let mut buffer = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        writer.write_record(&table.column_names())?;
        for row in &table.rows {
            let mut cells = flagged_cells(&row.flagged, &table.metric_names);
            cells.push(format_numeric_cell(row.confidence_weighted_rpe));
            writer.write_record(&cells)?;
        }
        writer.flush()?;
    }
    replace_file(path, &buffer)
}

/// Writes a `check,result,details` run report.
pub fn write_check_report(path: &Path, checks: &[CheckResult]) -> Result<(), StoreError> {
    let mut buffer = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        for check in checks {
            writer.serialize(check)?;
        }
        writer.flush()?;
    }
    replace_file(path, &buffer)
}

/// Writes a `metric,value` summary report.
pub fn write_summary_report(path: &Path, metrics: &[SummaryMetric]) -> Result<(), StoreError> {
    let mut buffer = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        for metric in metrics {
            writer.serialize(metric)?;
        }
        writer.flush()?;
    }
    replace_file(path, &buffer)
}

// ==============================================================================
// Helpers
// ==============================================================================

fn open_reader(path: &Path) -> Result<csv::Reader<File>, StoreError> {
    if !path.exists() {
        return Err(StoreError::MissingInput(path.to_path_buf()));
    }
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?)
}

/// Fails with the complete list of absent required columns, not just the
/// first one found.
fn ensure_columns(path: &Path, headers: &[String], required: &[&str]) -> Result<(), StoreError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !headers.iter().any(|header| header == *name))
        .map(|name| name.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(StoreError::MissingColumns {
            path: path.to_path_buf(),
            columns: missing,
        })
    }
}

fn header_index(headers: &[String]) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(position, header)| (header.clone(), position))
        .collect()
}

fn fact_row_from_record(
    record: &csv::StringRecord,
    metric_names: &[String],
    index: &HashMap<String, usize>,
) -> FactRow {
    let cell = |name: &str| record.get(index[name]).unwrap_or("").to_string();
    let mut metrics = BTreeMap::new();
    for name in metric_names {
        metrics.insert(
            name.clone(),
            parse_numeric_cell(record.get(index[name]).unwrap_or("")),
        );
    }
    FactRow {
        company_id: cell(COL_COMPANY_ID),
        company_name: cell(COL_COMPANY_NAME),
        year: cell(COL_YEAR),
        metrics,
        last_updated: optional_cell(record.get(index[COL_LAST_UPDATED]).unwrap_or("")),
        created_at: cell(COL_CREATED_AT),
        updated_at: cell(COL_UPDATED_AT),
    }
}

fn kpi_row_from_record(
    record: &csv::StringRecord,
    metric_names: &[String],
    index: &HashMap<String, usize>,
) -> KpiRow {
    let fact = fact_row_from_record(record, metric_names, index);
    KpiRow {
        fact,
        revenue_per_employee: parse_numeric_cell(
            record.get(index[COL_REVENUE_PER_EMPLOYEE]).unwrap_or(""),
        ),
        revenue_yoy_growth: parse_numeric_cell(
            record.get(index[COL_REVENUE_YOY_GROWTH]).unwrap_or(""),
        ),
    }
}

fn fact_cells(row: &FactRow, metric_names: &[String]) -> Vec<String> {
    let mut cells = vec![
        row.company_id.clone(),
        row.company_name.clone(),
        row.year.clone(),
    ];
    for name in metric_names {
        cells.push(format_numeric_cell(row.metric(name)));
    }
    cells.push(row.last_updated.clone().unwrap_or_default());
    cells.push(row.created_at.clone());
    cells.push(row.updated_at.clone());
    cells
}

fn kpi_cells(row: &KpiRow, metric_names: &[String]) -> Vec<String> {
    let mut cells = fact_cells(&row.fact, metric_names);
    cells.push(format_numeric_cell(row.revenue_per_employee));
    cells.push(format_numeric_cell(row.revenue_yoy_growth));
    cells
}

fn flagged_cells(row: &FlaggedRow, metric_names: &[String]) -> Vec<String> {
    let mut cells = kpi_cells(&row.kpi, metric_names);
    cells.push(row.flags.missing_revenue.to_string());
    cells.push(row.flags.missing_employees.to_string());
    cells.push(row.flags.negative_revenue.to_string());
    cells.push(row.flags.negative_employees.to_string());
    cells.push(row.flags.rpe_extreme.to_string());
    cells.push(row.flags.yoy_extreme.to_string());
    cells.push(row.data_readiness_score.to_string());
    cells
}

/// Empty cells are absent; `inf`/`-inf` parse to the division-by-zero
/// sentinels; anything unparseable is absent rather than an error.
fn parse_numeric_cell(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| !value.is_nan())
}

fn format_numeric_cell(value: Option<f64>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => String::new(),
    }
}

fn optional_cell(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

fn parse_bool_cell(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

/// Writes the whole file to a sibling temp path, then renames it over the
/// destination, so readers only ever observe complete snapshots.
fn replace_file(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file_name = path
        .file_name()
        .ok_or_else(|| StoreError::InvalidOutputPath(path.to_path_buf()))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp_path: PathBuf = path.with_file_name(tmp_name);
    fs::write(&tmp_path, bytes)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use configuration::{PipelineSettings, load_config};
use quality::QualityEngine;
use reporting::{CheckResult, SummaryMetric};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// The main entry point for the Shopsight KPI pipeline.
fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Parse command-line arguments
    let cli = Cli::parse();

    let settings =
        load_config(cli.config.as_deref()).context("Failed to load pipeline configuration")?;
    let as_of = cli.as_of.unwrap_or_else(|| Utc::now().date_naive());

    // Execute the appropriate command
    match cli.command {
        Commands::BuildFacts => handle_build_facts(&settings, as_of)?,
        Commands::ComputeKpis => handle_compute_kpis(&settings)?,
        Commands::FlagAnomalies => handle_flag_anomalies(&settings)?,
        Commands::ApplyWeighting => handle_apply_weighting(&settings)?,
        Commands::Run => {
            handle_build_facts(&settings, as_of)?;
            handle_compute_kpis(&settings)?;
            handle_flag_anomalies(&settings)?;
            handle_apply_weighting(&settings)?;
        }
    }

    Ok(())
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Batch pipeline turning manual retail observations into scored,
/// confidence-weighted retailer-year KPIs.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to an alternate configuration file (default: config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run date stamped into created_at/updated_at (format: YYYY-MM-DD,
    /// default: today UTC).
    #[arg(long)]
    as_of: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pivot the raw observation file into the retailer-year fact table.
    BuildFacts,
    /// Derive revenue-per-employee and year-over-year growth from the facts.
    ComputeKpis,
    /// Flag anomalies and score each KPI row's data readiness.
    FlagAnomalies,
    /// Weight revenue-per-employee by its readiness score.
    ApplyWeighting,
    /// Execute the four stages in order.
    Run,
}

// ==============================================================================
// Stage Handlers
// ==============================================================================

const FACTS_REPORT: &str = "quality_report_retailer_year_facts.csv";
const KPI_REPORT: &str = "quality_report_retailer_year_kpis.csv";
const READINESS_REPORT: &str = "quality_report_readiness.csv";
const FINAL_REPORT: &str = "quality_report_retailer_year_kpis_final.csv";

/// The handler for the `build-facts` command.
fn handle_build_facts(settings: &PipelineSettings, as_of: NaiveDate) -> Result<()> {
    println!("--- Building retailer-year fact table ---");

    // 1. Load raw observations
    let observations = store::read_observations(&settings.paths.observations)
        .context("Failed to read the observation file")?;
    println!("Loaded {} observations.", observations.len());

    // 2. Pivot into the wide fact table
    let facts = facts::build_fact_table(&observations, as_of);

    // 3. Structural checks for the companion report
    let mut checks = reporting::stage_overview(facts.rows.len(), &facts.column_names());
    checks.extend(reporting::fact_table_checks(&facts));

    // 4. Persist snapshot and report
    store::write_fact_table(&settings.paths.facts, &facts)
        .context("Failed to write the fact table")?;
    store::write_check_report(&report_path(settings, FACTS_REPORT), &checks)
        .context("Failed to write the facts run report")?;

    print_check_table(&checks);
    println!("[OK] Wrote facts table: {}", settings.paths.facts.display());
    println!(
        "[INFO] Rows: {} | Columns: {:?}",
        facts.rows.len(),
        facts.column_names()
    );
    Ok(())
}

/// The handler for the `compute-kpis` command.
fn handle_compute_kpis(settings: &PipelineSettings) -> Result<()> {
    println!("--- Computing revenue KPIs ---");

    let facts =
        store::read_fact_table(&settings.paths.facts).context("Failed to read the fact table")?;
    let kpis = kpi::compute_kpis(&facts).context("Failed to derive KPIs")?;

    let checks = reporting::stage_overview(kpis.rows.len(), &kpis.column_names());
    store::write_kpi_table(&settings.paths.kpis, &kpis)
        .context("Failed to write the KPI table")?;
    store::write_check_report(&report_path(settings, KPI_REPORT), &checks)
        .context("Failed to write the KPI run report")?;

    print_check_table(&checks);
    println!("[OK] KPIs written: {}", settings.paths.kpis.display());
    println!(
        "[INFO] Rows: {} | Columns: {:?}",
        kpis.rows.len(),
        kpis.column_names()
    );
    Ok(())
}

/// The handler for the `flag-anomalies` command.
fn handle_flag_anomalies(settings: &PipelineSettings) -> Result<()> {
    println!("--- Flagging anomalies and scoring readiness ---");

    let kpis = store::read_kpi_table(&settings.paths.kpis).context("Failed to read the KPI table")?;
    let engine = QualityEngine::new(settings.quality.clone());
    let flagged = engine.run(&kpis).context("Failed to flag KPI rows")?;

    let summary = reporting::readiness_summary(&flagged);
    store::write_flagged_table(&settings.paths.flagged_kpis, &flagged)
        .context("Failed to write the flagged KPI table")?;
    store::write_summary_report(&report_path(settings, READINESS_REPORT), &summary)
        .context("Failed to write the readiness report")?;

    print_summary_table(&summary);
    println!(
        "[OK] Flagged KPI table: {}",
        settings.paths.flagged_kpis.display()
    );
    println!(
        "[OK] Readiness report:  {}",
        report_path(settings, READINESS_REPORT).display()
    );
    Ok(())
}

/// The handler for the `apply-weighting` command.
fn handle_apply_weighting(settings: &PipelineSettings) -> Result<()> {
    println!("--- Applying confidence weighting ---");

    let flagged = store::read_flagged_table(&settings.paths.flagged_kpis)
        .context("Failed to read the flagged KPI table")?;
    let table = weighting::apply_confidence_weighting(&flagged);

    let checks = reporting::stage_overview(table.rows.len(), &table.column_names());
    store::write_final_table(&settings.paths.final_kpis, &table)
        .context("Failed to write the final KPI table")?;
    store::write_check_report(&report_path(settings, FINAL_REPORT), &checks)
        .context("Failed to write the final run report")?;

    print_check_table(&checks);
    println!(
        "[OK] Final KPI table written: {}",
        settings.paths.final_kpis.display()
    );
    Ok(())
}

// ==============================================================================
// Output Helpers
// ==============================================================================

fn report_path(settings: &PipelineSettings, file_name: &str) -> PathBuf {
    settings.paths.reports.join(file_name)
}

fn print_check_table(checks: &[CheckResult]) {
    let mut table = Table::new();
    table.set_header(vec!["check", "result", "details"]);
    for check in checks {
        table.add_row(vec![
            check.check.clone(),
            check.result.to_string(),
            check.details.clone(),
        ]);
    }
    println!("{table}");
}

fn print_summary_table(metrics: &[SummaryMetric]) {
    let mut table = Table::new();
    table.set_header(vec!["metric", "value"]);
    for metric in metrics {
        table.add_row(vec![metric.metric.clone(), metric.value.clone()]);
    }
    println!("{table}");
}

pub mod checks;
pub mod report;

// Re-export the core types to provide a clean public API.
pub use checks::{fact_table_checks, readiness_summary, stage_overview};
pub use report::{CheckOutcome, CheckResult, SummaryMetric};

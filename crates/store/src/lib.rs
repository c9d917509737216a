//! # Snapshot Store
//!
//! This crate is the pipeline's only interface to the filesystem. Every stage
//! reads one complete CSV snapshot and writes one complete CSV snapshot; the
//! store keeps those transfers honest:
//!
//! - **Structural validation up front.** Readers check the header row before
//!   touching any data and report *every* missing required column in a single
//!   fatal error.
//! - **Atomic replacement.** Writers build the full file in memory, write it
//!   to a temporary file next to the destination, and rename it into place. A
//!   failed run never leaves a partial snapshot behind.
//! - **Explicit absence.** Empty numeric cells round-trip as `None`;
//!   division-by-zero sentinels round-trip as `inf`/`-inf`.

// Declare the modules that constitute this crate.
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use error::StoreError;
pub use repository::{
    read_fact_table, read_flagged_table, read_kpi_table, read_observations, write_check_report,
    write_fact_table, write_final_table, write_flagged_table, write_kpi_table,
    write_summary_report,
};

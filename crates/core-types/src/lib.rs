pub mod records;
pub mod schema;

// Re-export the core types to provide a clean public API.
pub use records::{
    FactRow, FactTable, FinalRow, FinalTable, FlaggedRow, FlaggedTable, KpiRow, KpiTable,
    Observation, QualityFlags,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KpiError {
    #[error("Fact table is missing required metric columns: {0:?}")]
    MissingColumns(Vec<String>),
}
